//! Node registry and frame dispatch
//!
//! The [`Registry`] is the arena of active node descriptors. The application
//! owns it, registers nodes and filters at startup, and then drives
//! [`Registry::poll_once`] from its control loop. Dispatch is cooperative and
//! single-threaded: handlers run to completion on the polling thread before
//! the next frame is processed, so they must stay short. A handler that
//! performs its own blocking exchange (for example [`crate::transfer::request_name`])
//! stalls every other node's message processing for that duration, bounded by
//! the exchange timeout.
//!
//! Received frames land in a single staging slot that is overwritten on every
//! poll: a latest-wins mailbox, not a queue. If the control loop polls too
//! slowly, intervening frames are lost at the hardware layer and are not
//! recoverable here.

use heapless::{String, Vec};

use crate::bus::{Bus, BusError};
use crate::codec::{self, CodecError, Element, Scalar};
use crate::core::{MessageKind, NodeAddress};
use crate::envelope::Envelope;
use crate::frame::{FilterSlot, Frame};
use crate::time::Duration;
use crate::transfer;

/// Maximum length of an owned node name string, in bytes
pub const MAX_NAME_LENGTH: usize = 30;
/// Maximum length of an owned node info string, in bytes
pub const MAX_INFO_LENGTH: usize = 90;

pub(crate) const TRANSMIT_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationError {
    /// The registry already holds its maximum number of nodes
    NoNodeSlotLeft,
    /// The node's filter table is full
    NoFilterSlotLeft,
    /// The hardware adapter rejected the filter registration
    Bus(BusError),
}

impl From<BusError> for RegistrationError {
    fn from(value: BusError) -> Self {
        RegistrationError::Bus(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    Codec(CodecError),
    Bus(BusError),
}

impl From<CodecError> for SendError {
    fn from(value: CodecError) -> Self {
        SendError::Codec(value)
    }
}

impl From<BusError> for SendError {
    fn from(value: BusError) -> Self {
        SendError::Bus(value)
    }
}

/// A name or info string did not fit its bounded storage
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LengthExceeded;

/// Stable index of a registered node
///
/// Handles are arena indices: they stay valid for the life of the registry,
/// since nodes are never destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeHandle {
    index: u8,
}

/// What a hardware acceptance filter should match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterTarget {
    /// Exactly this identifier
    Id(NodeAddress),
    /// Identifiers matching `id` under `mask` (a mask bit of 1 requires the
    /// corresponding identifier bit to match)
    Mask { id: NodeAddress, mask: u16 },
}

/// Reacts to a frame delivered by the dispatch loop
///
/// The handler receives an [`Endpoint`] bound to the owning node so it can
/// answer with typed values. Handlers run on the polling thread; the staged
/// frame is only valid for the duration of the call, so extract everything
/// before returning.
pub trait Handler {
    fn handle(&mut self, endpoint: Endpoint<'_>, frame: &Frame);
}

/// Adapts a plain function into a [`Handler`].
pub struct FnHandler<F>(pub F);

impl<F> Handler for FnHandler<F>
where
    F: FnMut(Endpoint<'_>, &Frame),
{
    fn handle(&mut self, endpoint: Endpoint<'_>, frame: &Frame) {
        (self.0)(endpoint, frame)
    }
}

/// Send-side handle bound to one node's address
///
/// Obtained from [`Registry::endpoint`] or passed into a [`Handler`].
pub struct Endpoint<'a> {
    pub(crate) bus: &'a mut dyn Bus,
    pub(crate) address: NodeAddress,
}

impl<'a> Endpoint<'a> {
    pub fn address(&self) -> NodeAddress {
        self.address
    }

    /// Raw access to the bus adapter, e.g. to run a string request.
    pub fn bus(&mut self) -> &mut (dyn Bus + 'a) {
        self.bus
    }

    /// Sends one typed scalar value from this node.
    pub fn send<T: Scalar>(&mut self, value: T) -> Result<(), BusError> {
        let frame = Frame {
            id: self.address,
            data: codec::encode(value),
            rtr: false,
            slot: None,
        };
        self.bus.transmit(&frame, TRANSMIT_TIMEOUT)
    }

    /// Sends a typed array value from this node.
    pub fn send_array<T: Element>(&mut self, values: &[T]) -> Result<(), SendError> {
        let frame = Frame {
            id: self.address,
            data: codec::encode_array(values)?,
            rtr: false,
            slot: None,
        };
        self.bus.transmit(&frame, TRANSMIT_TIMEOUT)?;
        Ok(())
    }
}

struct FilterEntry<'h> {
    slot: FilterSlot,
    handler: &'h mut dyn Handler,
}

struct Node<'h, const NUM_FILTERS: usize> {
    address: NodeAddress,
    /// Reserved for mode reporting
    #[allow(dead_code)]
    status: u8,
    request_handler: Option<&'h mut dyn Handler>,
    filters: Vec<FilterEntry<'h>, NUM_FILTERS>,
    name: Option<String<MAX_NAME_LENGTH>>,
    info: Option<String<MAX_INFO_LENGTH>>,
}

/// Arena of active node descriptors
///
/// Capacities are const-generic: at most `MAX_NODES` descriptors, each with
/// at most `NUM_FILTERS` filter entries. Nodes live for the rest of the
/// process once registered; there is no teardown.
///
/// `'h` bounds the handler references stored in the arena.
pub struct Registry<'h, const MAX_NODES: usize = 8, const NUM_FILTERS: usize = 8> {
    nodes: Vec<Node<'h, NUM_FILTERS>, MAX_NODES>,
    /// Single-slot mailbox shared by every poll iteration, overwritten on
    /// each receive. Latest wins; there is no backlog.
    staging: Frame,
}

impl<'h, const MAX_NODES: usize, const NUM_FILTERS: usize> Registry<'h, MAX_NODES, NUM_FILTERS> {
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            staging: Frame::empty(),
        }
    }

    /// Creates a node descriptor.
    ///
    /// `request_handler` is invoked for request frames addressed to this node
    /// (except get-name/get-info, which the registry answers itself). Fails
    /// without side effects when the registry is full. Addresses are not
    /// checked for collisions; callers must pick non-colliding ones.
    pub fn register(
        &mut self,
        address: NodeAddress,
        request_handler: Option<&'h mut dyn Handler>,
    ) -> Result<NodeHandle, RegistrationError> {
        if self.nodes.is_full() {
            return Err(RegistrationError::NoNodeSlotLeft);
        }
        let handle = NodeHandle {
            index: self.nodes.len() as u8,
        };
        self.nodes
            .push(Node {
                address,
                status: 0,
                request_handler,
                filters: Vec::new(),
                name: None,
                info: None,
            })
            .ok();
        Ok(handle)
    }

    /// Registers a hardware filter and routes its matches to `handler`.
    ///
    /// The adapter allocates the slot; the pair is stored in the node's
    /// table. A full table or an adapter failure leaves all state unchanged;
    /// the table capacity is checked before the hardware is touched.
    pub fn add_filter(
        &mut self,
        bus: &mut dyn Bus,
        node: NodeHandle,
        target: FilterTarget,
        handler: &'h mut dyn Handler,
    ) -> Result<(), RegistrationError> {
        let node = unwrap!(self.nodes.get_mut(usize::from(node.index)));
        if node.filters.is_full() {
            return Err(RegistrationError::NoFilterSlotLeft);
        }
        let slot = match target {
            FilterTarget::Id(id) => bus.add_filter_id(id)?,
            FilterTarget::Mask { id, mask } => bus.add_filter_mask(id, mask)?,
        };
        // capacity checked above
        node.filters.push(FilterEntry { slot, handler }).ok();
        Ok(())
    }

    /// Sets the node's owned name string, answered to get-name requests.
    pub fn set_name(&mut self, node: NodeHandle, name: &str) -> Result<(), LengthExceeded> {
        let node = unwrap!(self.nodes.get_mut(usize::from(node.index)));
        let mut owned = String::new();
        owned.push_str(name).map_err(|_| LengthExceeded)?;
        node.name = Some(owned);
        Ok(())
    }

    /// Sets the node's owned info string, answered to get-info requests.
    pub fn set_info(&mut self, node: NodeHandle, info: &str) -> Result<(), LengthExceeded> {
        let node = unwrap!(self.nodes.get_mut(usize::from(node.index)));
        let mut owned = String::new();
        owned.push_str(info).map_err(|_| LengthExceeded)?;
        node.info = Some(owned);
        Ok(())
    }

    pub fn address(&self, node: NodeHandle) -> NodeAddress {
        unwrap!(self.nodes.get(usize::from(node.index))).address
    }

    pub fn name(&self, node: NodeHandle) -> Option<&str> {
        unwrap!(self.nodes.get(usize::from(node.index)))
            .name
            .as_deref()
    }

    pub fn info(&self, node: NodeHandle) -> Option<&str> {
        unwrap!(self.nodes.get(usize::from(node.index)))
            .info
            .as_deref()
    }

    /// Send-side handle for a registered node.
    pub fn endpoint<'b>(&self, bus: &'b mut dyn Bus, node: NodeHandle) -> Endpoint<'b> {
        Endpoint {
            bus,
            address: self.address(node),
        }
    }

    /// One dispatch step: receive at most one pending frame and route it to
    /// at most one handler.
    ///
    /// Request frames are routed by node address; get-name and get-info
    /// requests are answered by the registry itself from the node's owned
    /// strings, everything else goes to the node's request handler. Data
    /// frames are routed by the reported filter slot, scanning the nodes in
    /// registration order and firing the first match. A frame matching no
    /// filter and no node address is dropped; absence of work is not an
    /// error.
    pub fn poll_once(&mut self, bus: &mut dyn Bus) {
        if !bus.is_frame_pending() {
            return;
        }
        let frame = match bus.receive(Duration::from_ticks(0)) {
            Ok(frame) => frame,
            Err(_) => return,
        };
        self.staging = frame;

        let Self { nodes, staging } = self;
        if staging.rtr {
            Self::dispatch_request(nodes, bus, staging);
        } else {
            Self::dispatch_data(nodes, bus, staging);
        }
    }

    fn dispatch_request(
        nodes: &mut Vec<Node<'h, NUM_FILTERS>, MAX_NODES>,
        bus: &mut dyn Bus,
        frame: &Frame,
    ) {
        let Some(node) = nodes.iter_mut().find(|node| node.address == frame.id) else {
            return;
        };
        match Envelope::from_frame(frame).and_then(|envelope| envelope.kind()) {
            Some(MessageKind::GetName) => {
                if let Some(name) = node.name.as_deref() {
                    transfer::send_string(bus, node.address, name).ok();
                }
            }
            Some(MessageKind::GetInfo) => {
                if let Some(info) = node.info.as_deref() {
                    transfer::send_string(bus, node.address, info).ok();
                }
            }
            _ => {
                if let Some(handler) = node.request_handler.as_mut() {
                    let endpoint = Endpoint {
                        bus,
                        address: node.address,
                    };
                    handler.handle(endpoint, frame);
                }
            }
        }
    }

    fn dispatch_data(
        nodes: &mut Vec<Node<'h, NUM_FILTERS>, MAX_NODES>,
        bus: &mut dyn Bus,
        frame: &Frame,
    ) {
        let Some(slot) = frame.slot else {
            return;
        };
        for node in nodes.iter_mut() {
            for entry in node.filters.iter_mut() {
                if entry.slot == slot {
                    let endpoint = Endpoint {
                        bus,
                        address: node.address,
                    };
                    entry.handler.handle(endpoint, frame);
                    return;
                }
            }
        }
    }
}

impl<const MAX_NODES: usize, const NUM_FILTERS: usize> Default
    for Registry<'_, MAX_NODES, NUM_FILTERS>
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use emnode_core::Bitrate;

    struct StubBus {
        pending: Option<Frame>,
        slots: u8,
        bank_full: bool,
    }

    impl StubBus {
        fn new() -> Self {
            Self {
                pending: None,
                slots: 0,
                bank_full: false,
            }
        }
    }

    impl Bus for StubBus {
        fn transmit(&mut self, _frame: &Frame, _timeout: Duration) -> Result<(), BusError> {
            Ok(())
        }

        fn receive(&mut self, _timeout: Duration) -> Result<Frame, BusError> {
            self.pending.take().ok_or(BusError::NoData)
        }

        fn is_frame_pending(&mut self) -> bool {
            self.pending.is_some()
        }

        fn add_filter_id(&mut self, _id: NodeAddress) -> Result<FilterSlot, BusError> {
            if self.bank_full {
                return Err(BusError::Data);
            }
            let slot = FilterSlot::new(self.slots);
            self.slots += 1;
            Ok(slot)
        }

        fn add_filter_mask(&mut self, id: NodeAddress, _mask: u16) -> Result<FilterSlot, BusError> {
            self.add_filter_id(id)
        }

        fn init(&mut self) -> Result<(), BusError> {
            Ok(())
        }

        fn enable(&mut self) -> Result<(), BusError> {
            Ok(())
        }

        fn sleep(&mut self) -> Result<(), BusError> {
            Ok(())
        }

        fn set_bitrate(&mut self, _bitrate: Bitrate) -> Result<(), BusError> {
            Ok(())
        }
    }

    struct Count<'c>(&'c Cell<u32>);

    impl Handler for Count<'_> {
        fn handle(&mut self, _endpoint: Endpoint<'_>, _frame: &Frame) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn address(value: u16) -> NodeAddress {
        NodeAddress::new(value).unwrap()
    }

    #[test]
    fn test_node_capacity() {
        let mut registry: Registry<2, 2> = Registry::new();
        registry.register(address(900), None).unwrap();
        registry.register(address(904), None).unwrap();
        assert!(matches!(
            registry.register(address(908), None),
            Err(RegistrationError::NoNodeSlotLeft)
        ));
    }

    #[test]
    fn test_filter_capacity_leaves_state_unchanged() {
        let hits = Cell::new(0);
        let mut first = Count(&hits);
        let mut second = Count(&hits);
        let mut third = Count(&hits);

        let mut bus = StubBus::new();
        let mut registry: Registry<2, 2> = Registry::new();
        let node = registry.register(address(900), None).unwrap();

        registry
            .add_filter(&mut bus, node, FilterTarget::Id(address(950)), &mut first)
            .unwrap();
        registry
            .add_filter(&mut bus, node, FilterTarget::Id(address(954)), &mut second)
            .unwrap();
        assert_eq!(bus.slots, 2);

        assert!(matches!(
            registry.add_filter(&mut bus, node, FilterTarget::Id(address(958)), &mut third),
            Err(RegistrationError::NoFilterSlotLeft)
        ));
        // The hardware bank was not touched by the failing call
        assert_eq!(bus.slots, 2);
    }

    #[test]
    fn test_adapter_failure_leaves_table_empty() {
        let hits = Cell::new(0);
        let mut handler = Count(&hits);

        let mut bus = StubBus::new();
        bus.bank_full = true;
        let mut registry: Registry<2, 2> = Registry::new();
        let node = registry.register(address(900), None).unwrap();

        assert!(matches!(
            registry.add_filter(&mut bus, node, FilterTarget::Id(address(950)), &mut handler),
            Err(RegistrationError::Bus(BusError::Data))
        ));

        // No entry stored; a frame for slot 0 goes nowhere
        bus.bank_full = false;
        bus.pending = Some(Frame {
            id: address(950),
            data: crate::frame::Data::empty(),
            rtr: false,
            slot: Some(FilterSlot::new(0)),
        });
        registry.poll_once(&mut bus);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_poll_without_pending_frame() {
        let hits = Cell::new(0);
        let mut handler = Count(&hits);

        let mut bus = StubBus::new();
        let mut registry: Registry<2, 2> = Registry::new();
        let node = registry.register(address(900), None).unwrap();
        registry
            .add_filter(&mut bus, node, FilterTarget::Id(address(950)), &mut handler)
            .unwrap();

        registry.poll_once(&mut bus);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_unmatched_frame_is_dropped() {
        let hits = Cell::new(0);
        let mut on_request = Count(&hits);
        let mut on_data = Count(&hits);

        let mut bus = StubBus::new();
        let mut registry: Registry<2, 2> = Registry::new();
        let node = registry.register(address(900), Some(&mut on_request)).unwrap();
        registry
            .add_filter(&mut bus, node, FilterTarget::Id(address(950)), &mut on_data)
            .unwrap();

        // Data frame with an unknown slot
        bus.pending = Some(Frame {
            id: address(950),
            data: crate::frame::Data::empty(),
            rtr: false,
            slot: Some(FilterSlot::new(9)),
        });
        registry.poll_once(&mut bus);

        // Request frame for an unknown address
        bus.pending = Some(Frame {
            id: address(700),
            data: crate::frame::Data::empty(),
            rtr: true,
            slot: None,
        });
        registry.poll_once(&mut bus);

        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_request_routed_by_address() {
        let hits = Cell::new(0);
        let mut on_request = Count(&hits);

        let mut bus = StubBus::new();
        let mut registry: Registry<2, 2> = Registry::new();
        registry.register(address(900), Some(&mut on_request)).unwrap();
        registry.register(address(904), None).unwrap();

        bus.pending = Some(Frame {
            id: address(900),
            data: crate::frame::Data::empty(),
            rtr: true,
            slot: None,
        });
        registry.poll_once(&mut bus);
        assert_eq!(hits.get(), 1);

        // The same request to the handler-less node is absorbed
        bus.pending = Some(Frame {
            id: address(904),
            data: crate::frame::Data::empty(),
            rtr: true,
            slot: None,
        });
        registry.poll_once(&mut bus);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_first_registered_filter_wins() {
        let first_hits = Cell::new(0);
        let second_hits = Cell::new(0);
        let mut first = Count(&first_hits);
        let mut second = Count(&second_hits);

        let mut bus = StubBus::new();
        let mut registry: Registry<2, 2> = Registry::new();
        let node = registry.register(address(900), None).unwrap();
        registry
            .add_filter(&mut bus, node, FilterTarget::Id(address(950)), &mut first)
            .unwrap();
        registry
            .add_filter(&mut bus, node, FilterTarget::Id(address(954)), &mut second)
            .unwrap();

        bus.pending = Some(Frame {
            id: address(950),
            data: crate::frame::Data::empty(),
            rtr: false,
            slot: Some(FilterSlot::new(0)),
        });
        registry.poll_once(&mut bus);
        assert_eq!((first_hits.get(), second_hits.get()), (1, 0));
    }

    #[test]
    fn test_set_name_bounds() {
        let mut registry: Registry<2, 2> = Registry::new();
        let node = registry.register(address(900), None).unwrap();

        registry.set_name(node, "throttle").unwrap();
        assert_eq!(registry.name(node), Some("throttle"));
        assert_eq!(registry.info(node), None);

        let too_long = "a string well over the thirty byte name limit";
        assert!(registry.set_name(node, too_long).is_err());
        // The previous name survives a failed update
        assert_eq!(registry.name(node), Some("throttle"));
    }
}
