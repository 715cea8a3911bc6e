//! Bus adapter trait implemented by CAN peripheral drivers

use emnode_core::{Bitrate, NodeAddress};

use crate::frame::{FilterSlot, Frame};
use crate::time::Duration;

/// Adapter-reported failure states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// No frame was available within the receive timeout
    NoData,
    /// The bus is working with someone else right now
    Busy,
    /// The bus is off. Recovery requires [`Bus::init`] and [`Bus::enable`];
    /// the stack surfaces this state but never attempts recovery itself.
    Off,
    /// Catch-all data error
    Data,
}

/// Boundary toward the hardware bus adapter
///
/// All blocking is bounded: `transmit` and `receive` may wait at most
/// `timeout`, everything else returns promptly. The adapter performs id/mask
/// acceptance filtering in hardware and reports, per received frame, which
/// registered slot matched ([`Frame::slot`]).
///
/// [`Bus::init`] and [`Bus::enable`] must have succeeded before transfers are
/// meaningful; the stack does not drive the adapter lifecycle.
pub trait Bus {
    /// Sends one frame, waiting at most `timeout` for a transmit mailbox.
    fn transmit(&mut self, frame: &Frame, timeout: Duration) -> Result<(), BusError>;

    /// Receives one frame, waiting at most `timeout`.
    ///
    /// Returns [`BusError::NoData`] when nothing arrives in time. The
    /// returned frame carries the matched filter slot annotation.
    fn receive(&mut self, timeout: Duration) -> Result<Frame, BusError>;

    /// Non-blocking peek: is a received frame waiting to be fetched?
    fn is_frame_pending(&mut self) -> bool;

    /// Registers an acceptance filter matching exactly `id`.
    ///
    /// Fails when the hardware filter bank is full.
    fn add_filter_id(&mut self, id: NodeAddress) -> Result<FilterSlot, BusError>;

    /// Registers an acceptance filter matching `id` under `mask`.
    ///
    /// A mask bit of 1 requires the corresponding identifier bit to match.
    fn add_filter_mask(&mut self, id: NodeAddress, mask: u16) -> Result<FilterSlot, BusError>;

    /// Initializes the controller.
    fn init(&mut self) -> Result<(), BusError>;

    /// Enables the controller, joining the bus.
    fn enable(&mut self) -> Result<(), BusError>;

    /// Puts the controller into low-power sleep.
    fn sleep(&mut self) -> Result<(), BusError>;

    /// Configures the nominal bit rate. Takes effect on the next enable.
    fn set_bitrate(&mut self, bitrate: Bitrate) -> Result<(), BusError>;
}
