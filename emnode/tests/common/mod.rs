#![allow(dead_code)]

use std::collections::VecDeque;

use emnode::bus::{Bus, BusError};
use emnode::core::{Bitrate, NodeAddress};
use emnode::frame::{FilterSlot, Frame};
use emnode::time::Duration;

/// Scripted in-memory bus adapter.
///
/// Frames to be "received" are popped from `rx`, transmitted frames are
/// captured in `sent`, and filter slots are allocated sequentially from
/// `next_slot`.
pub struct TestBus {
    pub rx: VecDeque<Frame>,
    pub sent: Vec<Frame>,
    pub next_slot: u8,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            sent: Vec::new(),
            next_slot: 0,
        }
    }
}

impl Bus for TestBus {
    fn transmit(&mut self, frame: &Frame, _timeout: Duration) -> Result<(), BusError> {
        self.sent.push(*frame);
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> Result<Frame, BusError> {
        self.rx.pop_front().ok_or(BusError::NoData)
    }

    fn is_frame_pending(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn add_filter_id(&mut self, _id: NodeAddress) -> Result<FilterSlot, BusError> {
        let slot = FilterSlot::new(self.next_slot);
        self.next_slot += 1;
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
