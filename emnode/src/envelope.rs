//! Payload envelope descriptor
//!
//! Every typed payload leads with a single descriptor byte combining the
//! message kind and the data kind of the bytes that follow. This packing is
//! wire contract version 1 and is fixed for both ends a priori:
//!
//! ```text
//! bit       7   6   5   4   3   2   1   0
//!         +---------------------+-----------+
//!         |    message kind     | data kind |
//!         +---------------------+-----------+
//! ```
//!
//! Changing the field order or widths is a protocol break, not a tuning knob.

use crate::core::{DataKind, MessageKind};
use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Envelope(u8);

impl Envelope {
    const KIND: u8 = 3;
    const DATA_KIND: u8 = 0;

    pub const fn new(kind: MessageKind, data_kind: DataKind) -> Self {
        Self(kind.into_u8() << Self::KIND | data_kind.into_u8() << Self::DATA_KIND)
    }

    /// Message kind, `None` for reserved code points.
    pub const fn kind(&self) -> Option<MessageKind> {
        MessageKind::try_from_u8(self.0 >> Self::KIND)
    }

    pub const fn data_kind(&self) -> DataKind {
        DataKind::from_u8_truncating(self.0 >> Self::DATA_KIND)
    }

    /// Reads the descriptor from the first payload byte of a frame.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        frame.data.first().copied().map(Self)
    }
}

impl From<Envelope> for u8 {
    fn from(value: Envelope) -> Self {
        value.0
    }
}

impl From<u8> for Envelope {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
