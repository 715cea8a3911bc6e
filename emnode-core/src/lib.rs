//! emnode protocol core data types
//!
//! This crate provides basic data type definitions used by other emnode crates.
//! Emnode users should not depend on this crate directly. Use the `emnode::core`
//! reexport instead.
#![no_std]

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue;

/// Logical address of a protocol node
///
/// Node addresses live in the standard-frame identifier space (11 bits).
/// The protocol does not enforce uniqueness; applications must pick
/// non-colliding addresses. By convention a device claims a block of four
/// consecutive addresses above its [category] base.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeAddress(u16);

impl NodeAddress {
    const MAX_VALUE: u16 = 0x7ff;
    pub const MAX: NodeAddress = NodeAddress(Self::MAX_VALUE);

    pub const fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX_VALUE {
            Some(Self::from_u16_truncating(value))
        } else {
            None
        }
    }

    pub const fn from_u16_truncating(value: u16) -> Self {
        Self(value & Self::MAX_VALUE)
    }

    pub const fn into_u16(self) -> u16 {
        self.0
    }
}

impl From<NodeAddress> for u16 {
    fn from(value: NodeAddress) -> Self {
        value.into_u16()
    }
}

impl From<NodeAddress> for usize {
    fn from(value: NodeAddress) -> Self {
        u16::from(value).into()
    }
}

impl TryFrom<u16> for NodeAddress {
    type Error = InvalidValue;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidValue)
    }
}

/// Base addresses for the sensor categories carried on the vehicle bus
///
/// Each device claims a block of four consecutive addresses above its
/// category base, e.g. the second throttle-body unit sits at `SWITCH + 4`.
pub mod category {
    use super::NodeAddress;

    pub const RELAY: NodeAddress = NodeAddress::from_u16_truncating(850);
    pub const SWITCH: NodeAddress = NodeAddress::from_u16_truncating(900);
    pub const PRESSURE: NodeAddress = NodeAddress::from_u16_truncating(950);
    pub const TEMPERATURE: NodeAddress = NodeAddress::from_u16_truncating(1000);
    pub const VOLTAGE: NodeAddress = NodeAddress::from_u16_truncating(1050);
    pub const CURRENT: NodeAddress = NodeAddress::from_u16_truncating(1100);
    pub const TACHOMETER: NodeAddress = NodeAddress::from_u16_truncating(1150);
}

/// Data-type tag carried in the payload envelope
///
/// The tag occupies a 3-bit field, so all eight code points are meaningful.
/// The encoding is part of the wire contract, see `emnode::envelope`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataKind {
    /// Unsigned 8-bit integer
    Uint8 = 0,
    /// Signed 8-bit integer
    Int8 = 1,
    /// Unsigned 16-bit integer
    Uint16 = 2,
    /// Signed 16-bit integer
    Int16 = 3,
    /// Unsigned 32-bit integer
    Uint32 = 4,
    /// Signed 32-bit integer
    Int32 = 5,
    /// Each bit defines the state of one value
    BitField = 6,
    /// Catch-all for payloads the codec does not interpret
    Custom = 7,
}

impl DataKind {
    pub const fn from_u8_truncating(code: u8) -> DataKind {
        match code & 0x7 {
            0 => DataKind::Uint8,
            1 => DataKind::Int8,
            2 => DataKind::Uint16,
            3 => DataKind::Int16,
            4 => DataKind::Uint32,
            5 => DataKind::Int32,
            6 => DataKind::BitField,
            7 => DataKind::Custom,
            _ => unreachable!(),
        }
    }

    pub const fn into_u8(self) -> u8 {
        self as u8
    }
}

impl From<DataKind> for u8 {
    fn from(value: DataKind) -> Self {
        value.into_u8()
    }
}

/// Message-kind tag carried in the payload envelope
///
/// The tag occupies a 5-bit field; code points 11..=31 are reserved.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MessageKind {
    /// Normal operation, the node is sending a value to other nodes
    Data = 0,
    /// Sent by a master to enter data mode (the default mode)
    EnterDataMode = 1,
    /// Sent by a master to enter configuration mode
    EnterConfigMode = 2,
    /// Sent by a master to change the address of a node
    SetId = 3,
    /// Sent by a master to change the name of a node
    SetName = 4,
    /// Sent by a master to change the info string of a node
    SetInfo = 5,
    /// Sent by a node when the requested new address is not available
    IdSetError = 6,
    /// General configuration error
    ConfigError = 7,
    /// Ask a node for its name string
    GetName = 8,
    /// Ask a node for its info string
    GetInfo = 9,
    /// The payload is one fragment of a name/info string
    NameInfo = 10,
}

impl MessageKind {
    pub const fn try_from_u8(code: u8) -> Option<MessageKind> {
        match code {
            0 => Some(MessageKind::Data),
            1 => Some(MessageKind::EnterDataMode),
            2 => Some(MessageKind::EnterConfigMode),
            3 => Some(MessageKind::SetId),
            4 => Some(MessageKind::SetName),
            5 => Some(MessageKind::SetInfo),
            6 => Some(MessageKind::IdSetError),
            7 => Some(MessageKind::ConfigError),
            8 => Some(MessageKind::GetName),
            9 => Some(MessageKind::GetInfo),
            10 => Some(MessageKind::NameInfo),
            _ => None,
        }
    }

    pub const fn into_u8(self) -> u8 {
        self as u8
    }
}

impl From<MessageKind> for u8 {
    fn from(value: MessageKind) -> Self {
        value.into_u8()
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from_u8(value).ok_or(InvalidValue)
    }
}

/// Nominal bit rates supported on the bus
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bitrate {
    Rate10k,
    Rate20k,
    Rate50k,
    Rate100k,
    Rate125k,
    Rate250k,
    Rate500k,
    Rate750k,
    Rate1000k,
}

impl Bitrate {
    pub const fn bits_per_second(self) -> u32 {
        match self {
            Bitrate::Rate10k => 10_000,
            Bitrate::Rate20k => 20_000,
            Bitrate::Rate50k => 50_000,
            Bitrate::Rate100k => 100_000,
            Bitrate::Rate125k => 125_000,
            Bitrate::Rate250k => 250_000,
            Bitrate::Rate500k => 500_000,
            Bitrate::Rate750k => 750_000,
            Bitrate::Rate1000k => 1_000_000,
        }
    }
}
