//! Transport frame object

use emnode_core::NodeAddress;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidLength;

/// Classic-CAN-compatible data vector
///
/// Holds 0 to 8 payload bytes. Unused trailing bytes are kept zeroed so that
/// equal payloads compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Data {
    length: u8,
    bytes: [u8; 8],
}

impl Data {
    pub const MAX: usize = 8;

    /// Creates a new vector from a slice of compatible length.
    pub fn new(data: &[u8]) -> Result<Self, InvalidLength> {
        if data.len() > Self::MAX {
            return Err(InvalidLength);
        }
        let mut bytes = [0; 8];
        bytes[..data.len()].copy_from_slice(data);

        Ok(Self {
            length: data.len() as u8,
            bytes,
        })
    }

    pub const fn empty() -> Self {
        Self {
            length: 0,
            bytes: [0; 8],
        }
    }

    pub const fn len(&self) -> usize {
        self.length as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl Default for Data {
    fn default() -> Self {
        Self::empty()
    }
}

impl core::ops::Deref for Data {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes[..self.length as usize]
    }
}

impl core::ops::DerefMut for Data {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bytes[..self.length as usize]
    }
}

/// Index of the hardware acceptance-filter rule that matched a received frame
///
/// Slot values are allocated by the driver on filter registration and are
/// opaque to the stack. They are globally allocated: two registrations never
/// share a slot, regardless of which node requested them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterSlot(u8);

impl FilterSlot {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub const fn into_u8(self) -> u8 {
        self.0
    }
}

impl From<FilterSlot> for u8 {
    fn from(value: FilterSlot) -> Self {
        value.into_u8()
    }
}

/// The unit exchanged with the bus
///
/// `slot` is a receive-time annotation: the driver populates it with the
/// acceptance-filter slot that matched the frame. It is never transmitted.
/// `rtr` distinguishes "asking for the current value" frames from
/// "here is a value" frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub id: NodeAddress,
    pub data: Data,
    pub rtr: bool,
    pub slot: Option<FilterSlot>,
}

impl Frame {
    pub const fn empty() -> Self {
        Self {
            id: NodeAddress::from_u16_truncating(0),
            data: Data::empty(),
            rtr: false,
            slot: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_length_bounds() {
        assert_eq!(Data::new(&[]).unwrap().len(), 0);
        assert_eq!(Data::new(&[0; 8]).unwrap().len(), 8);
        assert!(Data::new(&[0; 9]).is_err());
    }

    #[test]
    fn test_data_padding_equality() {
        let a = Data::new(&[1, 2, 3]).unwrap();
        let b = Data::new(&[1, 2, 3]).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..], &[1, 2, 3]);
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::empty();
        assert!(frame.data.is_empty());
        assert_eq!(frame.slot, None);
        assert!(!frame.rtr);
    }
}
