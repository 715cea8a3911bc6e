//! Typed payload codec
//!
//! Encodes scalar and short-array integer values into frame payloads behind an
//! [`Envelope`] descriptor, and decodes them back with tag verification. The
//! data-kind tag must match the type the caller asks for; a mismatch is
//! reported as an error so handlers can reject unexpected encodings instead of
//! misinterpreting bytes.
//!
//! All integers travel little-endian. There is no endianness negotiation;
//! both ends must share this convention a priori.

use crate::core::{DataKind, MessageKind};
use crate::envelope::Envelope;
use crate::frame::{Data, Frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// The envelope's data-kind tag or the payload length does not correspond
    /// to the requested type
    TypeMismatch,
    /// Too many elements for the payload capacity of the element type
    Overflow,
}

mod sealed {
    pub trait Sealed {}
}

/// An integer type the codec can carry as a single value
///
/// Implemented for the six supported widths/signs; the trait is sealed.
pub trait Scalar: sealed::Sealed + Copy {
    const DATA_KIND: DataKind;
    const SIZE: usize;

    #[doc(hidden)]
    fn put(self, out: &mut [u8]);
    #[doc(hidden)]
    fn get(bytes: &[u8]) -> Self;
}

/// A [`Scalar`] narrow enough to be carried as an array
///
/// `CAPACITY` is the element count that fits the payload after the envelope
/// byte: 7 for 8-bit elements, 3 for 16-bit elements.
pub trait Element: Scalar {
    const CAPACITY: usize = (Data::MAX - 1) / Self::SIZE;
}

macro_rules! impl_scalar {
    ($ty:ty, $kind:expr) => {
        impl sealed::Sealed for $ty {}

        impl Scalar for $ty {
            const DATA_KIND: DataKind = $kind;
            const SIZE: usize = core::mem::size_of::<$ty>();

            fn put(self, out: &mut [u8]) {
                out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
            }

            fn get(bytes: &[u8]) -> Self {
                let mut raw = [0; core::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                <$ty>::from_le_bytes(raw)
            }
        }
    };
}

impl_scalar!(u8, DataKind::Uint8);
impl_scalar!(i8, DataKind::Int8);
impl_scalar!(u16, DataKind::Uint16);
impl_scalar!(i16, DataKind::Int16);
impl_scalar!(u32, DataKind::Uint32);
impl_scalar!(i32, DataKind::Int32);

impl Element for u8 {}
impl Element for i8 {}
impl Element for u16 {}
impl Element for i16 {}

/// Encodes one scalar value as a data payload.
pub fn encode<T: Scalar>(value: T) -> Data {
    let mut buf = [0u8; Data::MAX];
    buf[0] = Envelope::new(MessageKind::Data, T::DATA_KIND).into();
    value.put(&mut buf[1..]);
    unwrap!(Data::new(&buf[..1 + T::SIZE]))
}

/// Encodes an array of values as a data payload.
///
/// Fails with [`CodecError::Overflow`] when `values` exceeds the element
/// capacity for the width, producing nothing.
pub fn encode_array<T: Element>(values: &[T]) -> Result<Data, CodecError> {
    if values.len() > T::CAPACITY {
        return Err(CodecError::Overflow);
    }
    let mut buf = [0u8; Data::MAX];
    buf[0] = Envelope::new(MessageKind::Data, T::DATA_KIND).into();
    let mut length = 1;
    for &value in values {
        value.put(&mut buf[length..]);
        length += T::SIZE;
    }
    Ok(unwrap!(Data::new(&buf[..length])))
}

/// Decodes one scalar value out of a frame.
///
/// The envelope's data-kind tag must name `T` and the payload must hold
/// exactly one value of it.
pub fn decode<T: Scalar>(frame: &Frame) -> Result<T, CodecError> {
    let envelope = Envelope::from_frame(frame).ok_or(CodecError::TypeMismatch)?;
    if envelope.data_kind() != T::DATA_KIND || frame.data.len() != 1 + T::SIZE {
        return Err(CodecError::TypeMismatch);
    }
    Ok(T::get(&frame.data[1..]))
}

/// Decodes an array of values out of a frame into `out`.
///
/// Returns the element count actually present, which may be less than the
/// frame maximum. Fails with [`CodecError::Overflow`] when `out` is too small
/// for it.
pub fn decode_array<T: Element>(frame: &Frame, out: &mut [T]) -> Result<usize, CodecError> {
    let envelope = Envelope::from_frame(frame).ok_or(CodecError::TypeMismatch)?;
    let payload = &frame.data[1..];
    if envelope.data_kind() != T::DATA_KIND || payload.len() % T::SIZE != 0 {
        return Err(CodecError::TypeMismatch);
    }
    let count = payload.len() / T::SIZE;
    if count > out.len() {
        return Err(CodecError::Overflow);
    }
    for (index, slot) in out[..count].iter_mut().enumerate() {
        *slot = T::get(&payload[index * T::SIZE..]);
    }
    Ok(count)
}
