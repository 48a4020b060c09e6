//! The capability set a sequence field requires from the items it stores.

use byteorder::{BigEndian, ByteOrder};
use protofield_common::{Result, error::Error};

/// Protocol version propagated from a message down to its fields.
pub type Version = u32;

/// Semantic classification of an element type, fixed when the element type is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Fixed-width integral value occupying `width` bytes on the wire.
    Integral { width: usize },
    /// Nested protocol field with its own read/write/valid/refresh contract.
    Composite,
}

impl ElementKind {
    #[inline]
    pub const fn is_integral(&self) -> bool {
        matches!(self, ElementKind::Integral { .. })
    }

    /// Returns `true` for integral elements exactly one byte wide, the only kind
    /// that can be viewed directly over the input bytes.
    #[inline]
    pub const fn is_single_byte_integral(&self) -> bool {
        matches!(self, ElementKind::Integral { width: 1 })
    }

    #[inline]
    pub const fn is_composite(&self) -> bool {
        matches!(self, ElementKind::Composite)
    }
}

/// A single item of a sequence: either a raw integral value or a nested field.
///
/// The sequence never interprets element bytes itself; every decode/encode is
/// delegated to these methods. The read cursor is a byte slice that is advanced
/// in place past the consumed bytes; `len` is the byte budget the element may use,
/// which can be smaller than the remaining cursor.
///
/// Integral elements get trivial `valid`/`refresh`/`set_version` behavior from the
/// defaults. Composite elements override whichever of those they need.
pub trait Element: Clone + Default + PartialEq + PartialOrd + std::fmt::Debug + 'static {
    const KIND: ElementKind;

    /// Minimal serialized length of any value of this element type.
    fn min_length() -> usize;

    /// Maximal serialized length of any value of this element type.
    fn max_length() -> usize;

    /// Serialized length of this value.
    fn length(&self) -> usize;

    /// Decodes the element from `buf`, consuming at most `len` bytes.
    fn read(&mut self, buf: &mut &[u8], len: usize) -> Result<()>;

    /// Appends the encoding of this element to `out`, which may accept at most
    /// `len` more bytes.
    fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()>;

    fn has_read_no_status() -> bool {
        true
    }

    /// Decodes without reporting status. The caller guarantees `buf` holds a
    /// complete encoding.
    fn read_no_status(&mut self, buf: &mut &[u8]) {
        let len = buf.len();
        let _ = self.read(buf, len);
    }

    fn has_write_no_status() -> bool {
        true
    }

    fn write_no_status(&self, out: &mut Vec<u8>) {
        let _ = self.write(out, usize::MAX);
    }

    fn valid(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    /// Brings the element into a consistent state, returning `true` if its value changed.
    fn refresh(&mut self) -> bool {
        false
    }

    fn has_non_default_refresh() -> bool {
        false
    }

    fn is_version_dependent() -> bool {
        false
    }

    /// Applies a new protocol version, returning `true` if the element's contents changed.
    fn set_version(&mut self, _version: Version) -> bool {
        false
    }

    /// Reinterprets raw input bytes as a slice of elements without copying.
    ///
    /// Only one-byte integral elements can provide this; everything else returns `None`.
    fn view_slice(_bytes: &[u8]) -> Option<&[Self]> {
        None
    }
}

impl Element for u8 {
    const KIND: ElementKind = ElementKind::Integral { width: 1 };

    fn min_length() -> usize {
        1
    }

    fn max_length() -> usize {
        1
    }

    fn length(&self) -> usize {
        1
    }

    fn read(&mut self, buf: &mut &[u8], len: usize) -> Result<()> {
        let available = len.min(buf.len());
        if available < 1 {
            return Err(Error::not_enough_data("u8", 1, available));
        }
        *self = buf[0];
        *buf = &buf[1..];
        Ok(())
    }

    fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()> {
        if len < 1 {
            return Err(Error::buffer_overflow("u8", 1, len));
        }
        out.push(*self);
        Ok(())
    }

    fn read_no_status(&mut self, buf: &mut &[u8]) {
        *self = buf[0];
        *buf = &buf[1..];
    }

    fn write_no_status(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }

    fn view_slice(bytes: &[u8]) -> Option<&[u8]> {
        Some(bytes)
    }
}

impl Element for i8 {
    const KIND: ElementKind = ElementKind::Integral { width: 1 };

    fn min_length() -> usize {
        1
    }

    fn max_length() -> usize {
        1
    }

    fn length(&self) -> usize {
        1
    }

    fn read(&mut self, buf: &mut &[u8], len: usize) -> Result<()> {
        let available = len.min(buf.len());
        if available < 1 {
            return Err(Error::not_enough_data("i8", 1, available));
        }
        *self = buf[0] as i8;
        *buf = &buf[1..];
        Ok(())
    }

    fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()> {
        if len < 1 {
            return Err(Error::buffer_overflow("i8", 1, len));
        }
        out.push(*self as u8);
        Ok(())
    }

    fn view_slice(bytes: &[u8]) -> Option<&[i8]> {
        Some(bytemuck::cast_slice(bytes))
    }
}

/// Multi-byte integrals, big-endian on the wire.
macro_rules! impl_wide_integral_element {
    ($ty:ty, $width:expr, $read:path, $write:path) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::Integral { width: $width };

            fn min_length() -> usize {
                $width
            }

            fn max_length() -> usize {
                $width
            }

            fn length(&self) -> usize {
                $width
            }

            fn read(&mut self, buf: &mut &[u8], len: usize) -> Result<()> {
                let available = len.min(buf.len());
                if available < $width {
                    return Err(Error::not_enough_data(stringify!($ty), $width, available));
                }
                *self = $read(&buf[..$width]);
                *buf = &buf[$width..];
                Ok(())
            }

            fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()> {
                if len < $width {
                    return Err(Error::buffer_overflow(stringify!($ty), $width, len));
                }
                let mut encoded = [0u8; $width];
                $write(&mut encoded, *self);
                out.extend_from_slice(&encoded);
                Ok(())
            }
        }
    };
}

impl_wide_integral_element!(u16, 2, BigEndian::read_u16, BigEndian::write_u16);
impl_wide_integral_element!(i16, 2, BigEndian::read_i16, BigEndian::write_i16);
impl_wide_integral_element!(u32, 4, BigEndian::read_u32, BigEndian::write_u32);
impl_wide_integral_element!(i32, 4, BigEndian::read_i32, BigEndian::write_i32);
impl_wide_integral_element!(u64, 8, BigEndian::read_u64, BigEndian::write_u64);
impl_wide_integral_element!(i64, 8, BigEndian::read_i64, BigEndian::write_i64);
