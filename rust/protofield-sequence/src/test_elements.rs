//! Composite elements used by the unit tests.

use byteorder::{BigEndian, ByteOrder};
use protofield_common::{Result, error::Error};

use crate::element::{Element, ElementKind, Version};
use crate::tag::{FieldTag, TaggedField};

/// Largest `value` a valid record may carry.
pub const MAX_VALUE: u16 = 1000;

/// Version from which records carry the trailing `extra` byte.
pub const EXTRA_SINCE: Version = 2;

/// Nested field with a validity range, a derived checksum and a
/// version-dependent trailing byte.
///
/// Wire format: `value` (u16 BE), `checksum` (u8), then `extra` (u8) if present.
#[derive(Debug, Clone, Default, PartialEq, PartialOrd)]
pub struct Record {
    pub value: u16,
    pub checksum: u8,
    pub extra: Option<u8>,
}

impl Record {
    pub fn new(value: u16) -> Record {
        Record {
            value,
            checksum: Self::checksum_of(value),
            extra: None,
        }
    }

    pub fn checksum_of(value: u16) -> u8 {
        let [hi, lo] = value.to_be_bytes();
        hi ^ lo
    }
}

impl Element for Record {
    const KIND: ElementKind = ElementKind::Composite;

    fn min_length() -> usize {
        3
    }

    fn max_length() -> usize {
        4
    }

    fn length(&self) -> usize {
        3 + usize::from(self.extra.is_some())
    }

    fn read(&mut self, buf: &mut &[u8], len: usize) -> Result<()> {
        let required = self.length();
        let available = len.min(buf.len());
        if available < required {
            return Err(Error::not_enough_data("record", required, available));
        }
        self.value = BigEndian::read_u16(buf);
        self.checksum = buf[2];
        if let Some(extra) = self.extra.as_mut() {
            *extra = buf[3];
        }
        *buf = &buf[required..];
        Ok(())
    }

    fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()> {
        let required = self.length();
        if len < required {
            return Err(Error::buffer_overflow("record", required, len));
        }
        out.extend_from_slice(&self.value.to_be_bytes());
        out.push(self.checksum);
        out.extend(self.extra);
        Ok(())
    }

    fn valid(&self) -> bool {
        self.value <= MAX_VALUE
    }

    fn refresh(&mut self) -> bool {
        let checksum = Self::checksum_of(self.value);
        let changed = self.checksum != checksum;
        self.checksum = checksum;
        changed
    }

    fn has_non_default_refresh() -> bool {
        true
    }

    fn is_version_dependent() -> bool {
        true
    }

    fn set_version(&mut self, version: Version) -> bool {
        let wants_extra = version >= EXTRA_SINCE;
        if wants_extra == self.extra.is_some() {
            return false;
        }
        self.extra = wants_extra.then_some(0);
        true
    }
}

impl TaggedField for Record {
    const TAG: FieldTag = FieldTag::Other;
}

/// Variable-length text: a one-byte length prefix followed by that many bytes.
///
/// An empty text occupies only its prefix, so it still consumes input.
#[derive(Debug, Clone, Default, PartialEq, PartialOrd)]
pub struct Label(pub Vec<u8>);

impl Element for Label {
    const KIND: ElementKind = ElementKind::Composite;

    fn min_length() -> usize {
        1
    }

    fn max_length() -> usize {
        1 + u8::MAX as usize
    }

    fn length(&self) -> usize {
        1 + self.0.len()
    }

    fn read(&mut self, buf: &mut &[u8], len: usize) -> Result<()> {
        let available = len.min(buf.len());
        if available < 1 {
            return Err(Error::not_enough_data("label", 1, available));
        }
        let size = usize::from(buf[0]);
        if available < 1 + size {
            return Err(Error::not_enough_data("label", 1 + size, available));
        }
        self.0 = buf[1..1 + size].to_vec();
        *buf = &buf[1 + size..];
        Ok(())
    }

    fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()> {
        let size = u8::try_from(self.0.len())
            .map_err(|_| Error::invalid_operation("label longer than 255 bytes"))?;
        if len < self.length() {
            return Err(Error::buffer_overflow("label", self.length(), len));
        }
        out.push(size);
        out.extend_from_slice(&self.0);
        Ok(())
    }

    fn can_write(&self) -> bool {
        self.0.len() <= u8::MAX as usize
    }
}

/// Element that never consumes input, used to exercise the greedy-read guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Marker;

impl Element for Marker {
    const KIND: ElementKind = ElementKind::Composite;

    fn min_length() -> usize {
        0
    }

    fn max_length() -> usize {
        0
    }

    fn length(&self) -> usize {
        0
    }

    fn read(&mut self, _buf: &mut &[u8], _len: usize) -> Result<()> {
        Ok(())
    }

    fn write(&self, _out: &mut Vec<u8>, _len: usize) -> Result<()> {
        Ok(())
    }
}
