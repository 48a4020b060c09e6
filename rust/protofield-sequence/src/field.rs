//! The sequence field: a run of homogeneous elements read from and written to a
//! byte budget.

use std::cmp::Ordering;

use protofield_common::{Result, error::Error, verify_arg};

use crate::def::SequenceDef;
use crate::element::{Element, Version};
use crate::storage::Storage;
use crate::tag::{FieldTag, TaggedField};

/// One-shot read parameters. Each is consumed by the next read and then cleared,
/// whatever the outcome of that read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ReadOverrides {
    elem_count: Option<usize>,
    length: Option<usize>,
    elem_length: Option<usize>,
}

impl ReadOverrides {
    fn is_empty(&self) -> bool {
        *self == ReadOverrides::default()
    }
}

/// A sequence field owning (or viewing) its elements.
///
/// The lifetime `'a` bounds the bytes a zero-copy view may reference. Fields with
/// owning storage do not borrow anything and can be read with
/// [`SequenceField::read_owned`] from buffers of any lifetime.
///
/// Read failures leave the storage in the partially decoded state reached so far;
/// callers that need atomic reads must snapshot the value themselves.
#[derive(Debug, Clone)]
pub struct SequenceField<'a, E: Element> {
    def: SequenceDef<E>,
    storage: Storage<'a, E>,
    overrides: ReadOverrides,
    version: Option<Version>,
}

impl<'a, E: Element> SequenceField<'a, E> {
    /// Creates a field with empty storage.
    pub fn new(def: SequenceDef<E>) -> SequenceField<'a, E> {
        SequenceField {
            storage: def.empty_storage(),
            version: def.options().version_storage.then_some(0),
            overrides: ReadOverrides::default(),
            def,
        }
    }

    /// Creates a field holding `storage`, which must be of the definition's
    /// storage representation.
    pub fn with_value(def: SequenceDef<E>, storage: Storage<'a, E>) -> Result<SequenceField<'a, E>> {
        let mut field = SequenceField::new(def);
        field.set_value(storage)?;
        Ok(field)
    }

    /// Creates a field and appends `elements` to its storage.
    pub fn from_elements<I>(def: SequenceDef<E>, elements: I) -> Result<SequenceField<'a, E>>
    where
        I: IntoIterator<Item = E>,
    {
        let mut field = SequenceField::new(def);
        field.storage.extend(elements)?;
        Ok(field)
    }

    #[inline]
    pub fn def(&self) -> &SequenceDef<E> {
        &self.def
    }

    #[inline]
    pub fn value(&self) -> &Storage<'a, E> {
        &self.storage
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut Storage<'a, E> {
        &mut self.storage
    }

    pub fn into_value(self) -> Storage<'a, E> {
        self.storage
    }

    /// Replaces the stored value.
    ///
    /// Fails if `storage` is not of the definition's representation (including a
    /// different capacity for bounded storage).
    pub fn set_value(&mut self, storage: Storage<'a, E>) -> Result<()> {
        let expected = self.def.storage_kind();
        let actual = storage.kind();
        if actual != expected {
            return Err(Error::invalid_arg(
                "value",
                format!("expected {expected} storage, got {actual}"),
            ));
        }
        self.storage = storage;
        Ok(())
    }

    /// Replaces the stored elements with `elements`.
    ///
    /// Bounded storage rejects more elements than it can hold; the elements
    /// accepted before the rejection stay stored.
    pub fn assign<I>(&mut self, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = E>,
    {
        self.storage.clear();
        self.storage.extend(elements)
    }

    #[inline]
    pub fn elements(&self) -> &[E] {
        self.storage.as_slice()
    }

    /// Serialized length of the stored elements, including fixed-size padding.
    ///
    /// Saturates at `usize::MAX` instead of overflowing.
    pub fn length(&self) -> usize {
        let stored = self
            .storage
            .iter()
            .try_fold(0usize, |total, element| total.checked_add(element.length()));
        let padding = match self.padding_count() {
            0 => Some(0),
            padding => padding.checked_mul(E::default().length()),
        };
        stored
            .zip(padding)
            .and_then(|(stored, padding)| stored.checked_add(padding))
            .unwrap_or(usize::MAX)
    }

    pub fn min_length(&self) -> usize {
        self.def.min_length()
    }

    pub fn max_length(&self) -> usize {
        self.def.max_length()
    }

    /// Reads the sequence from `buf`, consuming at most `len` bytes.
    ///
    /// Without overrides or a fixed element count, elements are decoded until the
    /// budget is exhausted. The cursor is advanced past everything consumed; with a
    /// zero-copy view the storage then references the consumed bytes directly.
    pub fn read<'b: 'a>(&mut self, buf: &mut &'b [u8], len: usize) -> Result<()> {
        let overrides = self.take_overrides();
        let start = buf.len();
        let result = if self.storage.is_view() {
            self.read_view(buf, len, overrides)
        } else {
            self.read_elements(buf, len, overrides)
        };
        self.finish_read(result, start - buf.len())
    }

    /// Reads into owning storage from a buffer of any lifetime.
    ///
    /// Fails with `InvalidOperation` for a zero-copy view, which must borrow its input.
    pub fn read_owned(&mut self, buf: &mut &[u8], len: usize) -> Result<()> {
        let overrides = self.take_overrides();
        let start = buf.len();
        let result = if self.storage.is_view() {
            Err(Error::invalid_operation("owned read into a zero-copy view"))
        } else {
            self.read_elements(buf, len, overrides)
        };
        self.finish_read(result, start - buf.len())
    }

    /// Reads without status reporting or bounds checking.
    ///
    /// The caller guarantees that `buf` holds a complete, well-formed encoding.
    ///
    /// # Panics
    ///
    /// May panic if `buf` is shorter than the encoding requires.
    pub fn read_no_status<'b: 'a>(&mut self, buf: &mut &'b [u8]) {
        let overrides = self.take_overrides();
        let bytes: &'b [u8] = *buf;
        let bytes = match overrides.length {
            Some(length) => &bytes[..length],
            None => bytes,
        };
        let count = overrides.elem_count.or(self.def.fixed_size());

        if self.storage.is_view() {
            let take = count.unwrap_or(bytes.len());
            if let Some(view) = E::view_slice(&bytes[..take]) {
                self.storage = Storage::View(view);
            }
            *buf = &buf[take..];
            return;
        }

        let mut cursor = bytes;
        match count {
            Some(count) => {
                for _ in 0..count {
                    self.read_element_no_status(&mut cursor, overrides.elem_length);
                }
            }
            None => {
                while !cursor.is_empty() {
                    let before = cursor.len();
                    self.read_element_no_status(&mut cursor, overrides.elem_length);
                    if cursor.len() == before {
                        break;
                    }
                }
            }
        }
        let consumed = bytes.len() - cursor.len();
        *buf = &buf[consumed..];
    }

    /// Writes the stored elements in order, followed by default elements up to the
    /// fixed element count if one is configured.
    ///
    /// Nothing is written if the whole encoding does not fit into `len` bytes.
    pub fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()> {
        let result = self.write_elements(out, len);
        match &result {
            Ok(()) => log::trace!(
                "wrote {} sequence elements ({} padding) into {} bytes",
                self.storage.len(),
                self.padding_count(),
                self.length()
            ),
            Err(err) => log::debug!("sequence write failed: {err}"),
        }
        result
    }

    /// Writes without status reporting or budget checks.
    pub fn write_no_status(&self, out: &mut Vec<u8>) {
        for element in self.storage.iter() {
            element.write_no_status(out);
        }
        let padding = self.padding_count();
        if padding > 0 {
            let filler = E::default();
            for _ in 0..padding {
                filler.write_no_status(out);
            }
        }
    }

    pub fn has_read_no_status(&self) -> bool {
        self.def.has_read_no_status()
    }

    pub fn has_write_no_status(&self) -> bool {
        self.def.has_write_no_status()
    }

    /// Whether the current value can be written without violating structural
    /// constraints. Does not mutate anything.
    pub fn can_write(&self) -> bool {
        self.fits_fixed_size() && self.storage.iter().all(E::can_write)
    }

    /// `true` iff every element is valid and the stored count does not exceed a
    /// configured fixed element count.
    pub fn valid(&self) -> bool {
        self.fits_fixed_size() && self.storage.iter().all(E::valid)
    }

    /// Refreshes every element, returning `true` if any of them changed.
    pub fn refresh(&mut self) -> bool {
        match self.storage.as_mut_slice() {
            Some(elements) => elements
                .iter_mut()
                .fold(false, |changed, element| element.refresh() || changed),
            None => false,
        }
    }

    pub fn has_non_default_refresh(&self) -> bool {
        self.def.has_non_default_refresh()
    }

    pub fn is_version_dependent(&self) -> bool {
        self.def.is_version_dependent()
    }

    /// The last version applied, if version storage is configured.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Applies a new protocol version to the field and every element.
    ///
    /// Returns `true` if any element's contents changed.
    pub fn set_version(&mut self, version: Version) -> bool {
        if let Some(stored) = self.version.as_mut() {
            *stored = version;
        }
        let mut updated = match self.storage.as_mut_slice() {
            Some(elements) => elements
                .iter_mut()
                .fold(false, |updated, element| element.set_version(version) || updated),
            None => false,
        };
        if let Some(update) = self.def.options().custom_version_update {
            updated = update(&mut self.storage, version) || updated;
        }
        updated
    }

    /// Makes the next read consume exactly `count` elements.
    pub fn force_read_elem_count(&mut self, count: usize) -> Result<()> {
        if !self.def.options().elem_count_forcing {
            return Err(Error::invalid_operation(
                "force_read_elem_count: element count forcing is not enabled",
            ));
        }
        self.overrides.elem_count = Some(count);
        Ok(())
    }

    pub fn clear_read_elem_count(&mut self) {
        self.overrides.elem_count = None;
    }

    /// Limits the next read to exactly `length` bytes.
    pub fn force_read_length(&mut self, length: usize) -> Result<()> {
        if !self.def.options().length_forcing {
            return Err(Error::invalid_operation(
                "force_read_length: length forcing is not enabled",
            ));
        }
        self.overrides.length = Some(length);
        Ok(())
    }

    pub fn clear_read_length_forcing(&mut self) {
        self.overrides.length = None;
    }

    /// Makes the next read decode every element from a window of exactly `length`
    /// bytes, skipping whatever the element leaves unread.
    pub fn force_read_elem_length(&mut self, length: usize) -> Result<()> {
        if !self.def.options().elem_length_forcing {
            return Err(Error::invalid_operation(
                "force_read_elem_length: element length forcing is not enabled",
            ));
        }
        verify_arg!(length, length > 0);
        self.overrides.elem_length = Some(length);
        Ok(())
    }

    pub fn clear_read_elem_length_forcing(&mut self) {
        self.overrides.elem_length = None;
    }

    pub fn forced_read_elem_count(&self) -> Option<usize> {
        self.overrides.elem_count
    }

    pub fn forced_read_length(&self) -> Option<usize> {
        self.overrides.length
    }

    pub fn forced_read_elem_length(&self) -> Option<usize> {
        self.overrides.elem_length
    }

    /// Upcast to the object-level field interface.
    pub fn to_field_base(&self) -> &dyn Field<'a> {
        self
    }

    pub fn to_field_base_mut(&mut self) -> &mut dyn Field<'a> {
        self
    }

    fn take_overrides(&mut self) -> ReadOverrides {
        let overrides = std::mem::take(&mut self.overrides);
        if !overrides.is_empty() {
            log::debug!("sequence read consumes one-shot overrides {overrides:?}");
        }
        self.storage.clear();
        overrides
    }

    fn finish_read(&self, result: Result<()>, consumed: usize) -> Result<()> {
        let result = result.and_then(|()| {
            if self.def.options().fail_on_invalid && !self.valid() {
                return Err(Error::invalid_content("sequence"));
            }
            Ok(())
        });
        match &result {
            Ok(()) => log::trace!(
                "read {} sequence elements from {consumed} bytes into {} storage",
                self.storage.len(),
                self.def.storage_kind()
            ),
            Err(err) => log::debug!(
                "sequence read failed after {} elements ({consumed} bytes): {err}",
                self.storage.len()
            ),
        }
        result
    }

    /// Byte budget of a read: the caller's budget, replaced by a forced length if set.
    fn read_budget(buf: &[u8], len: usize, overrides: &ReadOverrides) -> Result<usize> {
        let available = len.min(buf.len());
        match overrides.length {
            Some(forced) if available < forced => {
                Err(Error::not_enough_data("sequence", forced, available))
            }
            Some(forced) => Ok(forced),
            None => Ok(available),
        }
    }

    fn read_view<'b: 'a>(
        &mut self,
        buf: &mut &'b [u8],
        len: usize,
        overrides: ReadOverrides,
    ) -> Result<()> {
        let budget = Self::read_budget(buf, len, &overrides)?;
        let take = match overrides.elem_count.or(self.def.fixed_size()) {
            Some(count) if count > budget => {
                return Err(Error::not_enough_data("sequence", count, budget));
            }
            Some(count) => count,
            None => budget,
        };
        let bytes: &'b [u8] = *buf;
        let (consumed, rest) = bytes.split_at(take);
        let view = E::view_slice(consumed)
            .ok_or_else(|| Error::invalid_operation("zero-copy view of non-byte elements"))?;
        self.storage = Storage::View(view);
        *buf = rest;
        Ok(())
    }

    fn read_elements(
        &mut self,
        buf: &mut &[u8],
        len: usize,
        overrides: ReadOverrides,
    ) -> Result<()> {
        let mut remaining = Self::read_budget(buf, len, &overrides)?;
        match overrides.elem_count.or(self.def.fixed_size()) {
            Some(count) => {
                if let Some(capacity) = self.storage.capacity() {
                    if count > capacity {
                        return Err(Error::capacity_exceeded("sequence", capacity, count));
                    }
                }
                for _ in 0..count {
                    self.read_element(buf, &mut remaining, overrides.elem_length)?;
                }
            }
            None => {
                while remaining > 0 {
                    if self.read_element(buf, &mut remaining, overrides.elem_length)? == 0 {
                        return Err(Error::invalid_format(
                            "sequence",
                            "element consumed no bytes",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Decodes one element and appends it, returning the number of bytes consumed.
    fn read_element(
        &mut self,
        buf: &mut &[u8],
        remaining: &mut usize,
        elem_length: Option<usize>,
    ) -> Result<usize> {
        if self.storage.is_full() {
            let capacity = self.storage.capacity().unwrap_or_default();
            return Err(Error::capacity_exceeded(
                "sequence",
                capacity,
                self.storage.len() + 1,
            ));
        }

        let mut element = self.new_element();
        let consumed = match elem_length {
            Some(elem_length) => {
                if *remaining < elem_length {
                    return Err(Error::not_enough_data(
                        "sequence element",
                        elem_length,
                        *remaining,
                    ));
                }
                let (mut window, rest) = buf.split_at(elem_length);
                element.read(&mut window, elem_length)?;
                *buf = rest;
                elem_length
            }
            None => {
                let before = buf.len();
                element.read(buf, *remaining)?;
                before - buf.len()
            }
        };
        *remaining = remaining.saturating_sub(consumed);
        self.storage.push(element)?;
        Ok(consumed)
    }

    fn read_element_no_status(&mut self, buf: &mut &[u8], elem_length: Option<usize>) {
        let mut element = self.new_element();
        match elem_length {
            Some(elem_length) => {
                let (mut window, rest) = buf.split_at(elem_length);
                element.read_no_status(&mut window);
                *buf = rest;
            }
            None => element.read_no_status(buf),
        }
        let _ = self.storage.push(element);
    }

    /// A default element, brought to the stored version if there is one.
    fn new_element(&self) -> E {
        let mut element = E::default();
        if let Some(version) = self.version {
            element.set_version(version);
        }
        element
    }

    fn write_elements(&self, out: &mut Vec<u8>, len: usize) -> Result<()> {
        if let Some(count) = self.def.fixed_size() {
            if self.storage.len() > count {
                return Err(Error::capacity_exceeded(
                    "sequence",
                    count,
                    self.storage.len(),
                ));
            }
        }
        if !self.can_write() {
            return Err(Error::invalid_operation("write of an unwritable sequence element"));
        }
        let required = self.length();
        if required > len {
            return Err(Error::buffer_overflow("sequence", required, len));
        }

        let mut remaining = len;
        for element in self.storage.iter() {
            Self::write_element(element, out, &mut remaining)?;
        }
        let padding = self.padding_count();
        if padding > 0 {
            let filler = E::default();
            for _ in 0..padding {
                Self::write_element(&filler, out, &mut remaining)?;
            }
        }
        Ok(())
    }

    fn write_element(element: &E, out: &mut Vec<u8>, remaining: &mut usize) -> Result<()> {
        let length = element.length();
        if length > *remaining {
            return Err(Error::buffer_overflow("sequence element", length, *remaining));
        }
        element.write(out, *remaining)?;
        *remaining -= length;
        Ok(())
    }

    /// Number of default elements appended on write to reach the fixed element count.
    fn padding_count(&self) -> usize {
        self.def
            .fixed_size()
            .map_or(0, |count| count.saturating_sub(self.storage.len()))
    }

    fn fits_fixed_size(&self) -> bool {
        self.def
            .fixed_size()
            .is_none_or(|count| self.storage.len() <= count)
    }
}

impl<E: Element> Default for SequenceField<'_, E> {
    fn default() -> Self {
        SequenceField::new(SequenceDef::dynamic())
    }
}

/// Object-level field interface shared by all field kinds.
///
/// The lifetime is that of the input bytes a field may reference after reading.
pub trait Field<'a> {
    fn read(&mut self, buf: &mut &'a [u8], len: usize) -> Result<()>;

    fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()>;

    fn length(&self) -> usize;

    fn min_length(&self) -> usize;

    fn max_length(&self) -> usize;

    fn valid(&self) -> bool;

    fn can_write(&self) -> bool;

    fn refresh(&mut self) -> bool;

    fn is_version_dependent(&self) -> bool;

    fn set_version(&mut self, version: Version) -> bool;
}

impl<'a, E: Element> Field<'a> for SequenceField<'a, E> {
    fn read(&mut self, buf: &mut &'a [u8], len: usize) -> Result<()> {
        SequenceField::read(self, buf, len)
    }

    fn write(&self, out: &mut Vec<u8>, len: usize) -> Result<()> {
        SequenceField::write(self, out, len)
    }

    fn length(&self) -> usize {
        SequenceField::length(self)
    }

    fn min_length(&self) -> usize {
        SequenceField::min_length(self)
    }

    fn max_length(&self) -> usize {
        SequenceField::max_length(self)
    }

    fn valid(&self) -> bool {
        SequenceField::valid(self)
    }

    fn can_write(&self) -> bool {
        SequenceField::can_write(self)
    }

    fn refresh(&mut self) -> bool {
        SequenceField::refresh(self)
    }

    fn is_version_dependent(&self) -> bool {
        SequenceField::is_version_dependent(self)
    }

    fn set_version(&mut self, version: Version) -> bool {
        SequenceField::set_version(self, version)
    }
}

impl<E: Element> TaggedField for SequenceField<'_, E> {
    const TAG: FieldTag = if E::KIND.is_integral() {
        FieldTag::RawSequence
    } else {
        FieldTag::Sequence
    };
}

impl<'b, E: Element> PartialEq<SequenceField<'b, E>> for SequenceField<'_, E> {
    fn eq(&self, other: &SequenceField<'b, E>) -> bool {
        self.elements() == other.elements()
    }
}

impl<E: Element + Eq> Eq for SequenceField<'_, E> {}

impl<'b, E: Element> PartialOrd<SequenceField<'b, E>> for SequenceField<'_, E> {
    fn partial_cmp(&self, other: &SequenceField<'b, E>) -> Option<Ordering> {
        self.elements().partial_cmp(other.elements())
    }
}

impl<E: Element + Ord> Ord for SequenceField<'_, E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.elements().cmp(other.elements())
    }
}
