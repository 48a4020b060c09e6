//! Validated sequence definitions.

use protofield_common::{Result, error::Error, verify_config};

use crate::element::Element;
use crate::field::SequenceField;
use crate::options::{FieldOption, SequenceOptions};
use crate::selector::{StorageKind, select_storage};
use crate::storage::Storage;

/// A validated sequence field type: its options plus the storage representation
/// resolved for them.
///
/// A definition is built once per field type and is cheap to copy; every field
/// instance carries its own copy. Building the definition is the only place
/// configuration violations are detected, so a field can never be instantiated
/// from an invalid option set.
#[derive(Debug)]
pub struct SequenceDef<E: Element> {
    options: SequenceOptions<E>,
    storage: StorageKind,
}

impl<E: Element> SequenceDef<E> {
    /// Validates `options` and selects the storage representation.
    pub fn new(options: SequenceOptions<E>) -> Result<SequenceDef<E>> {
        verify_config!(
            "sequence",
            !options.orig_data_view || E::KIND.is_single_byte_integral(),
            "zero-copy view is allowed only for one-byte integral elements"
        );
        verify_config!(
            "sequence",
            !options.use_fixed_size_storage || options.sequence_fixed_size.is_some(),
            "fixed-size storage for the fixed element count requires a fixed element count"
        );

        if let Some(count) = options.sequence_fixed_size {
            if count.checked_mul(E::max_length()).is_none() {
                return Err(Error::invalid_config(
                    "sequence",
                    format!("fixed element count {count} overflows the serialized length"),
                ));
            }
        }

        let storage = select_storage(&options.storage_flags(), E::KIND);

        if let (StorageKind::FixedCapacity { capacity }, Some(count)) =
            (storage, options.sequence_fixed_size)
        {
            if count > capacity {
                return Err(Error::invalid_config(
                    "sequence",
                    format!("fixed element count {count} exceeds storage capacity {capacity}"),
                ));
            }
        }
        verify_config!(
            "sequence",
            storage != StorageKind::ZeroCopyView || !options.elem_length_forcing,
            "per-element length forcing cannot be combined with a zero-copy view"
        );

        log::debug!("sequence of {:?} uses {} storage", E::KIND, storage);
        Ok(SequenceDef { options, storage })
    }

    /// Folds an option table and validates the result.
    pub fn from_options(options: &[FieldOption<E>]) -> Result<SequenceDef<E>> {
        SequenceDef::new(SequenceOptions::from_options(options)?)
    }

    /// Definition with no options: greedy reads into a dynamic buffer.
    pub fn dynamic() -> SequenceDef<E> {
        SequenceDef {
            options: SequenceOptions::default(),
            storage: StorageKind::Dynamic,
        }
    }

    #[inline]
    pub fn options(&self) -> &SequenceOptions<E> {
        &self.options
    }

    #[inline]
    pub fn storage_kind(&self) -> StorageKind {
        self.storage
    }

    /// The fixed number of elements on the wire, if configured.
    #[inline]
    pub fn fixed_size(&self) -> Option<usize> {
        self.options.sequence_fixed_size
    }

    /// Creates an empty container of the selected representation.
    pub fn empty_storage<'a>(&self) -> Storage<'a, E> {
        Storage::empty(self.storage, self.options.custom_storage)
    }

    /// Creates a field instance with empty storage.
    pub fn field<'a>(&self) -> SequenceField<'a, E> {
        SequenceField::new(*self)
    }

    /// Minimal serialized length of any field of this definition.
    pub fn min_length(&self) -> usize {
        match self.fixed_size() {
            Some(count) => count.saturating_mul(E::min_length()),
            None => 0,
        }
    }

    /// Maximal serialized length of any field of this definition.
    ///
    /// Unbounded sequences report `usize::MAX`.
    pub fn max_length(&self) -> usize {
        let count = self.fixed_size().or(self.storage.capacity());
        match count {
            Some(count) => count.saturating_mul(E::max_length()),
            None => usize::MAX,
        }
    }

    pub fn is_version_dependent(&self) -> bool {
        self.options.custom_version_update.is_some() || E::is_version_dependent()
    }

    pub fn has_non_default_refresh(&self) -> bool {
        E::has_non_default_refresh()
    }

    /// Whether [`SequenceField::read_no_status`] is usable for this definition.
    pub fn has_read_no_status(&self) -> bool {
        !self.options.length_forcing && E::has_read_no_status()
    }

    pub fn has_write_no_status(&self) -> bool {
        E::has_write_no_status()
    }
}

impl<E: Element> Clone for SequenceDef<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Element> Copy for SequenceDef<E> {}

impl<E: Element> Default for SequenceDef<E> {
    fn default() -> Self {
        SequenceDef::dynamic()
    }
}

#[cfg(test)]
mod tests {
    use protofield_common::error::ErrorStatus;

    use super::*;
    use crate::storage::{BoundedVec, CustomStorage};

    fn bounded_custom() -> Box<dyn CustomStorage<u16>> {
        Box::new(BoundedVec::<u16>::new(3))
    }

    #[test]
    fn test_default_definition() {
        let def = SequenceDef::<u8>::default();
        assert_eq!(def.storage_kind(), StorageKind::Dynamic);
        assert_eq!(def.min_length(), 0);
        assert_eq!(def.max_length(), usize::MAX);
        assert!(!def.is_version_dependent());
        assert!(def.has_read_no_status());
    }

    #[test]
    fn test_view_rejected_for_wide_elements() {
        let err = SequenceDef::<u16>::from_options(&[FieldOption::OrigDataView]).unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidConfiguration);

        // Rejected even when another storage option would win the selection.
        let err = SequenceDef::<u32>::from_options(&[
            FieldOption::FixedSizeStorage(4),
            FieldOption::OrigDataView,
        ])
        .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidConfiguration);

        let def = SequenceDef::<u8>::from_options(&[FieldOption::OrigDataView]).unwrap();
        assert_eq!(def.storage_kind(), StorageKind::ZeroCopyView);
    }

    #[test]
    fn test_fixed_storage_requires_fixed_count() {
        let err =
            SequenceDef::<u8>::from_options(&[FieldOption::SequenceFixedSizeUseFixedSizeStorage])
                .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidConfiguration);

        let def = SequenceDef::<u8>::from_options(&[
            FieldOption::SequenceFixedSize(6),
            FieldOption::SequenceFixedSizeUseFixedSizeStorage,
        ])
        .unwrap();
        assert_eq!(def.storage_kind(), StorageKind::FixedSize { count: 6 });
        assert_eq!(def.min_length(), 6);
        assert_eq!(def.max_length(), 6);
    }

    #[test]
    fn test_fixed_count_must_fit_capacity() {
        let err = SequenceDef::<u16>::from_options(&[
            FieldOption::FixedSizeStorage(2),
            FieldOption::SequenceFixedSize(3),
        ])
        .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidConfiguration);

        let def = SequenceDef::<u16>::from_options(&[
            FieldOption::FixedSizeStorage(4),
            FieldOption::SequenceFixedSize(3),
        ])
        .unwrap();
        assert_eq!(def.storage_kind(), StorageKind::FixedCapacity { capacity: 4 });
        assert_eq!(def.min_length(), 6);
        assert_eq!(def.max_length(), 6);
    }

    #[test]
    fn test_fixed_count_length_must_be_representable() {
        let err = SequenceDef::<u16>::from_options(&[FieldOption::SequenceFixedSize(
            usize::MAX / 2 + 1,
        )])
        .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidConfiguration);

        let def =
            SequenceDef::<u16>::from_options(&[FieldOption::SequenceFixedSize(usize::MAX / 2)])
                .unwrap();
        assert_eq!(def.min_length(), usize::MAX - 1);
        assert_eq!(def.max_length(), usize::MAX - 1);
    }

    #[test]
    fn test_huge_capacity_accepted() {
        let def =
            SequenceDef::<u16>::from_options(&[FieldOption::FixedSizeStorage(usize::MAX)]).unwrap();
        assert_eq!(
            def.storage_kind(),
            StorageKind::FixedCapacity {
                capacity: usize::MAX
            }
        );
        let mut field = def.field();
        field.assign([1, 2]).unwrap();
        assert_eq!(field.value().capacity(), Some(usize::MAX));
        assert_eq!(def.max_length(), usize::MAX);
    }

    #[test]
    fn test_view_excludes_elem_length_forcing() {
        let err = SequenceDef::<u8>::from_options(&[
            FieldOption::OrigDataView,
            FieldOption::SequenceElemLengthForcingEnabled,
        ])
        .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::InvalidConfiguration);

        // Without the view the combination is fine.
        let def = SequenceDef::<u8>::from_options(&[
            FieldOption::FixedSizeStorage(10),
            FieldOption::OrigDataView,
            FieldOption::SequenceElemLengthForcingEnabled,
        ])
        .unwrap();
        assert_eq!(def.storage_kind(), StorageKind::FixedCapacity { capacity: 10 });
        assert_eq!(def.max_length(), 10);
    }

    #[test]
    fn test_custom_storage_definition() {
        let def =
            SequenceDef::<u16>::from_options(&[FieldOption::CustomStorageType(bounded_custom)])
                .unwrap();
        assert_eq!(def.storage_kind(), StorageKind::Custom);
        let storage = def.empty_storage();
        assert_eq!(storage.capacity(), Some(3));
    }

    #[test]
    fn test_version_dependence_from_hook() {
        fn hook(_: &mut Storage<'_, u8>, _: u32) -> bool {
            false
        }
        let def = SequenceDef::<u8>::from_options(&[FieldOption::CustomVersionUpdate(hook)])
            .unwrap();
        assert!(def.is_version_dependent());
    }

    #[test]
    fn test_length_forcing_disables_read_no_status() {
        let def =
            SequenceDef::<u8>::from_options(&[FieldOption::SequenceLengthForcingEnabled]).unwrap();
        assert!(!def.has_read_no_status());
        assert!(def.has_write_no_status());
    }
}
