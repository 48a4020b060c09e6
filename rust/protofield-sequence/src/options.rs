//! Sequence configuration: the options value object and the generic option table
//! it can be folded from.

use protofield_common::{Result, error::Error};

use crate::element::{Element, Version};
use crate::selector::StorageFlags;
use crate::storage::{CustomStorageFactory, Storage};

/// Hook run by `set_version` after the new version was propagated to every element.
/// Returns `true` if it changed the stored value.
pub type VersionUpdateFn<E> = fn(&mut Storage<'_, E>, Version) -> bool;

/// All options that shape a sequence field.
///
/// Only some combinations are meaningful; [`crate::def::SequenceDef::new`] validates
/// them and rejects the rest before any field instance exists.
#[derive(Debug)]
pub struct SequenceOptions<E: Element> {
    /// Caller-supplied container, wins over every other storage option.
    pub custom_storage: Option<CustomStorageFactory<E>>,

    /// Explicit capacity of a bounded container, independent of the wire element count.
    pub fixed_size_storage: Option<usize>,

    /// Fixed number of elements on the wire. Reads consume exactly this many elements
    /// and writes pad with default elements up to it.
    pub sequence_fixed_size: Option<usize>,

    /// Back the fixed wire element count with a bounded container of exactly that size.
    /// Requires `sequence_fixed_size`.
    pub use_fixed_size_storage: bool,

    /// View the input bytes instead of copying them. Only valid for one-byte
    /// integral elements.
    pub orig_data_view: bool,

    /// Enables `force_read_elem_count`.
    pub elem_count_forcing: bool,

    /// Enables `force_read_length`.
    pub length_forcing: bool,

    /// Enables `force_read_elem_length`.
    pub elem_length_forcing: bool,

    /// Keep the last version passed to `set_version` in the field.
    pub version_storage: bool,

    /// Field-specific version update logic; marks the field as version dependent.
    pub custom_version_update: Option<VersionUpdateFn<E>>,

    /// Fail a read whose decoded content is not `valid()`.
    pub fail_on_invalid: bool,
}

impl<E: Element> SequenceOptions<E> {
    /// Folds a list of option table entries into a value object.
    ///
    /// `Empty` entries are ignored and `Bundle`s are expanded in place. When the same
    /// option appears more than once, the last occurrence wins. Options that belong
    /// to other field kinds are rejected.
    pub fn from_options(options: &[FieldOption<E>]) -> Result<SequenceOptions<E>> {
        let mut result = SequenceOptions::default();
        for option in options {
            result.apply(option)?;
        }
        Ok(result)
    }

    pub fn apply(&mut self, option: &FieldOption<E>) -> Result<()> {
        match option {
            FieldOption::Empty => {}
            FieldOption::Bundle(options) => {
                for option in options {
                    self.apply(option)?;
                }
            }
            FieldOption::CustomStorageType(factory) => self.custom_storage = Some(*factory),
            FieldOption::FixedSizeStorage(capacity) => self.fixed_size_storage = Some(*capacity),
            FieldOption::SequenceFixedSize(count) => self.sequence_fixed_size = Some(*count),
            FieldOption::SequenceFixedSizeUseFixedSizeStorage => {
                self.use_fixed_size_storage = true
            }
            FieldOption::OrigDataView => self.orig_data_view = true,
            FieldOption::SequenceElemCountForcingEnabled => self.elem_count_forcing = true,
            FieldOption::SequenceLengthForcingEnabled => self.length_forcing = true,
            FieldOption::SequenceElemLengthForcingEnabled => self.elem_length_forcing = true,
            FieldOption::VersionStorage => self.version_storage = true,
            FieldOption::CustomVersionUpdate(update) => self.custom_version_update = Some(*update),
            FieldOption::FailOnInvalid => self.fail_on_invalid = true,
            other => {
                return Err(Error::invalid_config(
                    "sequence",
                    format!("option {} is not applicable to a sequence field", other.name()),
                ));
            }
        }
        Ok(())
    }

    /// Returns the storage-related subset of the options.
    pub fn storage_flags(&self) -> StorageFlags {
        StorageFlags {
            has_custom_storage_type: self.custom_storage.is_some(),
            fixed_size_storage: self.fixed_size_storage,
            sequence_fixed_size_storage: if self.use_fixed_size_storage {
                self.sequence_fixed_size
            } else {
                None
            },
            has_orig_data_view: self.orig_data_view,
        }
    }
}

impl<E: Element> Default for SequenceOptions<E> {
    fn default() -> Self {
        SequenceOptions {
            custom_storage: None,
            fixed_size_storage: None,
            sequence_fixed_size: None,
            use_fixed_size_storage: false,
            orig_data_view: false,
            elem_count_forcing: false,
            length_forcing: false,
            elem_length_forcing: false,
            version_storage: false,
            custom_version_update: None,
            fail_on_invalid: false,
        }
    }
}

impl<E: Element> Clone for SequenceOptions<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Element> Copy for SequenceOptions<E> {}

/// An entry of the option table shared by all field kinds.
///
/// Sequence fields accept the storage, fixed-size, forcing and version options;
/// the numeric and presence options further down describe other field kinds and
/// are a configuration violation when given to a sequence.
#[derive(Debug)]
pub enum FieldOption<E: Element> {
    /// No-op placeholder, ignored.
    Empty,
    /// A group of options applied in order.
    Bundle(Vec<FieldOption<E>>),
    CustomStorageType(CustomStorageFactory<E>),
    FixedSizeStorage(usize),
    SequenceFixedSize(usize),
    SequenceFixedSizeUseFixedSizeStorage,
    OrigDataView,
    SequenceElemCountForcingEnabled,
    SequenceLengthForcingEnabled,
    SequenceElemLengthForcingEnabled,
    VersionStorage,
    CustomVersionUpdate(VersionUpdateFn<E>),
    FailOnInvalid,

    NumValueSerOffset(i64),
    FixedLength(usize),
    FixedBitLength(usize),
    VarLength { min: usize, max: usize },
    AvailableLengthLimit,
    ScalingRatio { num: i64, denom: i64 },
    Units(&'static str),
    ValidNumValueRange { min: i64, max: i64 },
    ExistsBetweenVersions { from: Version, until: Version },
    InvalidByDefault,
    MissingOnReadFail,
    MissingOnInvalid,
}

impl<E: Element> FieldOption<E> {
    pub fn name(&self) -> &'static str {
        match self {
            FieldOption::Empty => "Empty",
            FieldOption::Bundle(_) => "Bundle",
            FieldOption::CustomStorageType(_) => "CustomStorageType",
            FieldOption::FixedSizeStorage(_) => "FixedSizeStorage",
            FieldOption::SequenceFixedSize(_) => "SequenceFixedSize",
            FieldOption::SequenceFixedSizeUseFixedSizeStorage => {
                "SequenceFixedSizeUseFixedSizeStorage"
            }
            FieldOption::OrigDataView => "OrigDataView",
            FieldOption::SequenceElemCountForcingEnabled => "SequenceElemCountForcingEnabled",
            FieldOption::SequenceLengthForcingEnabled => "SequenceLengthForcingEnabled",
            FieldOption::SequenceElemLengthForcingEnabled => "SequenceElemLengthForcingEnabled",
            FieldOption::VersionStorage => "VersionStorage",
            FieldOption::CustomVersionUpdate(_) => "CustomVersionUpdate",
            FieldOption::FailOnInvalid => "FailOnInvalid",
            FieldOption::NumValueSerOffset(_) => "NumValueSerOffset",
            FieldOption::FixedLength(_) => "FixedLength",
            FieldOption::FixedBitLength(_) => "FixedBitLength",
            FieldOption::VarLength { .. } => "VarLength",
            FieldOption::AvailableLengthLimit => "AvailableLengthLimit",
            FieldOption::ScalingRatio { .. } => "ScalingRatio",
            FieldOption::Units(_) => "Units",
            FieldOption::ValidNumValueRange { .. } => "ValidNumValueRange",
            FieldOption::ExistsBetweenVersions { .. } => "ExistsBetweenVersions",
            FieldOption::InvalidByDefault => "InvalidByDefault",
            FieldOption::MissingOnReadFail => "MissingOnReadFail",
            FieldOption::MissingOnInvalid => "MissingOnInvalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use protofield_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_fold_options_with_bundles() {
        let options = SequenceOptions::<u8>::from_options(&[
            FieldOption::Empty,
            FieldOption::Bundle(vec![
                FieldOption::SequenceFixedSize(4),
                FieldOption::SequenceFixedSizeUseFixedSizeStorage,
                FieldOption::Bundle(vec![FieldOption::VersionStorage]),
            ]),
            FieldOption::SequenceElemCountForcingEnabled,
        ])
        .unwrap();
        assert_eq!(options.sequence_fixed_size, Some(4));
        assert!(options.use_fixed_size_storage);
        assert!(options.version_storage);
        assert!(options.elem_count_forcing);
        assert!(!options.length_forcing);
        assert_eq!(
            options.storage_flags(),
            StorageFlags {
                sequence_fixed_size_storage: Some(4),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_last_option_wins() {
        let options = SequenceOptions::<u16>::from_options(&[
            FieldOption::FixedSizeStorage(8),
            FieldOption::FixedSizeStorage(2),
        ])
        .unwrap();
        assert_eq!(options.fixed_size_storage, Some(2));
    }

    #[test]
    fn test_numeric_options_rejected() {
        let rejected: Vec<FieldOption<u8>> = vec![
            FieldOption::NumValueSerOffset(1),
            FieldOption::FixedLength(2),
            FieldOption::FixedBitLength(3),
            FieldOption::VarLength { min: 1, max: 4 },
            FieldOption::AvailableLengthLimit,
            FieldOption::ScalingRatio { num: 1, denom: 10 },
            FieldOption::Units("mm"),
            FieldOption::ValidNumValueRange { min: 0, max: 5 },
            FieldOption::ExistsBetweenVersions { from: 1, until: 2 },
            FieldOption::InvalidByDefault,
            FieldOption::MissingOnReadFail,
            FieldOption::MissingOnInvalid,
        ];
        for option in rejected {
            let name = option.name();
            let err = SequenceOptions::from_options(&[FieldOption::Bundle(vec![option])])
                .unwrap_err();
            match err.kind() {
                ErrorKind::InvalidConfiguration { message, .. } => {
                    assert!(message.contains(name), "{message}");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_use_fixed_storage_without_count_has_no_flag() {
        let options = SequenceOptions::<u8> {
            use_fixed_size_storage: true,
            ..Default::default()
        };
        assert_eq!(options.storage_flags(), StorageFlags::default());
    }
}
