//! Storage selection: maps a sequence definition's storage options and the
//! element's kind to exactly one in-memory representation.
//!
//! Resolution order, first match wins:
//! 1. a custom storage type;
//! 2. an explicit fixed storage capacity;
//! 3. a fixed wire element count backed by fixed storage;
//! 4. a zero-copy view, only for one-byte integral elements;
//! 5. the growable dynamic buffer.
//!
//! The selection runs once, when a [`crate::def::SequenceDef`] is built, and is a
//! `const fn` so it can also be evaluated at compile time.

use crate::element::ElementKind;

/// The storage-related subset of a sequence's options.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageFlags {
    /// A caller-supplied container type is configured.
    pub has_custom_storage_type: bool,
    /// Explicit fixed storage capacity, independent of the wire element count.
    pub fixed_size_storage: Option<usize>,
    /// Fixed wire element count that must also be backed by fixed storage.
    pub sequence_fixed_size_storage: Option<usize>,
    /// Zero-copy viewing of the input bytes is enabled.
    pub has_orig_data_view: bool,
}

/// The representation resolved for a sequence definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Custom,
    FixedCapacity { capacity: usize },
    FixedSize { count: usize },
    ZeroCopyView,
    Dynamic,
}

impl StorageKind {
    /// Maximal element count of the built-in bounded representations.
    ///
    /// Custom storage reports its bound only at runtime, so `None` here.
    pub const fn capacity(&self) -> Option<usize> {
        match self {
            StorageKind::FixedCapacity { capacity } => Some(*capacity),
            StorageKind::FixedSize { count } => Some(*count),
            _ => None,
        }
    }

    pub const fn is_bounded(&self) -> bool {
        self.capacity().is_some()
    }

    /// `false` only for the zero-copy view, which references caller-owned bytes.
    pub const fn is_owning(&self) -> bool {
        !matches!(self, StorageKind::ZeroCopyView)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            StorageKind::Custom => "custom",
            StorageKind::FixedCapacity { .. } => "fixed-capacity",
            StorageKind::FixedSize { .. } => "fixed-size",
            StorageKind::ZeroCopyView => "zero-copy-view",
            StorageKind::Dynamic => "dynamic",
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.capacity() {
            Some(capacity) => write!(f, "{}[{}]", self.name(), capacity),
            None => f.write_str(self.name()),
        }
    }
}

/// Selects the storage representation for the given flags and element kind.
///
/// This is a pure decision; rejecting invalid combinations (e.g. a zero-copy view
/// requested for wide elements) is done by [`crate::def::SequenceDef::new`].
pub const fn select_storage(flags: &StorageFlags, element: ElementKind) -> StorageKind {
    if flags.has_custom_storage_type {
        return StorageKind::Custom;
    }
    if let Some(capacity) = flags.fixed_size_storage {
        return StorageKind::FixedCapacity { capacity };
    }
    if let Some(count) = flags.sequence_fixed_size_storage {
        return StorageKind::FixedSize { count };
    }
    if flags.has_orig_data_view && element.is_single_byte_integral() {
        return StorageKind::ZeroCopyView;
    }
    StorageKind::Dynamic
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPACITY: usize = 16;
    const FIXED_COUNT: usize = 5;

    const ELEMENT_KINDS: [ElementKind; 3] = [
        ElementKind::Integral { width: 1 },
        ElementKind::Integral { width: 4 },
        ElementKind::Composite,
    ];

    fn flags_from_bits(bits: u8) -> StorageFlags {
        StorageFlags {
            has_custom_storage_type: bits & 0b0001 != 0,
            fixed_size_storage: (bits & 0b0010 != 0).then_some(CAPACITY),
            sequence_fixed_size_storage: (bits & 0b0100 != 0).then_some(FIXED_COUNT),
            has_orig_data_view: bits & 0b1000 != 0,
        }
    }

    #[test]
    fn test_selection_is_deterministic_for_all_combinations() {
        for bits in 0u8..16 {
            let flags = flags_from_bits(bits);
            for element in ELEMENT_KINDS {
                let expected = if bits & 0b0001 != 0 {
                    StorageKind::Custom
                } else if bits & 0b0010 != 0 {
                    StorageKind::FixedCapacity { capacity: CAPACITY }
                } else if bits & 0b0100 != 0 {
                    StorageKind::FixedSize { count: FIXED_COUNT }
                } else if bits & 0b1000 != 0 && matches!(element, ElementKind::Integral { width: 1 }) {
                    StorageKind::ZeroCopyView
                } else {
                    StorageKind::Dynamic
                };
                let selected = select_storage(&flags, element);
                assert_eq!(selected, expected, "flags {bits:#06b}, element {element:?}");
                assert_eq!(select_storage(&flags, element), selected);
            }
        }
    }

    #[test]
    fn test_custom_storage_always_wins() {
        let flags = StorageFlags {
            has_custom_storage_type: true,
            fixed_size_storage: Some(4),
            sequence_fixed_size_storage: Some(4),
            has_orig_data_view: true,
        };
        for element in ELEMENT_KINDS {
            assert_eq!(select_storage(&flags, element), StorageKind::Custom);
        }
    }

    #[test]
    fn test_explicit_capacity_beats_fixed_count() {
        let flags = StorageFlags {
            fixed_size_storage: Some(32),
            sequence_fixed_size_storage: Some(8),
            ..Default::default()
        };
        let kind = select_storage(&flags, ElementKind::Composite);
        assert_eq!(kind, StorageKind::FixedCapacity { capacity: 32 });
        assert_eq!(kind.capacity(), Some(32));
    }

    #[test]
    fn test_view_only_for_single_bytes() {
        let flags = StorageFlags {
            has_orig_data_view: true,
            ..Default::default()
        };
        assert_eq!(
            select_storage(&flags, ElementKind::Integral { width: 1 }),
            StorageKind::ZeroCopyView
        );
        assert_eq!(
            select_storage(&flags, ElementKind::Integral { width: 2 }),
            StorageKind::Dynamic
        );
        assert_eq!(
            select_storage(&flags, ElementKind::Composite),
            StorageKind::Dynamic
        );
    }

    #[test]
    fn test_const_evaluation() {
        const KIND: StorageKind = select_storage(
            &StorageFlags {
                has_custom_storage_type: false,
                fixed_size_storage: None,
                sequence_fixed_size_storage: Some(3),
                has_orig_data_view: false,
            },
            ElementKind::Integral { width: 1 },
        );
        assert_eq!(KIND, StorageKind::FixedSize { count: 3 });
        assert!(KIND.is_bounded());
        assert!(KIND.is_owning());
        assert!(!StorageKind::ZeroCopyView.is_owning());
        assert_eq!(KIND.to_string(), "fixed-size[3]");
    }
}
