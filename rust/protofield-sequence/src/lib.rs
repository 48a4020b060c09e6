//! Sequence fields for binary protocol messages.
//!
//! A sequence field holds a run of homogeneous elements, either raw integral values
//! or nested fields, and encodes them back to back without any framing of its own.
//! Framing (length or count prefixes, terminators) belongs to the enclosing field,
//! which communicates it through one-shot read overrides.
//!
//! # Main Components
//!
//! - [`element::Element`]: the capability set a stored item must provide. Implemented
//!   for the fixed-width integers (big-endian on the wire) and by nested fields.
//! - [`options::SequenceOptions`] / [`options::FieldOption`]: the configuration, as
//!   a plain value object or as a table of generic field options.
//! - [`def::SequenceDef`]: a validated definition. Building it rejects inconsistent
//!   option sets and selects the storage representation through
//!   [`selector::select_storage`].
//! - [`storage::Storage`]: the container a field owns (or, for one-byte integral
//!   elements, a zero-copy view over the input bytes).
//! - [`field::SequenceField`]: read/write with forcing overrides, validity, refresh
//!   and version handling.
//!
//! # Example
//!
//! ```
//! use protofield_sequence::{FieldOption, SequenceDef};
//!
//! let def = SequenceDef::<u16>::from_options(&[FieldOption::SequenceFixedSize(3)]).unwrap();
//! let mut field = def.field();
//! field.assign([1, 2]).unwrap();
//!
//! let mut out = Vec::new();
//! field.write(&mut out, 16).unwrap();
//! assert_eq!(out, [0, 1, 0, 2, 0, 0]);
//! ```

pub mod def;
pub mod element;
pub mod field;
pub mod options;
pub mod selector;
pub mod storage;
pub mod tag;

#[cfg(test)]
mod test_elements;

pub use def::SequenceDef;
pub use element::{Element, ElementKind, Version};
pub use field::{Field, SequenceField};
pub use options::{FieldOption, SequenceOptions};
pub use selector::{StorageFlags, StorageKind, select_storage};
pub use storage::{BoundedVec, CustomStorage, Storage};
pub use tag::{FieldTag, TaggedField, is_sequence_field};
