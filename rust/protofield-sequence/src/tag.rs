//! Compile-time field kind tags.

/// Kind tag carried by every field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    /// A sequence of raw integral values.
    RawSequence,
    /// A sequence of nested fields.
    Sequence,
    /// Any field that is not a sequence.
    Other,
}

impl FieldTag {
    pub const fn is_sequence(&self) -> bool {
        matches!(self, FieldTag::RawSequence | FieldTag::Sequence)
    }
}

/// A field type with a compile-time kind tag.
pub trait TaggedField {
    const TAG: FieldTag;
}

/// Returns `true` if `F` is a sequence field of either tag.
pub const fn is_sequence_field<F: TaggedField + ?Sized>() -> bool {
    F::TAG.is_sequence()
}
