//! In-memory representations of a sequence's elements.
//!
//! Exactly one representation is used by all instances of a given sequence
//! definition; see [`crate::selector`] for how it is chosen.

use std::cmp::Ordering;
use std::fmt;

use protofield_common::{Result, error::Error};
use tinyvec::{Array, ArrayVec};

use crate::element::Element;
use crate::selector::StorageKind;

/// A caller-supplied element container.
///
/// Implementations provide the same contract as the built-in representations:
/// ordered append, contiguous access and an optional capacity bound.
pub trait CustomStorage<E>: fmt::Debug {
    fn as_slice(&self) -> &[E];

    fn as_mut_slice(&mut self) -> &mut [E];

    /// Appends an element. Bounded containers must reject growth past their
    /// capacity with a `CapacityExceeded` error rather than dropping data.
    fn push(&mut self, element: E) -> Result<()>;

    fn truncate(&mut self, len: usize);

    /// Maximal number of elements, or `None` if the container is unbounded.
    fn capacity(&self) -> Option<usize> {
        None
    }

    fn clone_boxed(&self) -> Box<dyn CustomStorage<E>>;
}

/// Creates an empty instance of a custom container.
pub type CustomStorageFactory<E> = fn() -> Box<dyn CustomStorage<E>>;

/// A contiguous element buffer that never grows past a capacity chosen at runtime.
///
/// Memory grows with the stored elements, so the capacity is only a bound and may
/// be arbitrarily large; pushing into a full buffer fails. For capacities known at
/// compile time, `tinyvec::ArrayVec` plugs in as a [`CustomStorage`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundedVec<E> {
    items: Vec<E>,
    capacity: usize,
}

impl<E> BoundedVec<E> {
    /// Creates an empty buffer able to hold exactly `capacity` elements.
    pub fn new(capacity: usize) -> BoundedVec<E> {
        BoundedVec {
            items: Vec::new(),
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.items.len()
    }

    pub fn push(&mut self, element: E) -> Result<()> {
        if self.is_full() {
            return Err(Error::capacity_exceeded(
                "bounded storage",
                self.capacity,
                self.items.len() + 1,
            ));
        }
        self.items.push(element);
        Ok(())
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.items
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [E] {
        &mut self.items
    }

    pub fn into_vec(self) -> Vec<E> {
        self.items
    }
}

impl<E: Clone> BoundedVec<E> {
    /// Creates a buffer with the given capacity holding a copy of `items`.
    pub fn from_slice(capacity: usize, items: &[E]) -> Result<BoundedVec<E>> {
        if items.len() > capacity {
            return Err(Error::capacity_exceeded(
                "bounded storage",
                capacity,
                items.len(),
            ));
        }
        Ok(BoundedVec {
            items: items.to_vec(),
            capacity,
        })
    }

    /// Resizes to `new_len`, padding with `value` when growing.
    pub fn resize(&mut self, new_len: usize, value: E) -> Result<()> {
        if new_len > self.capacity {
            return Err(Error::capacity_exceeded(
                "bounded storage",
                self.capacity,
                new_len,
            ));
        }
        self.items.resize(new_len, value);
        Ok(())
    }
}

impl<E> std::ops::Deref for BoundedVec<E> {
    type Target = [E];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<E: Clone + fmt::Debug + 'static> CustomStorage<E> for Vec<E> {
    fn as_slice(&self) -> &[E] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [E] {
        self
    }

    fn push(&mut self, element: E) -> Result<()> {
        Vec::push(self, element);
        Ok(())
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len);
    }

    fn clone_boxed(&self) -> Box<dyn CustomStorage<E>> {
        Box::new(self.clone())
    }
}

impl<E: Clone + fmt::Debug + 'static> CustomStorage<E> for BoundedVec<E> {
    fn as_slice(&self) -> &[E] {
        BoundedVec::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [E] {
        BoundedVec::as_mut_slice(self)
    }

    fn push(&mut self, element: E) -> Result<()> {
        BoundedVec::push(self, element)
    }

    fn truncate(&mut self, len: usize) {
        BoundedVec::truncate(self, len);
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn clone_boxed(&self) -> Box<dyn CustomStorage<E>> {
        Box::new(self.clone())
    }
}

/// Inline storage with a compile-time capacity, e.g. `ArrayVec<[u16; 8]>`.
impl<E, A> CustomStorage<E> for ArrayVec<A>
where
    E: Clone + fmt::Debug + 'static,
    A: Array<Item = E> + Clone + 'static,
{
    fn as_slice(&self) -> &[E] {
        ArrayVec::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [E] {
        ArrayVec::as_mut_slice(self)
    }

    fn push(&mut self, element: E) -> Result<()> {
        match self.try_push(element) {
            None => Ok(()),
            Some(_) => Err(Error::capacity_exceeded(
                "inline storage",
                A::CAPACITY,
                self.len() + 1,
            )),
        }
    }

    fn truncate(&mut self, len: usize) {
        ArrayVec::truncate(self, len);
    }

    fn capacity(&self) -> Option<usize> {
        Some(A::CAPACITY)
    }

    fn clone_boxed(&self) -> Box<dyn CustomStorage<E>> {
        Box::new(self.clone())
    }
}

/// The element container owned (or viewed) by a sequence field.
///
/// - `Custom`: a caller-supplied container.
/// - `FixedCapacity`: bounded buffer sized by an explicit storage capacity.
/// - `FixedSize`: bounded buffer sized exactly to the fixed wire element count.
/// - `View`: non-owning view over the bytes the field was read from. The viewed
///   buffer must outlive the field; the field never copies or frees it.
/// - `Dynamic`: growable owning buffer, the default.
#[derive(Debug)]
pub enum Storage<'a, E: Element> {
    Custom(Box<dyn CustomStorage<E>>),
    FixedCapacity(BoundedVec<E>),
    FixedSize(BoundedVec<E>),
    View(&'a [E]),
    Dynamic(Vec<E>),
}

impl<'a, E: Element> Storage<'a, E> {
    /// Creates an empty container of the given kind.
    ///
    /// `custom` is consulted only for [`StorageKind::Custom`]; without a factory
    /// an unbounded `Vec` is used.
    pub fn empty(kind: StorageKind, custom: Option<CustomStorageFactory<E>>) -> Self {
        match kind {
            StorageKind::Custom => match custom {
                Some(factory) => Storage::Custom(factory()),
                None => Storage::Custom(Box::new(Vec::<E>::new())),
            },
            StorageKind::FixedCapacity { capacity } => {
                Storage::FixedCapacity(BoundedVec::new(capacity))
            }
            StorageKind::FixedSize { count } => Storage::FixedSize(BoundedVec::new(count)),
            StorageKind::ZeroCopyView => Storage::View(Default::default()),
            StorageKind::Dynamic => Storage::Dynamic(Vec::new()),
        }
    }

    /// Returns the representation of this container.
    pub fn kind(&self) -> StorageKind {
        match self {
            Storage::Custom(_) => StorageKind::Custom,
            Storage::FixedCapacity(vec) => StorageKind::FixedCapacity {
                capacity: vec.capacity(),
            },
            Storage::FixedSize(vec) => StorageKind::FixedSize {
                count: vec.capacity(),
            },
            Storage::View(_) => StorageKind::ZeroCopyView,
            Storage::Dynamic(_) => StorageKind::Dynamic,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[E] {
        match self {
            Storage::Custom(storage) => storage.as_slice(),
            Storage::FixedCapacity(vec) | Storage::FixedSize(vec) => vec.as_slice(),
            Storage::View(view) => view,
            Storage::Dynamic(vec) => vec.as_slice(),
        }
    }

    /// Returns the elements for in-place mutation, or `None` for a view, which
    /// never mutates the bytes it references.
    pub fn as_mut_slice(&mut self) -> Option<&mut [E]> {
        match self {
            Storage::Custom(storage) => Some(storage.as_mut_slice()),
            Storage::FixedCapacity(vec) | Storage::FixedSize(vec) => Some(vec.as_mut_slice()),
            Storage::View(_) => None,
            Storage::Dynamic(vec) => Some(vec.as_mut_slice()),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.as_slice().iter()
    }

    /// Maximal number of elements, `None` for unbounded containers.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Storage::Custom(storage) => storage.capacity(),
            Storage::FixedCapacity(vec) | Storage::FixedSize(vec) => Some(vec.capacity()),
            Storage::View(_) | Storage::Dynamic(_) => None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.capacity().is_some_and(|capacity| self.len() >= capacity)
    }

    #[inline]
    pub fn is_view(&self) -> bool {
        matches!(self, Storage::View(_))
    }

    pub fn push(&mut self, element: E) -> Result<()> {
        match self {
            Storage::Custom(storage) => storage.push(element),
            Storage::FixedCapacity(vec) | Storage::FixedSize(vec) => vec.push(element),
            Storage::View(_) => Err(Error::invalid_operation("push into a zero-copy view")),
            Storage::Dynamic(vec) => {
                vec.push(element);
                Ok(())
            }
        }
    }

    /// Appends every element of `items`, stopping at the first rejected one.
    pub fn extend<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = E>,
    {
        for item in items {
            self.push(item)?;
        }
        Ok(())
    }

    pub fn truncate(&mut self, len: usize) {
        match self {
            Storage::Custom(storage) => storage.truncate(len),
            Storage::FixedCapacity(vec) | Storage::FixedSize(vec) => vec.truncate(len),
            Storage::View(view) => {
                let current: &'a [E] = *view;
                *view = &current[..len.min(current.len())];
            }
            Storage::Dynamic(vec) => vec.truncate(len),
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes to `new_len` elements, padding with default elements when growing.
    ///
    /// A view can only shrink.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        let len = self.len();
        if new_len <= len {
            self.truncate(new_len);
            return Ok(());
        }
        if let Some(capacity) = self.capacity() {
            if new_len > capacity {
                return Err(Error::capacity_exceeded("storage", capacity, new_len));
            }
        }
        for _ in len..new_len {
            self.push(E::default())?;
        }
        Ok(())
    }
}

impl<E: Element> Clone for Storage<'_, E> {
    fn clone(&self) -> Self {
        match self {
            Storage::Custom(storage) => Storage::Custom(storage.clone_boxed()),
            Storage::FixedCapacity(vec) => Storage::FixedCapacity(vec.clone()),
            Storage::FixedSize(vec) => Storage::FixedSize(vec.clone()),
            Storage::View(view) => Storage::View(*view),
            Storage::Dynamic(vec) => Storage::Dynamic(vec.clone()),
        }
    }
}

impl<E: Element> Default for Storage<'_, E> {
    fn default() -> Self {
        Storage::Dynamic(Vec::new())
    }
}

impl<E: Element> From<Vec<E>> for Storage<'_, E> {
    fn from(vec: Vec<E>) -> Self {
        Storage::Dynamic(vec)
    }
}

impl<'a, E: Element> From<&'a [E]> for Storage<'a, E> {
    fn from(view: &'a [E]) -> Self {
        Storage::View(view)
    }
}

impl<'s, E: Element> IntoIterator for &'s Storage<'_, E> {
    type Item = &'s E;
    type IntoIter = std::slice::Iter<'s, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'b, E: Element> PartialEq<Storage<'b, E>> for Storage<'_, E> {
    fn eq(&self, other: &Storage<'b, E>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<E: Element + Eq> Eq for Storage<'_, E> {}

impl<'b, E: Element> PartialOrd<Storage<'b, E>> for Storage<'_, E> {
    fn partial_cmp(&self, other: &Storage<'b, E>) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<E: Element + Ord> Ord for Storage<'_, E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}
