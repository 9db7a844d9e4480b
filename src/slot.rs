//! Writable injection targets
//!
//! A [`Slot`] wraps a mutable reference to a field (or a whole value) and
//! knows how to write a registered entry into it. The shape of the slot
//! decides what `api`, `val` and `key` can do with the field:
//!
//! | field type              | slot           | shared (`api`/`key`) | copy (`val`)          |
//! |-------------------------|----------------|----------------------|-----------------------|
//! | `T`, `Box<T>`           | [`ValueSlot`]  | clone of the value   | clone of the value    |
//! | `Option<Box<T>>`        | [`BoxedSlot`]  | new box              | allocate, then write  |
//! | `Option<Arc<T>>`        | [`ArcSlot`]    | the registry's `Arc` | allocate, then write  |
//! | `Option<Arc<dyn Trait>>`| [`SharedSlot`] | the registry's `Arc` | not supported         |
//!
//! Writes return `false` when the entry's stored type does not fit the slot;
//! the field is then left as it was.

use crate::storage::AnyArc;
use crate::TypeKey;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A location that can receive a registered entry.
pub trait Slot {
    /// Key looked up for `api` and `val` directives.
    fn type_key(&self) -> TypeKey;

    /// Declared type of the location, for diagnostics.
    fn declared_type(&self) -> &'static str;

    /// Point an unset pointer slot at a default-valued pointee.
    fn allocate(&mut self) {}

    /// Assign the entry as-is (`api`, `key`).
    fn share(&mut self, value: &AnyArc) -> bool;

    /// Write a copy of the entry's pointee (`val`).
    fn copy_from(&mut self, value: &AnyArc) -> bool;
}

/// The registered `T`, whether it was stored directly or behind `Arc`/`Box`.
fn pointee<T: Any>(value: &AnyArc) -> Option<&T> {
    value
        .downcast_ref::<T>()
        .or_else(|| value.downcast_ref::<Arc<T>>().map(|arc| &**arc))
        .or_else(|| value.downcast_ref::<Box<T>>().map(|boxed| &**boxed))
}

/// A plain value location.
pub struct ValueSlot<'a, T>(&'a mut T);

impl<'a, T> ValueSlot<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    #[inline]
    pub fn new(target: &'a mut T) -> Self {
        Self(target)
    }
}

impl<T> Slot for ValueSlot<'_, T>
where
    T: Clone + Send + Sync + 'static,
{
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn declared_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn share(&mut self, value: &AnyArc) -> bool {
        self.copy_from(value)
    }

    fn copy_from(&mut self, value: &AnyArc) -> bool {
        match pointee::<T>(value) {
            Some(v) => {
                *self.0 = v.clone();
                true
            }
            None => false,
        }
    }
}

/// A nullable owning pointer: `Option<Box<T>>`.
pub struct BoxedSlot<'a, T>(&'a mut Option<Box<T>>);

impl<'a, T> BoxedSlot<'a, T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    #[inline]
    pub fn new(target: &'a mut Option<Box<T>>) -> Self {
        Self(target)
    }
}

impl<T> Slot for BoxedSlot<'_, T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn declared_type(&self) -> &'static str {
        type_name::<Option<Box<T>>>()
    }

    fn allocate(&mut self) {
        self.0.get_or_insert_with(Box::default);
    }

    fn share(&mut self, value: &AnyArc) -> bool {
        match pointee::<T>(value) {
            Some(v) => {
                *self.0 = Some(Box::new(v.clone()));
                true
            }
            None => false,
        }
    }

    fn copy_from(&mut self, value: &AnyArc) -> bool {
        match pointee::<T>(value) {
            Some(v) => {
                **self.0.get_or_insert_with(Box::default) = v.clone();
                true
            }
            None => false,
        }
    }
}

/// A nullable shared pointer to a concrete type: `Option<Arc<T>>`.
pub struct ArcSlot<'a, T>(&'a mut Option<Arc<T>>);

impl<'a, T> ArcSlot<'a, T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    #[inline]
    pub fn new(target: &'a mut Option<Arc<T>>) -> Self {
        Self(target)
    }
}

impl<T> Slot for ArcSlot<'_, T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn declared_type(&self) -> &'static str {
        type_name::<Option<Arc<T>>>()
    }

    fn allocate(&mut self) {
        self.0.get_or_insert_with(Arc::default);
    }

    fn share(&mut self, value: &AnyArc) -> bool {
        let shared = match Arc::clone(value).downcast::<T>() {
            Ok(arc) => arc,
            Err(value) => match value.downcast_ref::<Arc<T>>() {
                Some(arc) => Arc::clone(arc),
                None => return false,
            },
        };
        *self.0 = Some(shared);
        true
    }

    fn copy_from(&mut self, value: &AnyArc) -> bool {
        match pointee::<T>(value) {
            Some(v) => {
                let arc = self.0.get_or_insert_with(Arc::default);
                *Arc::make_mut(arc) = v.clone();
                true
            }
            None => false,
        }
    }
}

/// A nullable shared pointer to an interface: `Option<Arc<dyn Trait>>`.
///
/// Only receives entries as-is; trait objects have no copy semantics.
pub struct SharedSlot<'a, I: ?Sized>(&'a mut Option<Arc<I>>);

impl<'a, I> SharedSlot<'a, I>
where
    I: ?Sized + Send + Sync + 'static,
{
    #[inline]
    pub fn new(target: &'a mut Option<Arc<I>>) -> Self {
        Self(target)
    }
}

impl<I> Slot for SharedSlot<'_, I>
where
    I: ?Sized + Send + Sync + 'static,
{
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<I>()
    }

    fn declared_type(&self) -> &'static str {
        type_name::<Option<Arc<I>>>()
    }

    fn share(&mut self, value: &AnyArc) -> bool {
        match value.downcast_ref::<Arc<I>>() {
            Some(arc) => {
                *self.0 = Some(Arc::clone(arc));
                true
            }
            None => false,
        }
    }

    fn copy_from(&mut self, _value: &AnyArc) -> bool {
        false
    }
}

/// An annotated field of a field-mode target.
pub struct Field<'a> {
    name: &'static str,
    tag: &'static str,
    slot: Box<dyn Slot + 'a>,
}

impl<'a> Field<'a> {
    /// Describe a field: its name, raw tag text, and where to write.
    #[inline]
    pub fn new(name: &'static str, tag: &'static str, slot: impl Slot + 'a) -> Self {
        Self {
            name,
            tag,
            slot: Box::new(slot),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw tag text, unparsed.
    #[inline]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    #[inline]
    pub fn slot(&mut self) -> &mut (dyn Slot + 'a) {
        &mut *self.slot
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("type", &self.slot.declared_type())
            .finish()
    }
}
