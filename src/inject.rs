//! Field metadata for field-mode targets
//!
//! [`Inject`] is the reflection hook: it lists a structure's annotated
//! fields in declaration order. It is normally generated with
//! `#[derive(Inject)]`, but writing it by hand is straightforward:
//!
//! ```rust
//! use field_injector::{Field, Inject, SharedSlot, ValueSlot};
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {}
//!
//! #[derive(Default)]
//! struct Scheduler {
//!     clock: Option<Arc<dyn Clock>>,
//!     tick_ms: u64,
//!     runs: u32, // not injected
//! }
//!
//! impl Inject for Scheduler {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::new("clock", "api", SharedSlot::new(&mut self.clock)),
//!             Field::new("tick_ms", "key:tick", ValueSlot::new(&mut self.tick_ms)),
//!         ]
//!     }
//! }
//! ```

use crate::Field;
use std::any::type_name;
use std::sync::{Arc, Mutex, PoisonError};

/// A structure whose annotated fields can be resolved by a container.
pub trait Inject {
    /// Annotated fields, in declaration order. Unannotated fields are omitted.
    fn fields(&mut self) -> Vec<Field<'_>>;
}

/// A queued field-mode target.
///
/// Implemented for `&mut T` and `Arc<Mutex<T>>` where `T: Inject`.
pub trait FieldTarget: Send {
    /// Name of the target's type, for logs and miss reports.
    fn target_name(&self) -> &'static str;

    /// Hand every annotated field to `visit`, in declaration order.
    fn visit_fields(&mut self, visit: &mut dyn FnMut(Field<'_>));
}

impl<T: Inject + Send> FieldTarget for &mut T {
    fn target_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn visit_fields(&mut self, visit: &mut dyn FnMut(Field<'_>)) {
        for field in self.fields() {
            visit(field);
        }
    }
}

impl<T: Inject + Send> FieldTarget for Arc<Mutex<T>> {
    fn target_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn visit_fields(&mut self, visit: &mut dyn FnMut(Field<'_>)) {
        // A poisoned target is still written; the panic that poisoned it
        // happened elsewhere.
        let mut guard = self.lock().unwrap_or_else(PoisonError::into_inner);
        for field in guard.fields() {
            visit(field);
        }
    }
}
