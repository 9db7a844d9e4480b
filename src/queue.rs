//! Deferred resolution queue
//!
//! Targets accumulate here until `Container::init` drains them. The queue
//! is append-only; the container guards it with a mutex so targets can be
//! queued from several threads while registrations are still going on.

use crate::{FieldTarget, Slot};

/// A queued value-mode target: a whole value resolved like a `val` field.
pub(crate) struct ValueTarget<'t> {
    pub(crate) name: &'static str,
    pub(crate) slot: Box<dyn Slot + Send + 't>,
}

/// Pending targets, partitioned by resolution mode.
#[derive(Default)]
pub(crate) struct ResolveQueue<'t> {
    pub(crate) fields: Vec<Box<dyn FieldTarget + 't>>,
    pub(crate) values: Vec<ValueTarget<'t>>,
}

impl<'t> ResolveQueue<'t> {
    #[inline]
    pub(crate) fn push_fields(&mut self, target: impl FieldTarget + 't) {
        self.fields.push(Box::new(target));
    }

    #[inline]
    pub(crate) fn push_value(&mut self, slot: impl Slot + Send + 't) {
        let name = slot.declared_type();
        self.values.push(ValueTarget {
            name,
            slot: Box::new(slot),
        });
    }

    /// Total number of queued targets
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.fields.len() + self.values.len()
    }
}

impl std::fmt::Debug for ResolveQueue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveQueue")
            .field("fields", &self.fields.len())
            .field("values", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxedSlot, Field, Inject, ValueSlot};

    struct Empty;

    impl Inject for Empty {
        fn fields(&mut self) -> Vec<Field<'_>> {
            Vec::new()
        }
    }

    #[test]
    fn test_partitions_by_mode() {
        let mut empty = Empty;
        let mut port = 0u16;
        let mut boxed: Option<Box<String>> = None;

        let mut queue = ResolveQueue::default();
        assert_eq!(queue.len(), 0);

        queue.push_fields(&mut empty);
        queue.push_value(ValueSlot::new(&mut port));
        queue.push_value(BoxedSlot::new(&mut boxed));

        assert_eq!(queue.fields.len(), 1);
        assert_eq!(queue.values.len(), 2);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.values[0].name, "u16");
    }
}
