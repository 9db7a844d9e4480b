//! Injection container
//!
//! The `Container` collects registrations and queued targets, then resolves
//! everything in one pass when [`Container::init`] is called.

use crate::queue::ResolveQueue;
use crate::storage::{AnyArc, Entry, EntryKey, Registry};
use crate::{
    ArcSlot, BoxError, BoxedSlot, DiError, Directive, Field, FieldTarget, InitReport, Inject,
    Miss, MissReason, Mode, Result, Slot, TypeKey, ValueSlot,
};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "logging")]
use crate::logging::TARGET;
#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Boxed after-init callback
type AfterInitFn<'t> = Box<dyn FnOnce() -> std::result::Result<(), BoxError> + Send + 't>;

/// Dependency injection container.
///
/// Lifecycle: registrations and targets are added in any order (all methods
/// take `&self` and may be called from several threads), then
/// [`init`](Container::init) consumes the container, resolves every queued
/// target and runs the after-init callbacks. A container can therefore be
/// initialized at most once, and nothing can be queued afterwards.
///
/// `'t` is the lifetime of the borrowed targets.
///
/// # Examples
///
/// ```rust
/// use field_injector::{Container, Field, Inject, SharedSlot, ValueSlot};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Clone, Default)]
/// struct Person { name: String }
///
/// impl Greeter for Person {
///     fn greet(&self) -> String { format!("hi, I'm {}", self.name) }
/// }
///
/// #[derive(Default)]
/// struct Home {
///     host: Option<Arc<dyn Greeter>>,
///     guest: Person,
/// }
///
/// impl Inject for Home {
///     fn fields(&mut self) -> Vec<Field<'_>> {
///         vec![
///             Field::new("host", "api", SharedSlot::new(&mut self.host)),
///             Field::new("guest", "val", ValueSlot::new(&mut self.guest)),
///         ]
///     }
/// }
///
/// let mut home = Home::default();
///
/// let container = Container::new();
/// container
///     .register_api::<dyn Greeter>(Arc::new(Person { name: "A".into() }))
///     .register_value(Person { name: "B".into() })
///     .resolve_fields(&mut home);
/// container.init().unwrap();
///
/// assert_eq!(home.host.unwrap().greet(), "hi, I'm A");
/// assert_eq!(home.guest.name, "B");
/// ```
pub struct Container<'t> {
    registry: Registry,
    queue: Mutex<ResolveQueue<'t>>,
    after_init: Mutex<Vec<AfterInitFn<'t>>>,
    strict: bool,
}

impl<'t> Container<'t> {
    /// Create an empty, lenient container.
    #[inline]
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    /// Create a container with room for `capacity` type registrations.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        ContainerBuilder::new().capacity(capacity).build()
    }

    /// Start configuring a container.
    #[inline]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register the implementation of an interface.
    ///
    /// `I` must be a trait object type (`dyn Trait`); the compiler checks that
    /// the implementation satisfies it when it is coerced into `Arc<dyn Trait>`.
    /// Fields tagged `api` with type `Option<Arc<dyn Trait>>` receive this very
    /// `Arc`.
    ///
    /// # Panics
    ///
    /// Panics if `I` is not a trait object. This is a configuration bug; use
    /// [`try_register_api`](Container::try_register_api) to get an error instead.
    #[inline]
    pub fn register_api<I>(&self, implementation: Arc<I>) -> &Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        if let Err(err) = self.try_register_api(implementation) {
            panic!("{err}");
        }
        self
    }

    /// Fallible form of [`register_api`](Container::register_api).
    pub fn try_register_api<I>(&self, implementation: Arc<I>) -> Result<&Self>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<I>();
        if !key.is_interface() {
            return Err(DiError::not_an_interface::<I>());
        }

        self.store(Entry::new(EntryKey::Type(key), implementation));
        Ok(self)
    }

    /// Register a value under its own type.
    ///
    /// Fields tagged `val` with type `T`, `Box<T>`, `Option<Box<T>>` or
    /// `Option<Arc<T>>` receive a copy.
    ///
    /// # Panics
    ///
    /// Panics if `T` is a pointer form (`Box<U>`, `Arc<U>`, `&U`); use
    /// [`register_boxed`](Container::register_boxed) or
    /// [`register_shared`](Container::register_shared), or
    /// [`try_register_value`](Container::try_register_value) for an error.
    #[inline]
    pub fn register_value<T: Send + Sync + 'static>(&self, value: T) -> &Self {
        if let Err(err) = self.try_register_value(value) {
            panic!("{err}");
        }
        self
    }

    /// Fallible form of [`register_value`](Container::register_value).
    pub fn try_register_value<T: Send + Sync + 'static>(&self, value: T) -> Result<&Self> {
        let key = TypeKey::of::<T>();
        if key.is_pointer() {
            return Err(DiError::pointer_form(&key));
        }

        self.store(Entry::new(EntryKey::Type(key), value));
        Ok(self)
    }

    /// Register a boxed value under the type it points to.
    ///
    /// Same key as `register_value::<T>`.
    #[inline]
    pub fn register_boxed<T: Send + Sync + 'static>(&self, value: Box<T>) -> &Self {
        self.store(Entry::new(EntryKey::Type(TypeKey::of_pointee::<Box<T>>()), *value));
        self
    }

    /// Register a shared value under the type it points to.
    ///
    /// Same key as `register_value::<T>`; `Option<Arc<T>>` fields tagged
    /// `key` or `api` share this `Arc`.
    #[inline]
    pub fn register_shared<T: Send + Sync + 'static>(&self, value: Arc<T>) -> &Self {
        self.store(Entry::from_arc(EntryKey::Type(TypeKey::of_pointee::<Arc<T>>()), value));
        self
    }

    /// Register a value under an explicit token.
    ///
    /// Tokens are matched verbatim and never collide with type registrations.
    #[inline]
    pub fn register_token<T: Send + Sync + 'static>(
        &self,
        token: impl Into<String>,
        value: T,
    ) -> &Self {
        self.store(Entry::new(EntryKey::Token(token.into()), value));
        self
    }

    /// Register a shared value under an explicit token.
    #[inline]
    pub fn register_token_shared<T: Send + Sync + 'static>(
        &self,
        token: impl Into<String>,
        value: Arc<T>,
    ) -> &Self {
        self.store(Entry::from_arc(EntryKey::Token(token.into()), value));
        self
    }

    fn store(&self, entry: Entry) {
        #[cfg(feature = "logging")]
        let (key, stored_as) = (entry.key().to_string(), entry.stored_as());

        let replaced = self.registry.insert(entry);

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            key = %key,
            stored_as = stored_as,
            replaced = replaced.is_some(),
            entries = self.registry.len(),
            "Registered entry"
        );
        #[cfg(not(feature = "logging"))]
        let _ = replaced;
    }

    // =========================================================================
    // Queueing Methods
    // =========================================================================

    /// Queue a structure whose annotated fields are resolved at init.
    #[inline]
    pub fn resolve_fields<T: Inject + Send>(&self, target: &'t mut T) -> &Self {
        self.enqueue(|queue| queue.push_fields(target));
        self
    }

    /// Queue a shared structure; it is locked while its fields are written.
    ///
    /// Keep a clone of the `Arc` to read the result, e.g. from an after-init
    /// callback.
    #[inline]
    pub fn resolve_fields_shared<T: Inject + Send + 't>(&self, target: Arc<Mutex<T>>) -> &Self {
        self.enqueue(|queue| queue.push_fields(target));
        self
    }

    /// Queue a whole value to be overwritten with a copy of the registered `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is a pointer form; use
    /// [`resolve_boxed_value`](Container::resolve_boxed_value) for `Box<T>`,
    /// or [`try_resolve_value`](Container::try_resolve_value) for an error.
    #[inline]
    pub fn resolve_value<T>(&self, target: &'t mut T) -> &Self
    where
        T: Clone + Send + Sync + 'static,
    {
        if let Err(err) = self.try_resolve_value(target) {
            panic!("{err}");
        }
        self
    }

    /// Fallible form of [`resolve_value`](Container::resolve_value).
    pub fn try_resolve_value<T>(&self, target: &'t mut T) -> Result<&Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        if key.is_pointer() {
            return Err(DiError::pointer_form(&key));
        }

        self.enqueue(|queue| queue.push_value(ValueSlot::new(target)));
        Ok(self)
    }

    /// Queue a box whose pointee is overwritten with a copy of the
    /// registered `T`.
    #[inline]
    pub fn resolve_boxed_value<T>(&self, target: &'t mut Box<T>) -> &Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.enqueue(|queue| queue.push_value(ValueSlot::new(&mut **target)));
        self
    }

    /// Queue a nullable box; it is allocated at init if unset, then filled.
    #[inline]
    pub fn resolve_boxed<T>(&self, target: &'t mut Option<Box<T>>) -> &Self
    where
        T: Clone + Default + Send + Sync + 'static,
    {
        self.enqueue(|queue| queue.push_value(BoxedSlot::new(target)));
        self
    }

    /// Queue a nullable `Arc`; it is allocated at init if unset, then filled
    /// with a copy (never the registry's own `Arc`).
    #[inline]
    pub fn resolve_arc<T>(&self, target: &'t mut Option<Arc<T>>) -> &Self
    where
        T: Clone + Default + Send + Sync + 'static,
    {
        self.enqueue(|queue| queue.push_value(ArcSlot::new(target)));
        self
    }

    fn enqueue(&self, push: impl FnOnce(&mut ResolveQueue<'t>)) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        push(&mut queue);

        #[cfg(feature = "logging")]
        trace!(
            target: TARGET,
            pending = queue.len(),
            "Queued resolution target"
        );
    }

    /// Append a callback to run after every target is resolved.
    ///
    /// Callbacks run in the order they were added. The first one to fail
    /// stops the chain and becomes the error returned by `init`.
    #[inline]
    pub fn after_init<F, E>(&self, callback: F) -> &Self
    where
        F: FnOnce() -> std::result::Result<(), E> + Send + 't,
        E: Into<BoxError>,
    {
        self.after_init
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(move || callback().map_err(Into::into)));
        self
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of registered entries (types and tokens).
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Check whether something is registered for `T` (or `dyn Trait`).
    #[inline]
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.registry.contains_type(&TypeKey::of::<T>())
    }

    #[inline]
    pub fn contains_token(&self, token: &str) -> bool {
        self.registry.contains_token(token)
    }

    /// Keys of every registered entry.
    pub fn keys(&self) -> Vec<EntryKey> {
        self.registry.keys()
    }

    /// Number of queued targets waiting for `init`.
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Resolve every queued target, then run the after-init callbacks.
    ///
    /// Field-mode targets are resolved first, field by field in declaration
    /// order, then value-mode targets. Lookups that find nothing leave their
    /// target untouched and are listed in the returned report; in strict mode
    /// they fail the call with [`DiError::Unresolved`] before any callback
    /// runs. A failing callback aborts the chain with [`DiError::AfterInit`].
    /// Writes already made are never rolled back.
    ///
    /// Consumes the container: the queue is released whatever the outcome.
    pub fn init(self) -> Result<InitReport> {
        let Container {
            registry,
            queue,
            after_init,
            strict,
        } = self;
        let queue = queue.into_inner().unwrap_or_else(PoisonError::into_inner);
        let callbacks = after_init
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            field_targets = queue.fields.len(),
            value_targets = queue.values.len(),
            callbacks = callbacks.len(),
            entries = registry.len(),
            strict = strict,
            "Initializing container"
        );

        let mut resolver = Resolver {
            registry: &registry,
            report: InitReport::default(),
        };

        for mut target in queue.fields {
            let name = target.target_name();
            target.visit_fields(&mut |mut field| resolver.resolve_field(name, &mut field));
        }
        for mut value in queue.values {
            resolver.resolve_value(value.name, &mut *value.slot);
        }

        let mut report = resolver.report;

        if strict && !report.misses.is_empty() {
            #[cfg(feature = "logging")]
            debug!(
                target: TARGET,
                misses = report.misses.len(),
                "Strict container has unresolved injections, skipping after-init callbacks"
            );
            return Err(DiError::Unresolved {
                misses: report.misses,
            });
        }

        for (index, callback) in callbacks.into_iter().enumerate() {
            if let Err(source) = callback() {
                #[cfg(feature = "logging")]
                debug!(
                    target: TARGET,
                    index = index,
                    error = %source,
                    "After-init callback failed, remaining callbacks skipped"
                );
                return Err(DiError::after_init(index, source));
            }
            report.callbacks += 1;
        }

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            resolved = report.resolved,
            skipped = report.skipped,
            misses = report.misses.len(),
            callbacks = report.callbacks,
            "Container initialized"
        );

        Ok(report)
    }
}

/// Resolution strategies, applied while draining the queue.
struct Resolver<'r> {
    registry: &'r Registry,
    report: InitReport,
}

impl Resolver<'_> {
    fn resolve_field(&mut self, target: &'static str, field: &mut Field<'_>) {
        let Some(directive) = Directive::parse(field.tag()) else {
            #[cfg(feature = "logging")]
            trace!(
                target: TARGET,
                target_type = target,
                field = field.name(),
                tag = field.tag(),
                "Tag is not a directive, field skipped"
            );
            self.report.skipped += 1;
            return;
        };

        let name = field.name();
        let outcome = self.apply(directive, field.slot());
        self.record(target, Some(name), outcome);
    }

    fn resolve_value(&mut self, target: &'static str, slot: &mut dyn Slot) {
        let outcome = self.apply(Directive::val(), slot);
        self.record(target, None, outcome);
    }

    fn apply(&self, directive: Directive<'_>, slot: &mut dyn Slot) -> Outcome {
        match directive.mode() {
            Mode::Api => {
                let key = EntryKey::Type(slot.type_key());
                let entry = self.lookup(&key);
                Outcome::of(key, entry, slot, |slot, value| slot.share(value))
            }
            Mode::Val => {
                slot.allocate();
                let key = EntryKey::Type(slot.type_key());
                let entry = self.lookup(&key);
                Outcome::of(key, entry, slot, |slot, value| slot.copy_from(value))
            }
            Mode::Key => {
                let key = EntryKey::Token(directive.token().unwrap_or_default().to_owned());
                let entry = self.lookup(&key);
                Outcome::of(key, entry, slot, |slot, value| slot.share(value))
            }
        }
    }

    fn lookup(&self, key: &EntryKey) -> Option<Entry> {
        match key {
            EntryKey::Type(key) => self.registry.by_type(key),
            EntryKey::Token(token) => self.registry.by_token(token),
        }
    }

    fn record(&mut self, target: &'static str, field: Option<&'static str>, outcome: Outcome) {
        match outcome {
            Outcome::Resolved(_key) => {
                #[cfg(feature = "logging")]
                trace!(
                    target: TARGET,
                    target_type = target,
                    field = field.unwrap_or("<value>"),
                    key = %_key,
                    "Resolved"
                );
                self.report.resolved += 1;
            }
            Outcome::Missed(key, reason) => {
                let miss = Miss {
                    target,
                    field,
                    key,
                    reason,
                };

                #[cfg(feature = "logging")]
                debug!(target: TARGET, miss = %miss, "Injection missed, target left unchanged");

                self.report.misses.push(miss);
            }
        }
    }
}

enum Outcome {
    Resolved(EntryKey),
    Missed(EntryKey, MissReason),
}

impl Outcome {
    fn of(
        key: EntryKey,
        entry: Option<Entry>,
        slot: &mut dyn Slot,
        write: impl FnOnce(&mut dyn Slot, &AnyArc) -> bool,
    ) -> Self {
        let Some(entry) = entry else {
            return Outcome::Missed(key, MissReason::NotRegistered);
        };

        if write(&mut *slot, entry.value()) {
            Outcome::Resolved(key)
        } else {
            Outcome::Missed(
                key,
                MissReason::TypeMismatch {
                    stored_as: entry.stored_as(),
                    declared: slot.declared_type(),
                },
            )
        }
    }
}

impl Default for Container<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registry", &self.registry)
            .field("pending", &self.pending())
            .field("strict", &self.strict)
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Container configuration.
///
/// ```rust
/// use field_injector::Container;
///
/// let container = Container::builder().strict(true).capacity(32).build();
/// assert!(container.is_strict());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerBuilder {
    capacity: usize,
    strict: bool,
}

impl ContainerBuilder {
    /// Create a builder with default settings (lenient, no pre-allocation).
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate room for this many type registrations.
    #[inline]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Fail `init` when any directive finds nothing to inject.
    #[inline]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Create the container.
    pub fn build<'t>(self) -> Container<'t> {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            capacity = self.capacity,
            strict = self.strict,
            "Creating new injection container"
        );

        Container {
            registry: Registry::with_capacity(self.capacity),
            queue: Mutex::new(ResolveQueue::default()),
            after_init: Mutex::new(Vec::new()),
            strict: self.strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SharedSlot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Person {
        name: String,
    }

    impl Greeter for Person {
        fn greet(&self) -> String {
            format!("{} says hello", self.name)
        }
    }

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Database {
        url: String,
    }

    #[derive(Default)]
    struct Home {
        host: Option<Arc<dyn Greeter>>,
        guest: Option<Box<Person>>,
        db: Option<Arc<Database>>,
        note: String,
    }

    impl Inject for Home {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::new("host", "api", SharedSlot::new(&mut self.host)),
                Field::new("guest", "val", BoxedSlot::new(&mut self.guest)),
                Field::new("db", "key:primary", ArcSlot::new(&mut self.db)),
                Field::new("note", "inject", ValueSlot::new(&mut self.note)),
            ]
        }
    }

    fn person(name: &str) -> Person {
        Person { name: name.into() }
    }

    #[test]
    fn test_resolves_every_mode() {
        let implementation: Arc<dyn Greeter> = Arc::new(person("A"));
        let db = Arc::new(Database {
            url: "postgres://localhost".into(),
        });
        let mut home = Home::default();

        let container = Container::new();
        container
            .register_api::<dyn Greeter>(Arc::clone(&implementation))
            .register_value(person("B"))
            .register_token_shared("primary", Arc::clone(&db))
            .resolve_fields(&mut home);
        let report = container.init().unwrap();

        assert!(Arc::ptr_eq(home.host.as_ref().unwrap(), &implementation));
        assert_eq!(home.guest.as_deref(), Some(&person("B")));
        assert!(Arc::ptr_eq(home.db.as_ref().unwrap(), &db));
        assert_eq!(home.note, "");

        assert_eq!(report.resolved, 3);
        assert_eq!(report.skipped, 1);
        assert!(report.is_complete());
    }

    #[test]
    fn test_val_copy_is_independent_of_registry() {
        let registered = Arc::new(person("B"));
        let mut first = Home::default();
        let mut second = Home::default();

        let container = Container::new();
        container
            .register_shared(Arc::clone(&registered))
            .resolve_fields(&mut first)
            .resolve_fields(&mut second);
        container.init().unwrap();

        first.guest.as_mut().unwrap().name.push_str(" (edited)");
        assert_eq!(registered.name, "B");
        assert_eq!(second.guest.as_ref().unwrap().name, "B");
    }

    #[test]
    fn test_missing_registrations_are_silent() {
        let mut home = Home::default();

        let container = Container::new();
        container.resolve_fields(&mut home);
        let report = container.init().unwrap();

        assert!(home.host.is_none());
        assert!(home.db.is_none());
        // `val` allocates before looking up
        assert_eq!(home.guest.as_deref(), Some(&Person::default()));

        assert_eq!(report.resolved, 0);
        assert_eq!(report.misses.len(), 3);
        assert!(report
            .misses
            .iter()
            .all(|miss| miss.reason == MissReason::NotRegistered));
        assert_eq!(report.misses[2].key, EntryKey::Token("primary".into()));
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let mut home = Home::default();

        let container = Container::new();
        container
            .register_token("primary", "not a database")
            .resolve_fields(&mut home);
        let report = container.init().unwrap();

        assert!(home.db.is_none());
        let miss = report.misses.iter().find(|m| m.field == Some("db")).unwrap();
        assert!(matches!(miss.reason, MissReason::TypeMismatch { stored_as: "&str", .. }));
    }

    #[test]
    #[should_panic(expected = "is not an interface type")]
    fn test_register_api_rejects_concrete_type() {
        let container = Container::new();
        container.register_api::<Person>(Arc::new(person("A")));
    }

    #[test]
    fn test_try_register_api() {
        let container = Container::new();
        let err = container
            .try_register_api::<Person>(Arc::new(person("A")))
            .unwrap_err();
        assert!(matches!(err, DiError::NotAnInterface { .. }));
        assert!(container.is_empty());

        assert!(container
            .try_register_api::<dyn Greeter>(Arc::new(person("A")))
            .is_ok());
        assert!(container.contains_type::<dyn Greeter>());
    }

    #[test]
    #[should_panic(expected = "is not an interface type")]
    fn test_register_api_rejects_boxed_trait_object() {
        let container = Container::new();
        container.register_api::<Box<dyn Greeter>>(Arc::new(
            Box::new(person("A")) as Box<dyn Greeter>
        ));
    }

    #[test]
    fn test_try_register_api_rejects_pointers_to_trait_objects() {
        let container = Container::new();
        let boxed: Box<dyn Greeter> = Box::new(person("A"));
        assert!(matches!(
            container.try_register_api::<Box<dyn Greeter>>(Arc::new(boxed)),
            Err(DiError::NotAnInterface { .. })
        ));
        let shared: Arc<dyn Greeter> = Arc::new(person("A"));
        assert!(container
            .try_register_api::<Arc<dyn Greeter>>(Arc::new(shared))
            .is_err());
        assert!(container.is_empty());
    }

    #[test]
    fn test_boxed_registration_meets_plain_target() {
        let mut plain = Person::default();

        let container = Container::new();
        container
            .register_boxed(Box::new(person("B")))
            .resolve_value(&mut plain);
        assert!(container.contains_type::<Person>());
        let report = container.init().unwrap();

        assert_eq!(plain.name, "B");
        assert!(report.is_complete());
    }

    #[test]
    fn test_plain_registration_meets_boxed_target() {
        let mut boxed = Box::new(Person::default());

        let container = Container::new();
        container
            .register_value(person("B"))
            .resolve_boxed_value(&mut boxed);
        let report = container.init().unwrap();

        assert_eq!(boxed.name, "B");
        assert!(report.is_complete());
    }

    #[test]
    #[should_panic(expected = "is a pointer to")]
    fn test_register_value_rejects_box() {
        let container = Container::new();
        container.register_value(Box::new(person("B")));
    }

    #[test]
    fn test_pointer_forms_are_rejected_without_side_effects() {
        let mut boxed = Box::new(Person::default());

        let container = Container::new();
        let err = container
            .try_register_value(Arc::new(person("B")))
            .unwrap_err();
        assert!(matches!(err, DiError::PointerForm { .. }));
        assert!(container.is_empty());

        let err = container.try_resolve_value(&mut boxed).unwrap_err();
        assert!(err.to_string().contains("is a pointer to"));
        assert_eq!(container.pending(), 0);
    }

    #[test]
    #[should_panic(expected = "is a pointer to")]
    fn test_resolve_value_rejects_box() {
        let mut boxed = Box::new(Person::default());
        let container = Container::new();
        container.resolve_value(&mut boxed);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut target = Person::default();

        let container = Container::new();
        container
            .register_value(person("first"))
            .register_value(person("second"))
            .resolve_value(&mut target);
        assert_eq!(container.len(), 1);
        container.init().unwrap();

        assert_eq!(target.name, "second");
    }

    #[test]
    fn test_value_targets() {
        let mut plain = Database::default();
        let mut boxed: Option<Box<Database>> = None;
        let mut shared: Option<Arc<Database>> = None;
        let mut unregistered: Option<Box<Person>> = None;
        let registered = Arc::new(Database {
            url: "sqlite::memory:".into(),
        });

        let container = Container::new();
        container
            .register_shared(Arc::clone(&registered))
            .resolve_value(&mut plain)
            .resolve_boxed(&mut boxed)
            .resolve_arc(&mut shared)
            .resolve_boxed(&mut unregistered);
        assert_eq!(container.pending(), 4);
        let report = container.init().unwrap();

        assert_eq!(plain.url, "sqlite::memory:");
        assert_eq!(boxed.unwrap().url, "sqlite::memory:");
        let shared = shared.unwrap();
        assert_eq!(*shared, *registered);
        assert!(!Arc::ptr_eq(&shared, &registered));
        assert_eq!(unregistered.as_deref(), Some(&Person::default()));

        assert_eq!(report.resolved, 3);
        assert_eq!(report.misses.len(), 1);
        assert_eq!(report.misses[0].field, None);
    }

    #[test]
    fn test_tokens_do_not_shadow_types() {
        let mut target = Person::default();

        let container = Container::new();
        container
            .register_token(TypeKey::of::<Person>().name(), person("token"))
            .resolve_value(&mut target);
        let report = container.init().unwrap();

        assert_eq!(target, Person::default());
        assert_eq!(report.misses.len(), 1);
    }

    #[test]
    fn test_after_init_runs_in_order() {
        let order = Mutex::new(Vec::new());

        let container = Container::new();
        container
            .after_init(|| {
                order.lock().unwrap().push(1);
                Ok::<_, BoxError>(())
            })
            .after_init(|| {
                order.lock().unwrap().push(2);
                Ok::<_, BoxError>(())
            });
        let report = container.init().unwrap();

        assert_eq!(report.callbacks, 2);
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_after_init_failure_stops_chain() {
        let ran = AtomicUsize::new(0);
        let mut target = Person::default();

        let container = Container::new();
        container
            .register_value(person("kept"))
            .resolve_value(&mut target)
            .after_init(|| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            })
            .after_init(|| Err("migration failed"))
            .after_init(|| {
                ran.fetch_add(100, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            });
        let err = container.init().unwrap_err();

        assert!(matches!(err, DiError::AfterInit { index: 1, .. }));
        assert!(err.to_string().contains("migration failed"));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        // resolution is not rolled back
        assert_eq!(target.name, "kept");
    }

    #[test]
    fn test_strict_mode_reports_misses() {
        let called = AtomicUsize::new(0);
        let mut home = Home::default();

        let container = Container::builder().strict(true).build();
        container
            .register_api::<dyn Greeter>(Arc::new(person("A")))
            .resolve_fields(&mut home)
            .after_init(|| {
                called.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            });
        let err = container.init().unwrap_err();

        let misses = err.misses();
        assert_eq!(misses.len(), 2);
        assert_eq!(misses[0].field, Some("guest"));
        assert_eq!(misses[1].field, Some("db"));
        assert_eq!(called.load(Ordering::SeqCst), 0);
        assert!(home.host.is_some());
    }

    #[test]
    fn test_shared_target_visible_to_callback() {
        let home = Arc::new(Mutex::new(Home::default()));
        let seen = Arc::new(Mutex::new(String::new()));

        let container = Container::new();
        {
            let home = Arc::clone(&home);
            let seen = Arc::clone(&seen);
            container
                .register_api::<dyn Greeter>(Arc::new(person("A")))
                .resolve_fields_shared(Arc::clone(&home))
                .after_init(move || {
                    let greeting = home.lock().unwrap().host.as_ref().map(|g| g.greet());
                    *seen.lock().unwrap() = greeting.unwrap_or_default();
                    Ok::<_, BoxError>(())
                });
        }
        container.init().unwrap();

        assert_eq!(*seen.lock().unwrap(), "A says hello");
    }

    #[test]
    fn test_concurrent_registration_and_queueing() {
        let mut targets = vec![0u64; 8];

        let container = Container::new();
        std::thread::scope(|s| {
            for (i, target) in targets.iter_mut().enumerate() {
                let container = &container;
                s.spawn(move || {
                    container.register_token(format!("worker-{i}"), i);
                    container.resolve_value(target);
                });
            }
            s.spawn(|| {
                container.register_value(7u64);
            });
        });

        assert_eq!(container.len(), 9);
        assert_eq!(container.pending(), 8);
        container.init().unwrap();

        assert!(targets.iter().all(|&t| t == 7));
    }
}
