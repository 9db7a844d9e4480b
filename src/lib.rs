//! # field-injector - Tag-Driven Field Injection
//!
//! Register values by type or by token, queue the structures that need them,
//! and fill everything in at one explicit initialization point.
//!
//! ## Features
//!
//! - **Three directives** - `api` shares an interface implementation, `val`
//!   copies a registered value, `key:token` shares whatever was registered
//!   under a token
//! - **Pointer auto-allocation** - unset `Option<Box<T>>`/`Option<Arc<T>>`
//!   targets are allocated before a `val` copy
//! - **Concurrent setup** - registration and queueing take `&self`, backed by
//!   `DashMap` and a mutex-guarded queue
//! - **After-init callbacks** - run in order once everything is resolved;
//!   the first failure stops the chain
//! - **Observable** - optional `tracing` events, and an `InitReport` listing
//!   every directive that found nothing
//!
//! ## Quick Start
//!
//! ```rust
//! use field_injector::{Container, Inject};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Clone, Default)]
//! struct Person {
//!     name: String,
//! }
//!
//! impl Greeter for Person {
//!     fn greet(&self) -> String {
//!         format!("hello from {}", self.name)
//!     }
//! }
//!
//! #[derive(Default, Inject)]
//! struct Home {
//!     #[di("api")]
//!     host: Option<Arc<dyn Greeter>>,
//!     #[di("val")]
//!     guest: Option<Box<Person>>,
//!     #[di("key:street")]
//!     street: String,
//! }
//!
//! let mut home = Home::default();
//!
//! let container = Container::new();
//! container
//!     .register_api::<dyn Greeter>(Arc::new(Person { name: "A".into() }))
//!     .register_value(Person { name: "B".into() })
//!     .register_token("street", String::from("Elm Street"))
//!     .resolve_fields(&mut home);
//!
//! let report = container.init().unwrap();
//! assert!(report.is_complete());
//!
//! assert_eq!(home.host.unwrap().greet(), "hello from A");
//! assert_eq!(home.guest.unwrap().name, "B");
//! assert_eq!(home.street, "Elm Street");
//! ```
//!
//! ## Missing Registrations
//!
//! A directive that finds nothing leaves its field as it was and init still
//! succeeds; the miss is listed in the returned [`InitReport`]. Build the
//! container with [`ContainerBuilder::strict`] to turn misses into
//! [`DiError::Unresolved`] instead.
//!
//! ```rust
//! use field_injector::{Container, DiError};
//!
//! let mut port = 0u16;
//!
//! let container = Container::builder().strict(true).build();
//! container.resolve_value(&mut port);
//!
//! match container.init() {
//!     Err(DiError::Unresolved { misses }) => assert_eq!(misses.len(), 1),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

extern crate self as field_injector;

mod container;
mod directive;
mod error;
mod inject;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod queue;
mod report;
mod slot;
mod storage;

pub use container::*;
pub use directive::*;
pub use error::*;
pub use inject::*;
pub use key::*;
pub use report::*;
pub use slot::*;
pub use storage::{AnyArc, Entry, EntryKey, Registry};

#[cfg(feature = "derive")]
pub use field_injector_derive::Inject;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ArcSlot, BoxedSlot, Container, ContainerBuilder, DiError, Field, Inject, InitReport,
        Result, SharedSlot, ValueSlot,
    };
    pub use std::sync::Arc;
}

#[cfg(all(test, feature = "derive"))]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Person {
        name: String,
    }

    impl Greeter for Person {
        fn greet(&self) -> String {
            format!("{} says hi", self.name)
        }
    }

    fn person(name: &str) -> Person {
        Person { name: name.into() }
    }

    #[derive(Default, Inject)]
    struct Home {
        #[di("api")]
        host: Option<Arc<dyn Greeter>>,
        #[di("val")]
        guest: Option<Box<Person>>,
        #[di("val")]
        neighbour: Person,
        #[di("key:visitor")]
        visitor: Option<Arc<Person>>,
        #[di("key:")]
        nameless: Option<Arc<Person>>,
        #[di("inject")]
        ignored: Option<Arc<Person>>,
        unannotated: u32,
    }

    #[test]
    fn test_greeter_home() {
        let host: Arc<dyn Greeter> = Arc::new(person("A"));
        let visitor = Arc::new(person("C"));
        let mut home = Home::default();

        let container = Container::new();
        container
            .register_api::<dyn Greeter>(Arc::clone(&host))
            .register_value(person("B"))
            .register_token_shared("visitor", Arc::clone(&visitor))
            .register_token_shared("", Arc::new(person("empty token")))
            .resolve_fields(&mut home);
        let report = container.init().unwrap();

        assert!(Arc::ptr_eq(home.host.as_ref().unwrap(), &host));
        assert_eq!(home.host.as_ref().unwrap().greet(), "A says hi");
        assert_eq!(home.guest.as_deref(), Some(&person("B")));
        assert_eq!(home.neighbour, person("B"));
        assert!(Arc::ptr_eq(home.visitor.as_ref().unwrap(), &visitor));
        assert_eq!(home.nameless.as_ref().unwrap().name, "empty token");
        assert!(home.ignored.is_none());
        assert_eq!(home.unannotated, 0);

        assert_eq!(report.resolved, 5);
        assert_eq!(report.skipped, 1);
        assert!(report.is_complete());
    }

    #[test]
    fn test_copies_are_independent() {
        let mut first = Home::default();
        let mut second = Home::default();

        let container = Container::new();
        container
            .register_value(person("B"))
            .resolve_fields(&mut first)
            .resolve_fields(&mut second);
        container.init().unwrap();

        first.guest.as_mut().unwrap().name = "changed".into();
        first.neighbour.name.clear();

        assert_eq!(second.guest.as_ref().unwrap().name, "B");
        assert_eq!(second.neighbour.name, "B");
    }

    #[test]
    fn test_pointer_and_value_forms_share_a_key() {
        assert_eq!(
            TypeKey::of::<Person>(),
            TypeKey::of_pointee::<Box<Person>>()
        );

        let mut plain = Person::default();
        let mut boxed: Option<Box<Person>> = None;

        let container = Container::new();
        container
            .register_shared(Arc::new(person("shared")))
            .resolve_value(&mut plain)
            .resolve_boxed(&mut boxed);
        container.init().unwrap();

        assert_eq!(plain.name, "shared");
        assert_eq!(boxed.unwrap().name, "shared");
    }

    #[test]
    fn test_empty_container_leaves_home_alone() {
        let mut home = Home {
            neighbour: person("already here"),
            ..Home::default()
        };

        let container = Container::new();
        container.resolve_fields(&mut home);
        let report = container.init().unwrap();

        assert!(home.host.is_none());
        assert!(home.visitor.is_none());
        assert_eq!(home.neighbour.name, "already here");
        // `val` on a pointer allocates even when nothing is registered
        assert_eq!(home.guest.as_deref(), Some(&Person::default()));
        assert_eq!(report.misses.len(), 5);
    }

    #[derive(Default, Inject)]
    struct Service {
        #[di = "key:name"]
        name: Box<String>,
        #[di("val")]
        shared: Option<Arc<Person>>,
    }

    #[test]
    fn test_boxed_value_and_shared_target() {
        let service = Arc::new(Mutex::new(Service::default()));
        let observed = Arc::new(Mutex::new(None));

        let container = Container::new();
        {
            let service = Arc::clone(&service);
            let observed = Arc::clone(&observed);
            container
                .register_token("name", String::from("billing"))
                .register_value(person("owner"))
                .resolve_fields_shared(Arc::clone(&service))
                .after_init(move || {
                    let service = service.lock().unwrap();
                    *observed.lock().unwrap() = Some((*service.name).clone());
                    Ok::<_, BoxError>(())
                });
        }
        container.init().unwrap();

        assert_eq!(observed.lock().unwrap().as_deref(), Some("billing"));
        assert_eq!(service.lock().unwrap().shared.as_ref().unwrap().name, "owner");
    }

    #[test]
    fn test_callback_failure_surfaces_from_init() {
        let container = Container::new();
        container
            .after_init(|| Ok::<_, BoxError>(()))
            .after_init(|| Err(std::io::Error::other("disk full")));

        let err = container.init().unwrap_err();
        assert_eq!(err.to_string(), "after-init callback #1 failed: disk full");
        assert!(std::error::Error::source(&err).is_some());
    }
}
