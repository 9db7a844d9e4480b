//! Error types for field injection

use crate::{Miss, TypeKey};
use thiserror::Error;

/// Boxed error returned by after-init callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while configuring or initializing a container
#[derive(Error, Debug)]
pub enum DiError {
    /// `register_api` was given a type that is not a trait object
    #[error("{type_name} is not an interface type; register_api expects `dyn Trait`")]
    NotAnInterface { type_name: &'static str },

    /// `register_value`/`resolve_value` was given a pointer form such as
    /// `Box<T>` or `&T`, which would never meet a registration of `T`
    #[error("{type_name} is a pointer to {pointee}; register or resolve the pointee, or use the boxed/shared variants")]
    PointerForm {
        type_name: &'static str,
        pointee: &'static str,
    },

    /// An after-init callback failed; later callbacks were not run
    #[error("after-init callback #{index} failed: {source}")]
    AfterInit {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// Strict mode: at least one directive found nothing to inject
    #[error("{} injection(s) could not be resolved: {}", .misses.len(), summarize(.misses))]
    Unresolved { misses: Vec<Miss> },
}

impl DiError {
    /// Create a NotAnInterface error for a type
    #[inline]
    pub fn not_an_interface<I: ?Sized + 'static>() -> Self {
        Self::NotAnInterface {
            type_name: std::any::type_name::<I>(),
        }
    }

    /// Create a PointerForm error from a key whose type carries indirection
    #[inline]
    pub fn pointer_form(key: &TypeKey) -> Self {
        Self::PointerForm {
            type_name: key.type_name(),
            pointee: key.name(),
        }
    }

    /// Wrap a callback failure
    #[inline]
    pub fn after_init(index: usize, source: impl Into<BoxError>) -> Self {
        Self::AfterInit {
            index,
            source: source.into(),
        }
    }

    /// Misses carried by an `Unresolved` error
    pub fn misses(&self) -> &[Miss] {
        match self {
            Self::Unresolved { misses } => misses,
            _ => &[],
        }
    }
}

fn summarize(misses: &[Miss]) -> String {
    misses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntryKey, MissReason};

    trait Greeter {}

    #[test]
    fn test_not_an_interface_names_type() {
        let err = DiError::not_an_interface::<String>();
        assert!(err.to_string().contains("alloc::string::String"));

        let err = DiError::not_an_interface::<dyn Greeter>();
        assert!(matches!(err, DiError::NotAnInterface { type_name } if type_name.starts_with("dyn ")));
    }

    #[test]
    fn test_pointer_form_names_both_types() {
        let err = DiError::pointer_form(&TypeKey::of::<Box<u32>>());
        assert!(matches!(
            err,
            DiError::PointerForm { type_name: "alloc::boxed::Box<u32>", pointee: "u32" }
        ));
        assert!(err.to_string().starts_with("alloc::boxed::Box<u32> is a pointer to u32"));
    }

    #[test]
    fn test_after_init_keeps_source() {
        let err = DiError::after_init(2, "socket closed");
        assert_eq!(err.to_string(), "after-init callback #2 failed: socket closed");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "socket closed");
    }

    #[test]
    fn test_unresolved_lists_misses() {
        let err = DiError::Unresolved {
            misses: vec![Miss {
                target: "app::Home",
                field: Some("db"),
                key: EntryKey::Token("db".into()),
                reason: MissReason::NotRegistered,
            }],
        };
        assert_eq!(err.misses().len(), 1);
        assert!(err.to_string().starts_with("1 injection(s) could not be resolved"));
        assert!(err.to_string().contains("app::Home.db"));
    }
}
