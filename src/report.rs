//! Outcome of `Container::init`

use crate::EntryKey;
use std::fmt;

/// Why a directive injected nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// No entry is registered under the key.
    NotRegistered,
    /// An entry exists, but its stored type does not fit the target.
    TypeMismatch {
        stored_as: &'static str,
        declared: &'static str,
    },
}

/// A directive that left its target untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miss {
    /// Type name of the field-mode target, or the declared type of a value-mode target.
    pub target: &'static str,
    /// Field name; `None` for value-mode targets.
    pub field: Option<&'static str>,
    /// Key that was looked up.
    pub key: EntryKey,
    pub reason: MissReason,
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{}.{}: ", self.target, field)?,
            None => write!(f, "{}: ", self.target)?,
        }
        match &self.reason {
            MissReason::NotRegistered => write!(f, "nothing registered under {}", self.key),
            MissReason::TypeMismatch {
                stored_as,
                declared,
            } => write!(
                f,
                "{} holds `{}`, which does not fit `{}`",
                self.key, stored_as, declared
            ),
        }
    }
}

/// Summary of a completed initialization.
///
/// Misses do not fail `init` unless the container was built in strict mode;
/// they are collected here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Directives that wrote their target.
    pub resolved: usize,
    /// Annotated fields whose tag did not parse.
    pub skipped: usize,
    /// Directives that found nothing usable.
    pub misses: Vec<Miss>,
    /// After-init callbacks that ran.
    pub callbacks: usize,
}

impl InitReport {
    /// Whether every directive was satisfied.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.misses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeKey;

    #[test]
    fn test_miss_display() {
        let miss = Miss {
            target: "app::Home",
            field: Some("li"),
            key: EntryKey::Type(TypeKey::of::<u32>()),
            reason: MissReason::NotRegistered,
        };
        assert_eq!(miss.to_string(), "app::Home.li: nothing registered under type `u32`");

        let miss = Miss {
            target: "u8",
            field: None,
            key: EntryKey::Token("port".into()),
            reason: MissReason::TypeMismatch {
                stored_as: "alloc::string::String",
                declared: "u8",
            },
        };
        assert_eq!(
            miss.to_string(),
            "u8: token `port` holds `alloc::string::String`, which does not fit `u8`"
        );
    }

    #[test]
    fn test_default_report_is_complete() {
        assert!(InitReport::default().is_complete());
    }
}
