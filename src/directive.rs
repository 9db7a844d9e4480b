//! Field annotation directives
//!
//! A field opts into injection with a tag of the form `mode[:token]`:
//!
//! | tag          | meaning                                              |
//! |--------------|------------------------------------------------------|
//! | `api`        | assign the implementation registered for the field's interface |
//! | `val`        | copy the value registered for the field's type       |
//! | `key:<name>` | assign the value registered under token `<name>`     |
//!
//! Parsing is lenient. A tag that does not match one of these forms is not
//! an error; the field is simply skipped.

use std::fmt;

/// How a field receives its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Interface-style: the registered implementation is assigned as-is.
    Api,
    /// Value-style: the field receives a copy of the registered value.
    Val,
    /// Token-style: the entry registered under the directive's token is assigned as-is.
    Key,
}

impl Mode {
    /// The tag spelling of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Api => "api",
            Mode::Val => "val",
            Mode::Key => "key",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed injection instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
    mode: Mode,
    token: Option<&'a str>,
}

impl<'a> Directive<'a> {
    /// Parse a raw tag.
    ///
    /// `key` needs exactly one token segment; `api` and `val` ignore anything
    /// after the first `:`. Returns `None` for every other input.
    ///
    /// ```rust
    /// use field_injector::{Directive, Mode};
    ///
    /// assert_eq!(Directive::parse("val").map(|d| d.mode()), Some(Mode::Val));
    /// assert_eq!(Directive::parse("key:db").and_then(|d| d.token()), Some("db"));
    /// assert!(Directive::parse("key").is_none());
    /// assert!(Directive::parse("inject").is_none());
    /// ```
    pub fn parse(raw: &'a str) -> Option<Self> {
        let mut segments = raw.split(':');
        let mode = segments.next()?;
        match mode {
            "api" => Some(Self::api()),
            "val" => Some(Self::val()),
            "key" => match (segments.next(), segments.next()) {
                (Some(token), None) => Some(Self::key(token)),
                _ => None,
            },
            _ => None,
        }
    }

    /// An `api` directive.
    #[inline]
    pub const fn api() -> Self {
        Self {
            mode: Mode::Api,
            token: None,
        }
    }

    /// A `val` directive.
    #[inline]
    pub const fn val() -> Self {
        Self {
            mode: Mode::Val,
            token: None,
        }
    }

    /// A `key` directive for `token`.
    #[inline]
    pub const fn key(token: &'a str) -> Self {
        Self {
            mode: Mode::Key,
            token: Some(token),
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The token of a `key` directive; `None` for the other modes.
    #[inline]
    pub fn token(&self) -> Option<&'a str> {
        self.token
    }
}

impl fmt::Display for Directive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            Some(token) => write!(f, "{}:{}", self.mode, token),
            None => write!(f, "{}", self.mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_modes() {
        assert_eq!(Directive::parse("api"), Some(Directive::api()));
        assert_eq!(Directive::parse("val"), Some(Directive::val()));
    }

    #[test]
    fn test_plain_modes_ignore_extra_segments() {
        let d = Directive::parse("val:ignored").unwrap();
        assert_eq!(d.mode(), Mode::Val);
        assert_eq!(d.token(), None);
    }

    #[test]
    fn test_key_requires_exactly_one_token() {
        assert_eq!(Directive::parse("key:db"), Some(Directive::key("db")));
        assert_eq!(Directive::parse("key"), None);
        assert_eq!(Directive::parse("key:a:b"), None);
    }

    #[test]
    fn test_key_token_is_verbatim() {
        assert_eq!(Directive::parse("key:"), Some(Directive::key("")));
        assert_eq!(Directive::parse("key: spaced "), Some(Directive::key(" spaced ")));
    }

    #[test]
    fn test_unrecognized_is_skipped() {
        for raw in ["", "API", " api", "value", "inject", ":api"] {
            assert_eq!(Directive::parse(raw), None, "{raw:?} should not parse");
        }
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["api", "val", "key:primary-db"] {
            assert_eq!(Directive::parse(raw).unwrap().to_string(), raw);
        }
    }
}
