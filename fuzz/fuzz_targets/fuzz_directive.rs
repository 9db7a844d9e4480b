#![no_main]

//! Fuzz target for the tag directive parser
//!
//! Any accepted tag must print back to a tag that parses to the same
//! directive, and `key` tokens never contain a separator.

use field_injector::{Directive, Mode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|tag: &str| {
    let Some(directive) = Directive::parse(tag) else {
        assert!(!matches!(tag.split(':').next(), Some("api" | "val")));
        return;
    };

    match directive.mode() {
        Mode::Api | Mode::Val => assert!(directive.token().is_none()),
        Mode::Key => {
            let token = directive.token().expect("key directive carries a token");
            assert!(!token.contains(':'));
            assert_eq!(tag, format!("key:{token}"));
        }
    }

    let printed = directive.to_string();
    assert_eq!(Directive::parse(&printed), Some(directive));
});
