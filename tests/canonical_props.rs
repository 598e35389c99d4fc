//! Property-based tests for path canonicalization.
//!
//! Uses proptest to generate arbitrary and path-like strings and verify that:
//! 1. Canonicalization never panics, whatever the input
//! 2. A canonical path is a fixed point (idempotence)
//! 3. The canonical flag agrees with byte equality

use canonical_router::routing::canonicalize;
use proptest::prelude::*;

/// Path-like strings built from separators, dot segments and short names.
fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("/".to_string()),
            Just(".".to_string()),
            Just("..".to_string()),
            prop::string::string_regex("[a-zA-Z0-9_%-]{1,6}").expect("valid regex"),
        ],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn canonicalize_is_idempotent(path in path_strategy()) {
        let (once, _) = canonicalize(&path);
        let (twice, is_canonical) = canonicalize(&once);
        prop_assert_eq!(&twice, &once);
        prop_assert!(is_canonical);
    }

    #[test]
    fn canonicalize_is_total(path in any::<String>()) {
        let (canonical, _) = canonicalize(&path);
        prop_assert!(canonical.starts_with('/'));
        prop_assert!(canonical.ends_with('/'));
        prop_assert_eq!(canonicalize(&canonical).0, canonical);
    }

    #[test]
    fn canonical_form_is_clean(path in path_strategy()) {
        let (canonical, _) = canonicalize(&path);
        prop_assert!(!canonical.contains("//"));
        prop_assert!(canonical.split('/').all(|s| s != "." && s != ".."));
    }

    #[test]
    fn flag_matches_byte_equality(path in path_strategy()) {
        let (canonical, is_canonical) = canonicalize(&path);
        prop_assert_eq!(is_canonical, canonical == path);
    }
}

#[test]
fn empty_path_is_never_canonical() {
    assert_eq!(canonicalize(""), ("/".to_string(), false));
}
