//! Property-based tests for host filtering

use proptest::prelude::*;
use sshbook_core::HostRecord;

// Strategy for generating lowercase words used as field values
fn arb_word() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,10}".prop_map(|s| s)
}

// Strategy for generating host records
fn arb_record() -> impl Strategy<Value = HostRecord> {
    (
        arb_word(),
        prop::collection::vec(arb_word(), 0..3),
        arb_word(),
        arb_word(),
        prop::collection::btree_set(arb_word(), 0..3),
    )
        .prop_map(|(identity, extra_aliases, hostname, user, tags)| {
            let mut record = HostRecord::new(identity.clone());
            record.aliases = std::iter::once(identity).chain(extra_aliases).collect();
            record.hostname = hostname;
            record.user = user;
            record.tags = tags;
            record
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The empty query matches every record
    #[test]
    fn prop_empty_query_matches_all(record in arb_record()) {
        prop_assert!(record.matches(""));
    }

    // Any field value matches itself regardless of case
    #[test]
    fn prop_fields_match_case_insensitively(record in arb_record()) {
        prop_assert!(record.matches(&record.hostname.to_uppercase()));
        prop_assert!(record.matches(&record.user.to_uppercase()));
        prop_assert!(record.matches(&record.identity.to_uppercase()));
        for tag in &record.tags {
            prop_assert!(record.matches(&tag.to_uppercase()));
        }
    }

    // A query found in no field matches nothing
    #[test]
    fn prop_unrelated_query_does_not_match(record in arb_record()) {
        // Generated fields never contain an underscore.
        prop_assert!(!record.matches("_"));
    }

    // Substrings of a field match
    #[test]
    fn prop_substring_matches(record in arb_record(), start in 0usize..10, len in 1usize..10) {
        let hostname = &record.hostname;
        let start = start.min(hostname.len() - 1);
        let end = (start + len).min(hostname.len());
        prop_assert!(record.matches(&hostname[start..end]));
    }
}
