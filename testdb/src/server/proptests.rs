//! Property-based tests for database listing parsing.

use super::catalog::{contains_exact, parse_database_list};
use proptest::prelude::*;

fn db_name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,30}"
}

proptest! {
    #[test]
    fn listing_recovers_every_name(names in prop::collection::vec(db_name(), 0..20)) {
        let listing: String = names
            .iter()
            .map(|name| format!(" {name:<12} | owner | UTF8 | libc |\n"))
            .collect();
        let parsed = parse_database_list(&format!("{listing}\n\n"));
        prop_assert_eq!(parsed, names);
    }

    #[test]
    fn parsed_names_are_trimmed_and_non_empty(output in "[ a-z|\n]{0,200}") {
        for name in parse_database_list(&output) {
            prop_assert!(!name.is_empty());
            prop_assert_eq!(name.trim(), name.as_str());
            prop_assert!(!name.contains('|'));
        }
    }

    #[test]
    fn contains_exact_matches_membership(
        names in prop::collection::vec(db_name(), 0..10),
        needle in db_name(),
    ) {
        let expected = names.iter().any(|n| *n == needle);
        prop_assert_eq!(contains_exact(&needle, &names), expected);
    }

    #[test]
    fn padded_needle_never_matches(names in prop::collection::vec(db_name(), 1..10)) {
        let padded = format!(" {}", names[0]);
        prop_assert!(!contains_exact(&padded, &names));
    }
}

proptest! {
    #[test]
    fn unknown_binaries_are_reported_in_order(
        names in prop::collection::vec("testdb-absent-[a-z]{8}", 0..6),
    ) {
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let installed = crate::probe::check_names_installed(&refs);
        prop_assert_eq!(installed.missing(), names.as_slice());
        prop_assert_eq!(installed.all_present(), names.is_empty());
    }
}
