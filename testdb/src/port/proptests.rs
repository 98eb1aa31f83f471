//! Property-based tests for `Port` and `PortRange` types.

use super::{Port, PortRange};
use proptest::prelude::*;

const MIN_VALID_PORT: u16 = Port::MIN;

const MAX_VALID_PORT: u16 = Port::MAX;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn port_always_in_valid_range(port in MIN_VALID_PORT..=MAX_VALID_PORT) {
        let p = Port::try_from(port);
        prop_assert!(p.is_ok());
        prop_assert_eq!(p.unwrap().value(), port);
    }

    #[test]
    fn port_is_privileged_boundary(port in MIN_VALID_PORT..=MAX_VALID_PORT) {
        let p = Port::try_from(port).unwrap();
        prop_assert_eq!(p.is_privileged(), port < 1024);
    }

    // Parsing the trailing component of a listing agrees with TryFrom.
    #[test]
    fn port_parses_from_decimal(port in MIN_VALID_PORT..=MAX_VALID_PORT) {
        let parsed: Port = port.to_string().parse().unwrap();
        prop_assert_eq!(parsed.value(), port);
    }

    #[test]
    fn port_range_contains_accuracy(start in MIN_VALID_PORT..MAX_VALID_PORT, len in 1u16..=100, test_port in MIN_VALID_PORT..=MAX_VALID_PORT) {
        let end = start.saturating_add(len);
        let range = PortRange::new(Port::try_from(start).unwrap(), Port::try_from(end).unwrap()).unwrap();
        let p = Port::try_from(test_port).unwrap();

        prop_assert_eq!(range.contains(p), test_port >= start && test_port <= end);
    }

    #[test]
    fn port_range_len_correct(start in MIN_VALID_PORT..=MAX_VALID_PORT, end in MIN_VALID_PORT..=MAX_VALID_PORT) {
        let range = PortRange::new(Port::try_from(start).unwrap(), Port::try_from(end).unwrap());
        if start <= end {
            prop_assert_eq!(range.unwrap().len(), u32::from(end - start) + 1);
        } else {
            prop_assert!(range.is_err());
        }
    }
}
