//! Property-based tests for configuration merging and validation.

use super::merger::ConfigMerger;
use super::schema::{Config, PortConfig, ReadinessConfig};
use super::validator::ConfigValidator;
use proptest::prelude::*;

fn port_config_strategy() -> impl Strategy<Value = PortConfig> {
    (1u16..=65535)
        .prop_flat_map(|min| (Just(min), min..=65535))
        .prop_map(|(min, max)| PortConfig {
            min: Some(min),
            max: Some(max),
        })
}

fn readiness_strategy() -> impl Strategy<Value = ReadinessConfig> {
    (1u64..=1000, 1u64..=60_000, prop::option::of(1u32..=100)).prop_map(
        |(initial, extra, attempts)| ReadinessConfig {
            timeout_ms: Some(initial + extra),
            initial_interval_ms: Some(initial),
            max_interval_ms: Some(initial + extra / 2),
            max_attempts: attempts,
        },
    )
}

fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of("/[a-z]{1,20}"),
        prop::option::of(port_config_strategy()),
        prop::option::of(readiness_strategy()),
        prop::option::of(1u64..=60_000),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(
            |(host, ports, readiness, stop_timeout_ms, create_user, rollback)| Config {
                host,
                ports,
                readiness,
                stop_timeout_ms,
                create_user,
                rollback_on_failure: rollback,
                ..Default::default()
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut merged = low.clone();
        ConfigMerger::merge_into(&mut merged, &high);

        prop_assert_eq!(merged.host, high.host.or(low.host));
        prop_assert_eq!(merged.stop_timeout_ms, high.stop_timeout_ms.or(low.stop_timeout_ms));
        prop_assert_eq!(merged.create_user, high.create_user.or(low.create_user));
        prop_assert_eq!(
            merged.rollback_on_failure,
            high.rollback_on_failure.or(low.rollback_on_failure)
        );
    }

    #[test]
    fn merge_with_empty_is_identity(config in config_strategy()) {
        let mut merged = config.clone();
        ConfigMerger::merge_into(&mut merged, &Config::default());
        prop_assert_eq!(&merged, &config);

        let mut from_empty = Config::default();
        ConfigMerger::merge_into(&mut from_empty, &config);
        prop_assert_eq!(from_empty, config);
    }

    #[test]
    fn generated_configs_validate(config in config_strategy()) {
        prop_assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn valid_configs_yield_consistent_values(config in config_strategy()) {
        let policy = config.readiness_policy();
        prop_assert!(policy.initial_interval <= policy.max_interval);
        prop_assert!(policy.max_attempts != Some(0));

        let range = config.port_range().unwrap();
        if let Some(range) = range {
            prop_assert!(range.min() <= range.max());
        }
    }
}
