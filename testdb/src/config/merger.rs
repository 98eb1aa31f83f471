//! Configuration merging and precedence handling.

use crate::config::loader::ConfigSource;
use crate::config::schema::{BinariesConfig, Config, PortConfig, ReadinessConfig};

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use testdb::config::{Config, ConfigMerger};
///
/// let low = Config { host: Some("low".to_string()), ..Default::default() };
/// let high = Config { host: Some("high".to_string()), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.host, Some("high".to_string()));
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge sources ordered from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();
        for source in sources {
            Self::merge_into(&mut result, &source.config);
        }
        result
    }

    /// Merge source config into target (source overwrites target).
    ///
    /// # Merging Rules
    ///
    /// - Simple fields: source overwrites if Some
    /// - Nested configs: field-by-field merge
    /// - `server_args`: complete replacement
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.host.is_some() {
            target.host.clone_from(&source.host);
        }

        if source.server_args.is_some() {
            target.server_args.clone_from(&source.server_args);
        }

        if source.server_log.is_some() {
            target.server_log.clone_from(&source.server_log);
        }

        if source.stop_timeout_ms.is_some() {
            target.stop_timeout_ms = source.stop_timeout_ms;
        }

        if source.create_user.is_some() {
            target.create_user = source.create_user;
        }

        if source.rollback_on_failure.is_some() {
            target.rollback_on_failure = source.rollback_on_failure;
        }

        if let Some(ref source_binaries) = source.binaries {
            let merged = Self::merge_binaries(
                target.binaries.as_ref().unwrap_or(&BinariesConfig::default()),
                source_binaries,
            );
            target.binaries = Some(merged);
        }

        if let Some(source_ports) = source.ports {
            target.ports = Some(match target.ports {
                Some(target_ports) => Self::merge_ports(target_ports, source_ports),
                None => source_ports,
            });
        }

        if let Some(source_readiness) = source.readiness {
            target.readiness = Some(match target.readiness {
                Some(target_readiness) => {
                    Self::merge_readiness(target_readiness, source_readiness)
                }
                None => source_readiness,
            });
        }
    }

    fn merge_binaries(target: &BinariesConfig, source: &BinariesConfig) -> BinariesConfig {
        BinariesConfig {
            server: source.server.clone().or_else(|| target.server.clone()),
            initializer: source
                .initializer
                .clone()
                .or_else(|| target.initializer.clone()),
            creator: source.creator.clone().or_else(|| target.creator.clone()),
            dropper: source.dropper.clone().or_else(|| target.dropper.clone()),
            client: source.client.clone().or_else(|| target.client.clone()),
            user_creator: source
                .user_creator
                .clone()
                .or_else(|| target.user_creator.clone()),
        }
    }

    fn merge_ports(target: PortConfig, source: PortConfig) -> PortConfig {
        PortConfig {
            min: source.min.or(target.min),
            max: source.max.or(target.max),
        }
    }

    fn merge_readiness(target: ReadinessConfig, source: ReadinessConfig) -> ReadinessConfig {
        ReadinessConfig {
            timeout_ms: source.timeout_ms.or(target.timeout_ms),
            initial_interval_ms: source.initial_interval_ms.or(target.initial_interval_ms),
            max_interval_ms: source.max_interval_ms.or(target.max_interval_ms),
            max_attempts: source.max_attempts.or(target.max_attempts),
        }
    }
}
