//! Configuration validation.

use crate::config::schema::{BinariesConfig, Config, PortConfig, ReadinessConfig};
use crate::error::{Error, Result};
use crate::port::Port;

/// Validates a merged configuration.
///
/// # Examples
///
/// ```
/// use testdb::config::{Config, ConfigValidator};
///
/// let config = Config::default();
/// ConfigValidator::validate(&config).unwrap();
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        if let Some(ref binaries) = config.binaries {
            Self::validate_binaries(binaries)?;
        }

        if let Some(ref host) = config.host {
            Self::validate_non_empty("host", host)?;
        }

        if let Some(ref args) = config.server_args {
            if args.iter().any(|arg| arg.contains('\0')) {
                return Err(Error::Validation {
                    field: "server_args".into(),
                    message: "Arguments cannot contain null bytes".into(),
                });
            }
        }

        if let Some(ports) = config.ports {
            Self::validate_ports(ports)?;
        }

        if let Some(readiness) = config.readiness {
            Self::validate_readiness(readiness)?;
        }

        if config.stop_timeout_ms == Some(0) {
            return Err(Error::Validation {
                field: "stop_timeout_ms".into(),
                message: "Timeout must be greater than 0".into(),
            });
        }

        Ok(())
    }

    fn validate_binaries(binaries: &BinariesConfig) -> Result<()> {
        let fields = [
            ("binaries.server", &binaries.server),
            ("binaries.initializer", &binaries.initializer),
            ("binaries.creator", &binaries.creator),
            ("binaries.dropper", &binaries.dropper),
            ("binaries.client", &binaries.client),
            ("binaries.user_creator", &binaries.user_creator),
        ];
        for (field, value) in fields {
            if let Some(name) = value {
                Self::validate_non_empty(field, name)?;
            }
        }
        Ok(())
    }

    fn validate_non_empty(field: &str, value: &str) -> Result<()> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot be empty or only whitespace".into(),
            });
        }

        if trimmed.contains('\0') {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot contain null bytes".into(),
            });
        }

        Ok(())
    }

    fn validate_ports(ports: PortConfig) -> Result<()> {
        let min = ports.min.unwrap_or(Port::FIRST_UNPRIVILEGED);
        let max = ports.max.unwrap_or(Port::MAX);

        for (field, value) in [("ports.min", min), ("ports.max", max)] {
            Port::try_from(value).map_err(|_| Error::Validation {
                field: field.into(),
                message: format!("Invalid port number: {value}"),
            })?;
        }

        if max < min {
            return Err(Error::Validation {
                field: "ports".into(),
                message: "max must be >= min".into(),
            });
        }

        Ok(())
    }

    fn validate_readiness(readiness: ReadinessConfig) -> Result<()> {
        let durations = [
            ("readiness.timeout_ms", readiness.timeout_ms),
            ("readiness.initial_interval_ms", readiness.initial_interval_ms),
            ("readiness.max_interval_ms", readiness.max_interval_ms),
        ];
        for (field, value) in durations {
            if value == Some(0) {
                return Err(Error::Validation {
                    field: field.into(),
                    message: "Must be greater than 0".into(),
                });
            }
        }

        if readiness.max_attempts == Some(0) {
            return Err(Error::Validation {
                field: "readiness.max_attempts".into(),
                message: "Must be greater than 0".into(),
            });
        }

        let config = Config {
            readiness: Some(readiness),
            ..Default::default()
        };
        let policy = config.readiness_policy();
        if policy.initial_interval > policy.max_interval {
            return Err(Error::Validation {
                field: "readiness".into(),
                message: "initial_interval_ms must be <= max_interval_ms".into(),
            });
        }

        Ok(())
    }
}
