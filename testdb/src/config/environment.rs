//! Environment variable handling for configuration overrides.
//!
//! `TESTDB_*` variables override values from configuration files.

use crate::config::schema::Config;
use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use testdb::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable value is invalid
    /// (e.g., non-numeric port, invalid boolean).
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Ok(host) = env::var("TESTDB_HOST") {
            config.host = Some(host);
        }

        if let Ok(path) = env::var("TESTDB_SERVER_LOG") {
            config.server_log = Some(PathBuf::from(path));
        }

        Self::apply_binary_overrides(config);
        Self::apply_port_overrides(config)?;

        if let Ok(ms) = env::var("TESTDB_READINESS_TIMEOUT_MS") {
            let readiness = config.readiness.get_or_insert_with(Default::default);
            readiness.timeout_ms = Some(Self::parse_number("TESTDB_READINESS_TIMEOUT_MS", &ms)?);
        }

        if let Ok(ms) = env::var("TESTDB_STOP_TIMEOUT_MS") {
            config.stop_timeout_ms = Some(Self::parse_number("TESTDB_STOP_TIMEOUT_MS", &ms)?);
        }

        if let Ok(val) = env::var("TESTDB_CREATE_USER") {
            config.create_user = Some(Self::parse_bool("TESTDB_CREATE_USER", &val)?);
        }

        if let Ok(val) = env::var("TESTDB_ROLLBACK_ON_FAILURE") {
            config.rollback_on_failure =
                Some(Self::parse_bool("TESTDB_ROLLBACK_ON_FAILURE", &val)?);
        }

        Ok(())
    }

    fn apply_binary_overrides(config: &mut Config) {
        let vars = [
            "TESTDB_SERVER_BIN",
            "TESTDB_INITDB_BIN",
            "TESTDB_CREATEDB_BIN",
            "TESTDB_DROPDB_BIN",
            "TESTDB_PSQL_BIN",
            "TESTDB_CREATEUSER_BIN",
        ];
        let values: Vec<Option<String>> = vars.iter().map(|var| env::var(var).ok()).collect();
        if values.iter().all(Option::is_none) {
            return;
        }

        let binaries = config.binaries.get_or_insert_with(Default::default);
        let slots = [
            &mut binaries.server,
            &mut binaries.initializer,
            &mut binaries.creator,
            &mut binaries.dropper,
            &mut binaries.client,
            &mut binaries.user_creator,
        ];
        for (slot, value) in slots.into_iter().zip(values) {
            if value.is_some() {
                *slot = value;
            }
        }
    }

    fn apply_port_overrides(config: &mut Config) -> Result<()> {
        let mut ports = config.ports.unwrap_or_default();
        let mut modified = false;

        if let Ok(min) = env::var("TESTDB_PORT_MIN") {
            ports.min = Some(Self::parse_number("TESTDB_PORT_MIN", &min)?);
            modified = true;
        }

        if let Ok(max) = env::var("TESTDB_PORT_MAX") {
            ports.max = Some(Self::parse_number("TESTDB_PORT_MAX", &max)?);
            modified = true;
        }

        if modified {
            config.ports = Some(ports);
        }

        Ok(())
    }

    /// Parse a boolean value from a string.
    ///
    /// Accepts: true/1/yes/on for true, false/0/no/off for false (case-insensitive).
    pub(crate) fn parse_bool(field: &str, s: &str) -> Result<bool> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::Validation {
                field: field.into(),
                message: format!(
                    "Invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"
                ),
            }),
        }
    }

    fn parse_number<T: FromStr>(field: &str, s: &str) -> Result<T> {
        s.trim().parse().map_err(|_| Error::Validation {
            field: field.into(),
            message: format!("Invalid number: '{s}'"),
        })
    }
}
