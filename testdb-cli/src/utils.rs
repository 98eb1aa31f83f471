//! Helpers shared by the CLI commands: global options, configuration
//! loading and argument conversion.

use crate::error::CliError;
use std::path::PathBuf;
use testdb::{Config, ConfigBuilder, Error as LibError, Port, Probe};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Explicit configuration file.
    pub config: Option<PathBuf>,
}

/// Load hierarchical configuration.
///
/// Discovered files, then `--config`, then `TESTDB_*` variables; see
/// [`ConfigBuilder::build`].
pub fn load_configuration(global: &GlobalOptions) -> Result<Config, CliError> {
    let mut builder = ConfigBuilder::new();
    if let Some(ref path) = global.config {
        builder = builder.with_file(path);
    }

    builder.build().map_err(|e| match e {
        LibError::Io(io) => CliError::Io(io),
        other => CliError::Config(other.to_string()),
    })
}

/// Convert a raw `--port` value.
pub fn parse_port(value: u16) -> Result<Port, CliError> {
    Port::try_from(value).map_err(|e| CliError::InvalidArguments(e.to_string()))
}

/// The system probe for the configured server executable.
pub fn probe_for(config: &Config) -> Probe {
    Probe::system(config.binaries().server_process_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_rejects_zero() {
        let err = parse_port(0).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(parse_port(5432).unwrap().value(), 5432);
    }

    #[test]
    fn test_missing_explicit_config_is_config_error() {
        let global = GlobalOptions {
            config: Some(PathBuf::from("/nonexistent/testdb-ci.yaml")),
            ..GlobalOptions::default()
        };
        let err = load_configuration(&global).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}
