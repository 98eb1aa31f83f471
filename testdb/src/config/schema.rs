//! Configuration schema definitions.
//!
//! Every field is optional so that files, environment variables and
//! programmatic overrides can each supply a subset; the accessor methods on
//! [`Config`] fill in defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::port::{Port, PortRange, SystemPortAllocator};
use crate::probe::Binaries;
use crate::provision::ProvisionOptions;
use crate::readiness::ReadinessPolicy;
use crate::server::{Toolchain, DEFAULT_STOP_TIMEOUT};

/// Complete configuration structure.
///
/// # Examples
///
/// ```
/// use testdb::config::{Config, PortConfig};
///
/// let config = Config {
///     host: Some("/tmp".to_string()),
///     ports: Some(PortConfig {
///         min: Some(20000),
///         max: Some(30000),
///     }),
///     ..Default::default()
/// };
/// assert_eq!(config.port_range().unwrap().unwrap().len(), 10001);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Executable names or paths.
    pub binaries: Option<BinariesConfig>,

    /// Host or socket directory passed to client tools with `-h`.
    pub host: Option<String>,

    /// Extra arguments appended to the server command line.
    pub server_args: Option<Vec<String>>,

    /// File receiving server stdout and stderr.
    pub server_log: Option<PathBuf>,

    /// Range to allocate server ports from.
    pub ports: Option<PortConfig>,

    /// Startup wait settings.
    pub readiness: Option<ReadinessConfig>,

    /// How long to wait for a killed server to exit (milliseconds).
    pub stop_timeout_ms: Option<u64>,

    /// Also create a role named like each test database.
    pub create_user: Option<bool>,

    /// Stop the server when provisioning fails after launch.
    pub rollback_on_failure: Option<bool>,
}

/// Executable overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BinariesConfig {
    /// Server daemon.
    pub server: Option<String>,
    /// Data directory initializer.
    pub initializer: Option<String>,
    /// Database creator.
    pub creator: Option<String>,
    /// Database dropper.
    pub dropper: Option<String>,
    /// Interactive client.
    pub client: Option<String>,
    /// Role creator.
    pub user_creator: Option<String>,
}

/// Port range configuration. A missing bound defaults to the edge of the
/// unprivileged range.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PortConfig {
    /// Lowest port to allocate.
    pub min: Option<u16>,
    /// Highest port to allocate.
    pub max: Option<u16>,
}

/// Readiness wait configuration, in milliseconds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReadinessConfig {
    /// Total wait budget.
    pub timeout_ms: Option<u64>,
    /// Delay before the first check.
    pub initial_interval_ms: Option<u64>,
    /// Cap on the delay between checks.
    pub max_interval_ms: Option<u64>,
    /// Maximum number of checks.
    pub max_attempts: Option<u32>,
}

impl Config {
    /// Executable names, defaults filled in.
    #[must_use]
    pub fn binaries(&self) -> Binaries {
        let mut binaries = Binaries::default();
        if let Some(ref overrides) = self.binaries {
            let fields = [
                (&mut binaries.server, &overrides.server),
                (&mut binaries.initializer, &overrides.initializer),
                (&mut binaries.creator, &overrides.creator),
                (&mut binaries.dropper, &overrides.dropper),
                (&mut binaries.client, &overrides.client),
                (&mut binaries.user_creator, &overrides.user_creator),
            ];
            for (target, source) in fields {
                if let Some(name) = source {
                    target.clone_from(name);
                }
            }
        }
        binaries
    }

    /// The configured port range, if any.
    ///
    /// # Errors
    ///
    /// Returns an error for zero ports or `min > max`.
    pub fn port_range(&self) -> Result<Option<PortRange>> {
        let Some(ports) = self.ports else {
            return Ok(None);
        };
        let min = Port::try_from(ports.min.unwrap_or(Port::FIRST_UNPRIVILEGED))?;
        let max = Port::try_from(ports.max.unwrap_or(Port::MAX))?;
        Ok(Some(PortRange::new(min, max)?))
    }

    /// Readiness policy, defaults filled in.
    #[must_use]
    pub fn readiness_policy(&self) -> ReadinessPolicy {
        let mut policy = ReadinessPolicy::default();
        if let Some(readiness) = self.readiness {
            if let Some(ms) = readiness.timeout_ms {
                policy.timeout = Duration::from_millis(ms);
            }
            if let Some(ms) = readiness.initial_interval_ms {
                policy.initial_interval = Duration::from_millis(ms);
            }
            if let Some(ms) = readiness.max_interval_ms {
                policy.max_interval = Duration::from_millis(ms);
            }
            if readiness.max_attempts.is_some() {
                policy.max_attempts = readiness.max_attempts;
            }
        }
        policy
    }

    /// Stop timeout, default 10 seconds.
    #[must_use]
    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout_ms
            .map_or(DEFAULT_STOP_TIMEOUT, Duration::from_millis)
    }

    /// Provisioning options.
    #[must_use]
    pub fn provision_options(&self) -> ProvisionOptions {
        ProvisionOptions {
            create_user: self.create_user.unwrap_or(false),
            rollback_on_failure: self.rollback_on_failure.unwrap_or(false),
            readiness: self.readiness_policy(),
        }
    }

    /// Toolchain built from this configuration.
    #[must_use]
    pub fn toolchain(&self) -> Toolchain {
        Toolchain::new(self.binaries())
            .with_host(self.host.clone())
            .with_server_args(self.server_args.clone().unwrap_or_default())
            .with_server_log(self.server_log.clone())
            .with_stop_timeout(self.stop_timeout())
    }

    /// Port allocator honoring the configured range.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured range is invalid.
    pub fn port_allocator(&self) -> Result<SystemPortAllocator> {
        Ok(match self.port_range()? {
            Some(range) => SystemPortAllocator::within(range),
            None => SystemPortAllocator::new(),
        })
    }
}
