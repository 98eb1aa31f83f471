//! Error types for the testdb library.
//!
//! Every failure of an external-process invocation is wrapped with the step
//! and command that produced it, so a failed provisioning run can be
//! diagnosed without re-running it.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use nix::errno::Errno;
use thiserror::Error;

use crate::port::Port;

/// Result type alias for operations that may fail with a testdb error.
///
/// # Examples
///
/// ```
/// use testdb::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(4242)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the testdb library.
#[derive(Debug, Error)]
pub enum Error {
    /// A required executable could not be found on the search path.
    #[error("executable '{name}' not found on PATH")]
    BinaryNotFound {
        /// The executable name that was looked up.
        name: String,
    },

    /// The server process could not be spawned.
    #[error("failed to launch {}: {source}", binary.display())]
    LaunchFailed {
        /// The resolved server executable.
        binary: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Data directory initialization failed.
    #[error("failed to initialize data directory {}: {source}", directory.display())]
    InitFailed {
        /// The directory passed to the initializer.
        directory: PathBuf,
        /// The failed initializer invocation.
        #[source]
        source: CommandError,
    },

    /// The process id does not resolve to a live process.
    #[error("process {pid} not found: {source}")]
    ProcessLookupFailed {
        /// The process id that was looked up.
        pid: u32,
        /// The errno reported by the liveness signal.
        #[source]
        source: Errno,
    },

    /// The termination signal could not be delivered or the process could not be reaped.
    #[error("failed to kill process {pid}: {source}")]
    KillFailed {
        /// The process id that was signalled.
        pid: u32,
        /// The errno reported by the failed call.
        #[source]
        source: Errno,
    },

    /// A killed process did not exit within the stop timeout.
    #[error("process {pid} still alive {}ms after kill", waited.as_millis())]
    StopTimedOut {
        /// The process id that was signalled.
        pid: u32,
        /// How long we waited for it to disappear.
        waited: Duration,
    },

    /// A server is already listening on the allocated port.
    #[error("a server is already running on port {port}")]
    AlreadyRunning {
        /// The port that is already served.
        port: Port,
    },

    /// The launched server never became reachable.
    #[error("server on port {port} failed to start: {reason}")]
    StartupFailed {
        /// The port the server was asked to listen on.
        port: Port,
        /// Why the server is considered down.
        reason: String,
    },

    /// The database was created but does not show up in the listing.
    #[error("database '{name}' not found on port {port} after creation")]
    CreationVerificationFailed {
        /// The database name.
        name: String,
        /// The server port.
        port: Port,
    },

    /// Port inspection is not implemented for this operating system.
    #[error("port inspection is not supported on platform '{platform}'")]
    UnsupportedPlatform {
        /// The platform name, as reported by `std::env::consts::OS`.
        platform: String,
    },

    /// The platform inspection command could not be run.
    #[error("port probe failed: {source}")]
    ProbeCommandFailed {
        /// The failed inspection command.
        #[source]
        source: CommandError,
    },

    /// A database client tool exited unsuccessfully.
    #[error("{step} failed: {source}")]
    CommandFailed {
        /// The provisioning step, e.g. "create database".
        step: &'static str,
        /// The failed invocation.
        #[source]
        source: CommandError,
    },

    /// A wait was aborted through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// No free port could be obtained.
    #[error("no ports available: {reason}")]
    PortUnavailable {
        /// The reason no port was available.
        reason: String,
    },

    /// An invalid port number was provided.
    #[error("invalid port {value}: {reason}")]
    InvalidPort {
        /// The invalid port value.
        value: u16,
        /// The reason the port is invalid.
        reason: String,
    },

    /// An invalid port range was specified.
    #[error("invalid port range {min}-{max}: {reason}")]
    InvalidPortRange {
        /// The minimum port in the range.
        min: u16,
        /// The maximum port in the range.
        max: u16,
        /// The reason the range is invalid.
        reason: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A configuration file could not be parsed.
    #[error("invalid configuration file {}: {source}", path.display())]
    Configuration {
        /// The offending file.
        path: PathBuf,
        /// The YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failed invocation of an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not be started at all.
    #[error("could not run `{command}`: {source}")]
    Spawn {
        /// The rendered command line.
        command: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("`{command}` exited with {status}{}", stderr_suffix(.stderr))]
    Status {
        /// The rendered command line.
        command: String,
        /// The exit status.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl CommandError {
    /// The rendered command line of the failed invocation.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. } | Self::Status { command, .. } => command,
        }
    }
}

impl From<crate::port::InvalidPortError> for Error {
    fn from(err: crate::port::InvalidPortError) -> Self {
        Self::InvalidPort {
            value: err.value,
            reason: err.reason,
        }
    }
}

impl From<crate::port::InvalidPortRangeError> for Error {
    fn from(err: crate::port::InvalidPortRangeError) -> Self {
        Self::InvalidPortRange {
            min: err.min.value(),
            max: err.max.value(),
            reason: err.reason,
        }
    }
}

impl Error {
    /// Check if error reports a missing executable.
    ///
    /// # Examples
    ///
    /// ```
    /// use testdb::Error;
    ///
    /// let err = Error::BinaryNotFound { name: "initdb".into() };
    /// assert!(err.is_binary_not_found());
    /// ```
    #[must_use]
    pub fn is_binary_not_found(&self) -> bool {
        matches!(self, Self::BinaryNotFound { .. })
    }

    /// Check if error reports a server already occupying the port.
    #[must_use]
    pub fn is_already_running(&self) -> bool {
        matches!(self, Self::AlreadyRunning { .. })
    }
}
