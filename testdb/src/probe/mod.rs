//! Environment probing: installed binaries and running servers.
//!
//! Two questions are answered here:
//!
//! - Are the PostgreSQL executables on the search path? ([`check_installed`])
//! - Is a server running, anywhere or on a given port? ([`Probe::is_running`])
//!
//! Process enumeration and port inspection sit behind the [`ProcessTable`]
//! and [`PortProbe`] traits so callers can substitute them in tests.

pub mod installed;
pub mod listening;
pub mod process;

use log::debug;

use crate::error::Result;
use crate::Port;

pub use installed::{check_installed, check_names_installed, find_executable, Binaries, InstalledSet};
pub use listening::{platform_probe, MockPortProbe, PortProbe};
pub use process::{MockProcessTable, ProcessEntry, ProcessTable, SystemProcessTable};

/// Answers "is a server running?" for one server executable name.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use testdb::probe::{MockPortProbe, MockProcessTable, Probe, ProcessEntry};
/// use testdb::Port;
///
/// let port = Port::try_from(54321).unwrap();
/// let probe = Probe::new(
///     "postgres",
///     Box::new(MockProcessTable::new(vec![ProcessEntry::new("postgres", 42)])),
///     Box::new(MockPortProbe::new(HashSet::from([port]))),
/// );
///
/// assert!(probe.is_running(None).unwrap());
/// assert!(probe.is_running(Some(port)).unwrap());
/// assert!(!probe.is_running(Some(Port::try_from(54322).unwrap())).unwrap());
/// ```
pub struct Probe {
    server_name: String,
    processes: Box<dyn ProcessTable>,
    ports: Box<dyn PortProbe>,
}

impl Probe {
    /// Build a probe from explicit collaborators.
    #[must_use]
    pub fn new(
        server_name: &str,
        processes: Box<dyn ProcessTable>,
        ports: Box<dyn PortProbe>,
    ) -> Self {
        Self {
            server_name: server_name.to_string(),
            processes,
            ports,
        }
    }

    /// The production probe for `server_name` on this platform.
    #[must_use]
    pub fn system(server_name: &str) -> Self {
        Self::new(
            server_name,
            Box::new(SystemProcessTable),
            platform_probe(server_name),
        )
    }

    /// The server executable name this probe looks for.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Whether a server is running.
    ///
    /// Without a port, any live process named like the server counts; this
    /// does not tell which port that process serves. With a port, the
    /// platform port probe decides.
    ///
    /// # Errors
    ///
    /// Returns an error if process or port inspection fails, including
    /// [`crate::Error::UnsupportedPlatform`] for a port query on an
    /// unsupported platform.
    pub fn is_running(&self, port: Option<Port>) -> Result<bool> {
        match port {
            Some(port) => {
                let listening = self.ports.is_listening(port)?;
                debug!("{} listening on {port}: {listening}", self.server_name);
                Ok(listening)
            }
            None => self.any_server_alive(),
        }
    }

    /// Whether the specific process `pid` is alive.
    ///
    /// # Errors
    ///
    /// Returns an error if liveness cannot be determined.
    pub fn is_process_alive(&self, pid: u32) -> Result<bool> {
        self.processes.is_alive(pid)
    }

    fn any_server_alive(&self) -> Result<bool> {
        for entry in self.processes.processes()? {
            if entry.name == self.server_name && self.processes.is_alive(entry.pid)? {
                debug!("found live {} process {}", self.server_name, entry.pid);
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl std::fmt::Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}
