//! Lifecycle control of a PostgreSQL server process.
//!
//! [`ServerControl`] covers the three lifecycle steps (initialize a data
//! directory, start a server, stop it); [`Catalog`] covers what the
//! orchestrator does inside a running server. [`Toolchain`] implements both
//! by shelling out to the PostgreSQL executables found on `PATH`.

pub mod catalog;

#[cfg(test)]
mod proptests;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::waitpid;
use nix::unistd::Pid;

use crate::command;
use crate::error::{Error, Result};
use crate::probe::{find_executable, process, Binaries};
use crate::Port;

pub use catalog::{contains_exact, parse_database_list, Catalog};

/// Default upper bound on waiting for a killed server that is not our child.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A server process started by [`ServerControl::start_server`].
///
/// The caller owns it: nothing stops the process automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProcess {
    pid: u32,
    data_directory: PathBuf,
    port: Port,
}

impl ServerProcess {
    /// Describe a launched server.
    #[must_use]
    pub fn new(pid: u32, data_directory: impl Into<PathBuf>, port: Port) -> Self {
        Self {
            pid,
            data_directory: data_directory.into(),
            port,
        }
    }

    /// OS process id of the server daemon.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Data directory the server was started on.
    #[must_use]
    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    /// Port the server was asked to listen on.
    #[must_use]
    pub const fn port(&self) -> Port {
        self.port
    }
}

/// Data directory initialization, server start and server stop.
pub trait ServerControl {
    /// Run the initializer on `dir`.
    ///
    /// The directory must exist or be creatable by the initializer.
    ///
    /// # Errors
    ///
    /// [`Error::BinaryNotFound`] if the initializer is missing,
    /// [`Error::InitFailed`] if it exits unsuccessfully.
    fn init_data_directory(&self, dir: &Path) -> Result<()>;

    /// Launch a server on `dir` listening on `port` and return at once,
    /// without waiting for it to accept connections.
    ///
    /// # Errors
    ///
    /// [`Error::BinaryNotFound`] or [`Error::LaunchFailed`].
    fn start_server(&self, dir: &Path, port: Port) -> Result<ServerProcess>;

    /// Kill `pid` and block until it has exited.
    ///
    /// # Errors
    ///
    /// [`Error::ProcessLookupFailed`] if `pid` is not alive,
    /// [`Error::KillFailed`] if it cannot be signalled or reaped, and
    /// [`Error::StopTimedOut`] if it outlives the stop timeout.
    fn stop_server(&self, pid: u32) -> Result<()>;

    /// Whether a server launched by this controller has already exited.
    ///
    /// Pids this controller did not start report `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the exit status cannot be queried.
    fn server_exited(&self, _pid: u32) -> Result<bool> {
        Ok(false)
    }
}

/// The PostgreSQL executables, resolved by name on each use.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use testdb::probe::Binaries;
/// use testdb::server::Toolchain;
///
/// let toolchain = Toolchain::new(Binaries::default())
///     .with_host(Some("/tmp/pg-sockets".to_string()))
///     .with_server_args(vec!["-k".to_string(), "/tmp/pg-sockets".to_string()])
///     .with_stop_timeout(Duration::from_secs(5));
/// assert_eq!(toolchain.binaries().server, "postgres");
/// ```
#[derive(Debug, Clone)]
pub struct Toolchain {
    binaries: Binaries,
    host: Option<String>,
    server_args: Vec<String>,
    server_log: Option<PathBuf>,
    stop_timeout: Duration,
    children: Arc<Mutex<HashMap<u32, Child>>>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(Binaries::default())
    }
}

impl Toolchain {
    /// Toolchain using `binaries` with no host override and no server log.
    #[must_use]
    pub fn new(binaries: Binaries) -> Self {
        Self {
            binaries,
            host: None,
            server_args: Vec::new(),
            server_log: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            children: Arc::default(),
        }
    }

    /// Host or socket directory passed to client tools with `-h`.
    #[must_use]
    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    /// Extra arguments appended to the server command line.
    #[must_use]
    pub fn with_server_args(mut self, args: Vec<String>) -> Self {
        self.server_args = args;
        self
    }

    /// File receiving the server's stdout and stderr (appended).
    #[must_use]
    pub fn with_server_log(mut self, path: Option<PathBuf>) -> Self {
        self.server_log = path;
        self
    }

    /// How long `stop_server` waits for a non-child process to disappear.
    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// The executable names in use.
    #[must_use]
    pub fn binaries(&self) -> &Binaries {
        &self.binaries
    }

    /// The configured client host, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub(crate) fn locate(name: &str) -> Result<PathBuf> {
        find_executable(name).ok_or_else(|| Error::BinaryNotFound {
            name: name.to_string(),
        })
    }

    /// Servers launched by this toolchain (and its clones) not yet stopped.
    fn children(&self) -> MutexGuard<'_, HashMap<u32, Child>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn server_output(&self) -> Result<(Stdio, Stdio)> {
        match &self.server_log {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                let stderr = file.try_clone()?;
                Ok((Stdio::from(file), Stdio::from(stderr)))
            }
            None => Ok((Stdio::null(), Stdio::null())),
        }
    }
}

impl ServerControl for Toolchain {
    fn init_data_directory(&self, dir: &Path) -> Result<()> {
        let binary = Self::locate(&self.binaries.initializer)?;
        let mut cmd = Command::new(binary);
        cmd.arg(dir);

        command::run(&mut cmd).map_err(|source| Error::InitFailed {
            directory: dir.to_path_buf(),
            source,
        })?;
        info!("initialized data directory {}", dir.display());
        Ok(())
    }

    fn start_server(&self, dir: &Path, port: Port) -> Result<ServerProcess> {
        let binary = Self::locate(&self.binaries.server)?;
        let (stdout, stderr) = self.server_output()?;

        let mut cmd = Command::new(&binary);
        cmd.arg("-D")
            .arg(dir)
            .arg("-p")
            .arg(port.to_string())
            .args(&self.server_args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);
        debug!("launching `{}`", command::describe(&cmd));

        let child = cmd
            .spawn()
            .map_err(|source| Error::LaunchFailed { binary, source })?;
        let pid = child.id();
        info!("started {} pid {pid} on port {port}", self.binaries.server);
        self.children().insert(pid, child);

        Ok(ServerProcess::new(pid, dir, port))
    }

    fn stop_server(&self, pid: u32) -> Result<()> {
        // Dropping the handle neither kills nor waits; `reap` collects the status.
        self.children().remove(&pid);

        let target = i32::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .map(Pid::from_raw)
            .ok_or(Error::ProcessLookupFailed {
                pid,
                source: Errno::ESRCH,
            })?;

        match kill(target, None) {
            Ok(()) | Err(Errno::EPERM) => {}
            Err(source) => return Err(Error::ProcessLookupFailed { pid, source }),
        }

        kill(target, Signal::SIGKILL).map_err(|source| Error::KillFailed { pid, source })?;
        reap(pid, target, self.stop_timeout)?;
        info!("stopped pid {pid}");
        Ok(())
    }

    fn server_exited(&self, pid: u32) -> Result<bool> {
        let mut children = self.children();
        let Some(child) = children.get_mut(&pid) else {
            return Ok(false);
        };
        match child.try_wait()? {
            Some(status) => {
                debug!("server pid {pid} exited: {status}");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Wait for a killed process to be gone.
///
/// Our own children are reaped with `waitpid`; anything else is polled with
/// signal zero until it disappears or `timeout` elapses.
fn reap(pid: u32, target: Pid, timeout: Duration) -> Result<()> {
    loop {
        match waitpid(target, None) {
            Ok(status) => {
                debug!("reaped pid {pid}: {status:?}");
                return Ok(());
            }
            Err(Errno::EINTR) => {}
            Err(Errno::ECHILD) => return wait_for_exit(pid, timeout),
            Err(source) => return Err(Error::KillFailed { pid, source }),
        }
    }
}

fn wait_for_exit(pid: u32, timeout: Duration) -> Result<()> {
    let started = Instant::now();
    while process::signal_zero(pid)? {
        let waited = started.elapsed();
        if waited >= timeout {
            return Err(Error::StopTimedOut { pid, waited });
        }
        thread::sleep(STOP_POLL_INTERVAL);
    }
    Ok(())
}
