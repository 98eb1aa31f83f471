//! Provisioning a ready-to-use test database.
//!
//! [`Provisioner::start_test_database`] walks a fixed sequence of stages:
//! allocate a port, make sure nothing already serves it, initialize the data
//! directory, launch the server, wait until it listens, create the database
//! (and optionally a user of the same name), and verify the database exists.
//! The first failing stage ends the run with that stage's error.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::port::{PortAllocator, SystemPortAllocator};
use crate::probe::Probe;
use crate::readiness::{wait_until, CancellationToken, Readiness, ReadinessPolicy};
use crate::server::{Catalog, ServerControl, ServerProcess, Toolchain};
use crate::Port;

/// A provisioned database on a running server.
///
/// The server keeps running until [`Provisioner::stop_test_database`] (or
/// [`ServerControl::stop_server`] with `pid`) is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDatabase {
    /// Server process id.
    pub pid: u32,
    /// Port the server listens on.
    pub port: Port,
    /// The server's data directory.
    pub data_directory: PathBuf,
    /// Name of the created database.
    pub name: String,
}

/// Progress of one provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProvisionStage {
    /// Nothing done yet.
    Idle,
    /// A free port was chosen.
    PortAllocated,
    /// The data directory was initialized.
    DirectoryInitialized,
    /// The server process was spawned.
    ServerLaunched,
    /// The server is alive and listening.
    ServerConfirmedUp,
    /// The database (and user, if requested) was created.
    DatabaseCreated,
    /// The database shows up in the server's listing.
    Verified,
}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PortAllocated => "port allocated",
            Self::DirectoryInitialized => "directory initialized",
            Self::ServerLaunched => "server launched",
            Self::ServerConfirmedUp => "server confirmed up",
            Self::DatabaseCreated => "database created",
            Self::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// Knobs for [`Provisioner::start_test_database`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionOptions {
    /// Also create a role named like the database.
    pub create_user: bool,
    /// Stop the server when a stage after launch fails.
    ///
    /// Off by default, leaving the failed server up for inspection.
    pub rollback_on_failure: bool,
    /// How to wait for the server to come up.
    pub readiness: ReadinessPolicy,
}

/// Runs the provisioning sequence against a toolchain, port allocator and
/// probe.
///
/// # Examples
///
/// ```no_run
/// use testdb::probe::Probe;
/// use testdb::provision::Provisioner;
/// use testdb::server::Toolchain;
/// use testdb::{ScratchSpace, SystemPortAllocator};
///
/// let scratch = ScratchSpace::new()?;
/// let provisioner = Provisioner::new(
///     Toolchain::default(),
///     SystemPortAllocator::new(),
///     Probe::system("postgres"),
/// );
///
/// let db = provisioner.start_test_database(&scratch.data_dir("fargle"), "fargle")?;
/// println!("postgres pid {} on port {}", db.pid, db.port);
/// provisioner.stop_test_database(&db)?;
/// # Ok::<(), testdb::Error>(())
/// ```
#[derive(Debug)]
pub struct Provisioner<T, A> {
    toolchain: T,
    allocator: A,
    probe: Probe,
    options: ProvisionOptions,
    cancel: Option<CancellationToken>,
}

impl<T, A> Provisioner<T, A>
where
    T: ServerControl + Catalog,
    A: PortAllocator,
{
    /// Provisioner with default options.
    #[must_use]
    pub fn new(toolchain: T, allocator: A, probe: Probe) -> Self {
        Self {
            toolchain,
            allocator,
            probe,
            options: ProvisionOptions::default(),
            cancel: None,
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: ProvisionOptions) -> Self {
        self.options = options;
        self
    }

    /// Let `token` abort the readiness wait.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The toolchain in use.
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// The probe in use.
    pub fn probe(&self) -> &Probe {
        &self.probe
    }

    /// The options in use.
    pub fn options(&self) -> &ProvisionOptions {
        &self.options
    }

    /// Start a server on `dir` and create database `name` in it.
    ///
    /// Each call allocates a new port and starts a new server process.
    ///
    /// # Errors
    ///
    /// - [`Error::PortUnavailable`] if no port can be allocated.
    /// - [`Error::AlreadyRunning`] if a server already listens on the port;
    ///   nothing is initialized or launched in that case.
    /// - Initializer and launch errors from [`ServerControl`].
    /// - [`Error::StartupFailed`] if the server dies or never listens.
    /// - [`Error::CommandFailed`] if database or user creation fails.
    /// - [`Error::CreationVerificationFailed`] if the database is missing
    ///   afterwards.
    ///
    /// Errors after launch leave the server running unless
    /// `rollback_on_failure` is set.
    pub fn start_test_database(&self, dir: &Path, name: &str) -> Result<TestDatabase> {
        stage(ProvisionStage::Idle, name);

        let port = self.allocator.allocate()?;
        stage(ProvisionStage::PortAllocated, name);

        if self.probe.is_running(Some(port))? {
            return Err(Error::AlreadyRunning { port });
        }

        self.toolchain.init_data_directory(dir)?;
        stage(ProvisionStage::DirectoryInitialized, name);

        let server = self.toolchain.start_server(dir, port)?;
        stage(ProvisionStage::ServerLaunched, name);

        match self.complete(&server, name) {
            Ok(db) => {
                info!("test database {name} ready on port {port} (pid {})", db.pid);
                Ok(db)
            }
            Err(err) => {
                if self.options.rollback_on_failure {
                    self.roll_back(server.pid());
                }
                Err(err)
            }
        }
    }

    /// Stop the server behind `db`.
    ///
    /// # Errors
    ///
    /// Whatever [`ServerControl::stop_server`] returns.
    pub fn stop_test_database(&self, db: &TestDatabase) -> Result<()> {
        self.toolchain.stop_server(db.pid)
    }

    fn complete(&self, server: &ServerProcess, name: &str) -> Result<TestDatabase> {
        let port = server.port();

        self.wait_for_server(server)?;
        stage(ProvisionStage::ServerConfirmedUp, name);

        self.toolchain.create_database(name, port)?;
        if self.options.create_user {
            self.toolchain.create_user(name, port)?;
        }
        stage(ProvisionStage::DatabaseCreated, name);

        if !self.toolchain.database_exists(name, port)? {
            return Err(Error::CreationVerificationFailed {
                name: name.to_string(),
                port,
            });
        }
        stage(ProvisionStage::Verified, name);

        Ok(TestDatabase {
            pid: server.pid(),
            port,
            data_directory: server.data_directory().to_path_buf(),
            name: name.to_string(),
        })
    }

    fn wait_for_server(&self, server: &ServerProcess) -> Result<()> {
        let pid = server.pid();
        let port = server.port();

        let outcome = wait_until(&self.options.readiness, self.cancel.as_ref(), || {
            if self.toolchain.server_exited(pid)? || !self.probe.is_process_alive(pid)? {
                return Err(Error::StartupFailed {
                    port,
                    reason: format!("server process {pid} exited"),
                });
            }
            self.probe.is_running(Some(port))
        })?;

        match outcome {
            Readiness::Ready { .. } => Ok(()),
            Readiness::TimedOut { attempts, elapsed } => Err(Error::StartupFailed {
                port,
                reason: format!(
                    "not listening after {}ms ({attempts} checks)",
                    elapsed.as_millis()
                ),
            }),
        }
    }

    fn roll_back(&self, pid: u32) {
        debug!("rolling back server pid {pid}");
        if let Err(err) = self.toolchain.stop_server(pid) {
            warn!("failed to stop server pid {pid} during rollback: {err}");
        }
    }
}

impl Provisioner<Toolchain, SystemPortAllocator> {
    /// Production provisioner: system toolchain, allocator and probe, all
    /// configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured port range is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let toolchain = config.toolchain();
        let probe = Probe::system(toolchain.binaries().server_process_name());
        Ok(Self::new(toolchain, config.port_allocator()?, probe)
            .with_options(config.provision_options()))
    }
}

fn stage(stage: ProvisionStage, name: &str) {
    debug!("provisioning {name}: {stage}");
}
