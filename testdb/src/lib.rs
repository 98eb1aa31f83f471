#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # testdb
//!
//! Ephemeral PostgreSQL servers for automated tests.
//!
//! The library checks that the PostgreSQL executables are installed, tells
//! whether a server is already running, initializes a fresh data directory,
//! launches a server on a free port, creates a database in it and stops the
//! server again afterwards.
//!
//! ## Core Types
//!
//! - [`probe::Probe`] and [`probe::check_installed`]: environment inspection
//! - [`server::Toolchain`]: the [`server::ServerControl`] and
//!   [`server::Catalog`] operations, backed by the PostgreSQL executables
//! - [`provision::Provisioner`]: the full start-a-test-database sequence
//! - [`Port`] and [`PortRange`]: network port types with validation
//! - [`Error`] and [`Result`]: error handling types
//! - [`Logger`] and [`LogLevel`]: logging infrastructure
//!
//! ## Examples
//!
//! ```no_run
//! use testdb::config::ConfigBuilder;
//! use testdb::provision::Provisioner;
//! use testdb::ScratchSpace;
//!
//! let config = ConfigBuilder::new().build()?;
//! let provisioner = Provisioner::from_config(&config)?;
//!
//! let scratch = ScratchSpace::new()?;
//! let db = provisioner.start_test_database(&scratch.data_dir("fargle"), "fargle")?;
//! // ... connect to db.port and run tests ...
//! provisioner.stop_test_database(&db)?;
//! # Ok::<(), testdb::Error>(())
//! ```

mod command;

pub mod config;
pub mod error;
pub mod logging;
pub mod port;
pub mod probe;
pub mod provision;
pub mod readiness;
pub mod scratch;
pub mod server;

pub use config::{Config, ConfigBuilder};
pub use error::{CommandError, Error, Result};
pub use logging::{init_logger, install_logger, LogLevel, Logger};
pub use port::{FixedPortAllocator, Port, PortAllocator, PortRange, SystemPortAllocator};
pub use probe::{check_installed, Binaries, InstalledSet, Probe};
pub use provision::{ProvisionOptions, ProvisionStage, Provisioner, TestDatabase};
pub use readiness::{CancellationToken, ReadinessPolicy};
pub use scratch::ScratchSpace;
pub use server::{Catalog, ServerControl, ServerProcess, Toolchain};
