//! Configuration system for testdb.
//!
//! This module provides hierarchical configuration with support for:
//! - YAML configuration files (user config and project files)
//! - Environment variable overrides
//! - Programmatic configuration via builder pattern
//! - Validation of the merged result
//!
//! # Configuration Precedence
//!
//! Configuration is merged from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Programmatic overrides (via `ConfigBuilder::with_config`)
//! 2. Environment variables (`TESTDB_*`)
//! 3. An explicit file (via `ConfigBuilder::with_file`)
//! 4. Private project config (`testdb.local.yaml`)
//! 5. Project config (`testdb.yaml`)
//! 6. User config (`~/.testdb/config.yaml`)
//! 7. Built-in defaults
//!
//! # Examples
//!
//! ```no_run
//! use testdb::config::ConfigBuilder;
//! use std::path::Path;
//!
//! let config = ConfigBuilder::new()
//!     .with_working_dir(Path::new("/path/to/project"))
//!     .build()
//!     .unwrap();
//!
//! println!("server: {}", config.binaries().server);
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use builder::ConfigBuilder;
pub use environment::EnvironmentConfig;
pub use loader::{ConfigLoader, ConfigSource};
pub use merger::ConfigMerger;
pub use schema::{BinariesConfig, Config, PortConfig, ReadinessConfig};
pub use validator::ConfigValidator;
