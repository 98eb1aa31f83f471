//! Init command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use testdb::ServerControl;

/// Initialize a PostgreSQL data directory.
#[derive(Args)]
pub struct InitCommand {
    /// Directory to initialize
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

impl InitCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        config.toolchain().init_data_directory(&self.dir)?;

        if !global.quiet {
            println!("Initialized data directory {}", self.dir.display());
        }
        Ok(())
    }
}
