//! Check command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, GlobalOptions};
use clap::Args;
use testdb::check_installed;

/// Check that the PostgreSQL executables are installed.
#[derive(Args)]
pub struct CheckCommand {}

impl CheckCommand {
    /// Print each missing executable; fail when any is missing.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let installed = check_installed(&config.binaries());

        if installed.all_present() {
            if !global.quiet {
                println!("All PostgreSQL executables found");
            }
            return Ok(());
        }

        for name in installed.missing() {
            println!("missing: {name}");
        }
        Err(CliError::SemanticFailure(format!(
            "{} PostgreSQL executable(s) not found on PATH",
            installed.missing().len()
        )))
    }
}
