//! Stop command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, GlobalOptions};
use clap::Args;
use testdb::ServerControl;

/// Stop a server by process id.
#[derive(Args)]
pub struct StopCommand {
    /// Server process id
    #[arg(value_name = "PID")]
    pub pid: u32,
}

impl StopCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        config.toolchain().stop_server(self.pid)?;

        if !global.quiet {
            println!("Stopped server {}", self.pid);
        }
        Ok(())
    }
}
