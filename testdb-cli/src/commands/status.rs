//! Status command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, parse_port, probe_for, GlobalOptions};
use clap::Args;

/// Report whether a PostgreSQL server is running.
///
/// Without `--port` any live server process counts.
#[derive(Args)]
pub struct StatusCommand {
    /// Only count a server listening on this port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}

impl StatusCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let port = self.port.map(parse_port).transpose()?;
        let config = load_configuration(global)?;

        let running = probe_for(&config).is_running(port)?;
        println!("{}", if running { "running" } else { "not running" });
        Ok(())
    }
}
