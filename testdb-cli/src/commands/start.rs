//! Start command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, parse_port, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use testdb::{PortAllocator, ServerControl};

/// Start a server on an initialized data directory.
///
/// The server keeps running after this command exits; stop it with
/// `testdb stop <PID>`.
#[derive(Args)]
pub struct StartCommand {
    /// Initialized data directory
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Port to listen on (a free one is picked when omitted)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}

impl StartCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let port = match self.port {
            Some(value) => parse_port(value)?,
            None => config.port_allocator()?.allocate()?,
        };

        let server = config.toolchain().start_server(&self.dir, port)?;
        println!("pid {} port {}", server.pid(), server.port());
        Ok(())
    }
}
