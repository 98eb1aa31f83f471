//! `create-user` command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, parse_port, GlobalOptions};
use clap::Args;
use testdb::Catalog;

/// Create a user on a running server.
#[derive(Args)]
pub struct CreateUserCommand {
    /// User name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Port of the running server
    #[arg(long, value_name = "PORT")]
    pub port: u16,
}

impl CreateUserCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let port = parse_port(self.port)?;
        let config = load_configuration(global)?;
        config.toolchain().create_user(&self.name, port)?;

        if !global.quiet {
            println!("Created user {} on port {port}", self.name);
        }
        Ok(())
    }
}
