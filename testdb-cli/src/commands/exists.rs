//! `exists` command implementation.

use crate::error::CliError;
use crate::utils::{load_configuration, parse_port, GlobalOptions};
use clap::Args;
use testdb::Catalog;

/// Check whether a database exists on a running server.
///
/// Exits 0 when the name is listed exactly, 1 otherwise.
#[derive(Args)]
pub struct ExistsCommand {
    /// Database name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Port of the running server
    #[arg(long, value_name = "PORT")]
    pub port: u16,
}

impl ExistsCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let port = parse_port(self.port)?;
        let config = load_configuration(global)?;

        if config.toolchain().database_exists(&self.name, port)? {
            if !global.quiet {
                println!("Database {} exists on port {port}", self.name);
            }
            Ok(())
        } else {
            Err(CliError::SemanticFailure(format!(
                "database {} does not exist on port {port}",
                self.name
            )))
        }
    }
}
