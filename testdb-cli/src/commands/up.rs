//! `up` command implementation.
//!
//! Runs the whole provisioning sequence and prints where the database lives,
//! either for people, as JSON, or as shell `export` lines for `eval`.

use crate::error::CliError;
use crate::utils::{load_configuration, GlobalOptions};
use clap::{Args, ValueEnum};
use log::debug;
use std::path::PathBuf;
use testdb::{Provisioner, ScratchSpace, TestDatabase};

/// Output format for the provisioned database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormatArg {
    /// Human-readable summary
    Human,
    /// JSON object
    Json,
    /// Shell `export` statements
    Export,
}

/// Provision a test database on a freshly started server.
#[derive(Args)]
pub struct UpCommand {
    /// Name of the database to create
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Data directory for the new server (a kept temporary directory when omitted)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub format: OutputFormatArg,
}

impl UpCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;

        let dir = match self.dir {
            Some(dir) => dir,
            None => ScratchSpace::new()?.keep().join(&self.name),
        };
        debug!("provisioning {} in {}", self.name, dir.display());

        let provisioner = Provisioner::from_config(&config)?;
        let db = provisioner.start_test_database(&dir, &self.name)?;

        let rendered = match self.format {
            OutputFormatArg::Human => format_human(&db),
            OutputFormatArg::Json => serde_json::to_string_pretty(&db)
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?,
            OutputFormatArg::Export => format_export(&db, config.host.as_deref()),
        };
        println!("{rendered}");
        Ok(())
    }
}

fn format_human(db: &TestDatabase) -> String {
    format!(
        "Database {} ready\n  port: {}\n  pid: {}\n  data directory: {}\n\nStop it with: testdb stop {}",
        db.name,
        db.port,
        db.pid,
        db.data_directory.display(),
        db.pid
    )
}

/// `export` lines using libpq's variable names, so `eval` makes `psql` just work.
fn format_export(db: &TestDatabase, host: Option<&str>) -> String {
    let mut lines = Vec::new();
    if let Some(host) = host {
        lines.push(format!("export PGHOST={}", shell_quote(host)));
    }
    lines.push(format!("export PGPORT={}", db.port));
    lines.push(format!("export PGDATABASE={}", shell_quote(&db.name)));
    lines.push(format!("export TESTDB_PID={}", db.pid));
    lines.push(format!(
        "export TESTDB_DATA_DIR={}",
        shell_quote(&db.data_directory.to_string_lossy())
    ));
    lines.join("\n")
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use testdb::Port;

    fn database() -> TestDatabase {
        TestDatabase {
            pid: 4242,
            port: Port::try_from(54321).unwrap(),
            data_directory: PathBuf::from("/tmp/testdb data"),
            name: "fargle".to_string(),
        }
    }

    #[test]
    fn test_export_without_host() {
        let out = format_export(&database(), None);
        assert_eq!(
            out,
            "export PGPORT=54321\n\
             export PGDATABASE='fargle'\n\
             export TESTDB_PID=4242\n\
             export TESTDB_DATA_DIR='/tmp/testdb data'"
        );
    }

    #[test]
    fn test_export_with_host_comes_first() {
        let out = format_export(&database(), Some("/tmp"));
        assert!(out.starts_with("export PGHOST='/tmp'\n"));
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_human_output_mentions_stop_command() {
        let out = format_human(&database());
        assert!(out.starts_with("Database fargle ready"));
        assert!(out.contains("port: 54321"));
        assert!(out.ends_with("testdb stop 4242"));
    }
}
