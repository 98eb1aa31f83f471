//! Database and user management inside a running server.

use std::process::Command;

use log::info;

use super::Toolchain;
use crate::command;
use crate::error::{Error, Result};
use crate::Port;

/// Operations on the databases of a running server.
pub trait Catalog {
    /// Create database `name` on the server at `port`.
    ///
    /// # Errors
    ///
    /// [`Error::BinaryNotFound`] or [`Error::CommandFailed`].
    fn create_database(&self, name: &str, port: Port) -> Result<()>;

    /// Create a role called `name` on the server at `port`.
    ///
    /// # Errors
    ///
    /// [`Error::BinaryNotFound`] or [`Error::CommandFailed`].
    fn create_user(&self, name: &str, port: Port) -> Result<()>;

    /// Drop database `name` on the server at `port`.
    ///
    /// # Errors
    ///
    /// [`Error::BinaryNotFound`] or [`Error::CommandFailed`].
    fn drop_database(&self, name: &str, port: Port) -> Result<()>;

    /// Names of all databases on the server at `port`, in listing order.
    ///
    /// # Errors
    ///
    /// [`Error::BinaryNotFound`] or [`Error::CommandFailed`].
    fn list_databases(&self, port: Port) -> Result<Vec<String>>;

    /// Whether database `name` exists on the server at `port`.
    ///
    /// # Errors
    ///
    /// Whatever [`Catalog::list_databases`] returns.
    fn database_exists(&self, name: &str, port: Port) -> Result<bool> {
        Ok(contains_exact(name, &self.list_databases(port)?))
    }
}

impl Toolchain {
    /// A client tool command with `-h` (when configured) and `-p` already set.
    fn client_command(&self, binary: &str, port: Port) -> Result<Command> {
        let mut cmd = Command::new(Self::locate(binary)?);
        if let Some(host) = self.host() {
            cmd.arg("-h").arg(host);
        }
        cmd.arg("-p").arg(port.to_string());
        Ok(cmd)
    }

    fn run_step(step: &'static str, cmd: &mut Command) -> Result<std::process::Output> {
        command::run(cmd).map_err(|source| Error::CommandFailed { step, source })
    }
}

impl Catalog for Toolchain {
    fn create_database(&self, name: &str, port: Port) -> Result<()> {
        let mut cmd = self.client_command(&self.binaries().creator, port)?;
        cmd.arg(name);
        Self::run_step("create database", &mut cmd)?;
        info!("created database {name} on port {port}");
        Ok(())
    }

    fn create_user(&self, name: &str, port: Port) -> Result<()> {
        let mut cmd = self.client_command(&self.binaries().user_creator, port)?;
        cmd.arg(name);
        Self::run_step("create user", &mut cmd)?;
        info!("created user {name} on port {port}");
        Ok(())
    }

    fn drop_database(&self, name: &str, port: Port) -> Result<()> {
        let mut cmd = self.client_command(&self.binaries().dropper, port)?;
        cmd.arg(name);
        Self::run_step("drop database", &mut cmd)?;
        info!("dropped database {name} on port {port}");
        Ok(())
    }

    fn list_databases(&self, port: Port) -> Result<Vec<String>> {
        let mut cmd = self.client_command(&self.binaries().client, port)?;
        cmd.args(["-l", "-q", "-t"]);
        let output = Self::run_step("list databases", &mut cmd)?;
        Ok(parse_database_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Database names from tuples-only `psql -l` output.
///
/// Each line contributes its first `|`-separated field, trimmed; empty
/// results (blank lines, access-privilege continuation rows) are skipped.
///
/// # Examples
///
/// ```
/// use testdb::server::parse_database_list;
///
/// let listing = " fargle    | owner | UTF8 |\n template0 | owner | UTF8 |\n\n";
/// assert_eq!(parse_database_list(listing), vec!["fargle", "template0"]);
/// ```
#[must_use]
pub fn parse_database_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split('|').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Exact membership test: no trimming, no case folding.
#[must_use]
pub fn contains_exact(needle: &str, haystack: &[String]) -> bool {
    haystack.iter().any(|item| item == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_row_with_trailing_blank_lines() {
        assert_eq!(
            parse_database_list("fargle | owner | UTF8 |\n\n"),
            vec!["fargle".to_string()]
        );
    }

    #[test]
    fn test_parse_real_listing() {
        let listing = concat!(
            " fargle    | alice | UTF8     | libc            | en_US.UTF-8 | en_US.UTF-8 |            |           | \n",
            " postgres  | alice | UTF8     | libc            | en_US.UTF-8 | en_US.UTF-8 |            |           | \n",
            " template0 | alice | UTF8     | libc            | en_US.UTF-8 | en_US.UTF-8 |            |           | =c/alice          +\n",
            "           |       |          |                 |             |             |            |           | alice=CTc/alice\n",
            "\n",
        );
        assert_eq!(
            parse_database_list(listing),
            vec!["fargle", "postgres", "template0"]
        );
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_database_list("").is_empty());
        assert!(parse_database_list("\n\n  \n").is_empty());
    }

    #[test]
    fn test_line_without_separator_is_whole_name() {
        assert_eq!(parse_database_list("  lonely  \n"), vec!["lonely"]);
    }

    #[test]
    fn test_contains_exact() {
        let list = vec!["fargle".to_string(), "postgres".to_string()];
        assert!(contains_exact("fargle", &list));
        assert!(!contains_exact("Fargle", &list));
        assert!(!contains_exact(" fargle", &list));
        assert!(!contains_exact("farg", &list));
        assert!(!contains_exact("fargle", &[]));
    }

    #[cfg(unix)]
    mod toolchain {
        use super::super::*;
        use crate::probe::Binaries;
        use std::fs;
        use std::path::Path;
        use tempfile::TempDir;

        fn script(dir: &Path, name: &str, body: &str) -> String {
            use std::os::unix::fs::PermissionsExt;

            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path.to_str().unwrap().to_string()
        }

        fn port() -> Port {
            Port::try_from(54320).unwrap()
        }

        #[test]
        fn test_create_database_passes_host_and_port() {
            let dir = TempDir::new().unwrap();
            let record = dir.path().join("argv");
            let createdb = script(
                dir.path(),
                "createdb",
                &format!("echo \"$*\" > {}", record.display()),
            );

            let toolchain = Toolchain::new(Binaries {
                creator: createdb,
                ..Binaries::default()
            })
            .with_host(Some("/tmp/sock".to_string()));

            toolchain.create_database("fargle", port()).unwrap();
            assert_eq!(
                fs::read_to_string(&record).unwrap().trim(),
                "-h /tmp/sock -p 54320 fargle"
            );
        }

        #[test]
        fn test_create_user_without_host() {
            let dir = TempDir::new().unwrap();
            let record = dir.path().join("argv");
            let createuser = script(
                dir.path(),
                "createuser",
                &format!("echo \"$*\" > {}", record.display()),
            );

            let toolchain = Toolchain::new(Binaries {
                user_creator: createuser,
                ..Binaries::default()
            });
            toolchain.create_user("fargle", port()).unwrap();
            assert_eq!(fs::read_to_string(&record).unwrap().trim(), "-p 54320 fargle");
        }

        #[test]
        fn test_failed_client_is_command_failed() {
            let dir = TempDir::new().unwrap();
            let dropdb = script(
                dir.path(),
                "dropdb",
                "echo 'database \"fargle\" does not exist' >&2; exit 1",
            );

            let toolchain = Toolchain::new(Binaries {
                dropper: dropdb,
                ..Binaries::default()
            });
            match toolchain.drop_database("fargle", port()).unwrap_err() {
                Error::CommandFailed { step, source } => {
                    assert_eq!(step, "drop database");
                    assert!(source.to_string().contains("does not exist"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_database_exists_parses_listing() {
            let dir = TempDir::new().unwrap();
            let psql = script(
                dir.path(),
                "psql",
                "printf ' fargle | o | UTF8 |\\n postgres | o | UTF8 |\\n\\n'",
            );

            let toolchain = Toolchain::new(Binaries {
                client: psql,
                ..Binaries::default()
            });
            assert!(toolchain.database_exists("fargle", port()).unwrap());
            assert!(toolchain.database_exists("postgres", port()).unwrap());
            assert!(!toolchain.database_exists("bargle", port()).unwrap());
        }

        #[test]
        fn test_missing_client_binary() {
            let toolchain = Toolchain::new(Binaries {
                client: "testdb-no-psql".to_string(),
                ..Binaries::default()
            });
            assert!(toolchain
                .database_exists("fargle", port())
                .unwrap_err()
                .is_binary_not_found());
        }
    }
}
