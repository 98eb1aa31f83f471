//! Common test utilities for CLI integration tests.
//!
//! Every command runs with `HOME` and the working directory inside a
//! temporary directory and with the `TESTDB_*` variables cleared, so the
//! developer's own configuration never leaks in.

use assert_cmd::Command;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Variables the CLI reads, removed from every child.
const TESTDB_ENV_VARS: [&str; 16] = [
    "TESTDB_CONFIG",
    "TESTDB_LOG_MODE",
    "TESTDB_HOST",
    "TESTDB_SERVER_BIN",
    "TESTDB_INITDB_BIN",
    "TESTDB_CREATEDB_BIN",
    "TESTDB_DROPDB_BIN",
    "TESTDB_PSQL_BIN",
    "TESTDB_CREATEUSER_BIN",
    "TESTDB_SERVER_LOG",
    "TESTDB_PORT_MIN",
    "TESTDB_PORT_MAX",
    "TESTDB_READINESS_TIMEOUT_MS",
    "TESTDB_STOP_TIMEOUT_MS",
    "TESTDB_CREATE_USER",
    "TESTDB_ROLLBACK_ON_FAILURE",
];

/// Isolated environment for one test.
pub struct TestEnv {
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Root of the temporary directory.
    pub temp_path: PathBuf,
    /// Directory for fake executables, created on first use.
    pub bin_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let bin_dir = temp_path.join("bin");

        Self {
            temp_dir,
            temp_path,
            bin_dir,
        }
    }

    /// The testdb binary with nothing configured.
    pub fn command_bare(&self) -> Command {
        Command::cargo_bin("testdb").expect("Failed to find testdb binary")
    }

    /// The testdb binary, isolated from the caller's home, working
    /// directory and environment.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.current_dir(&self.temp_path).env("HOME", &self.temp_path);
        for var in TESTDB_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Like [`TestEnv::command`], with [`TestEnv::bin_dir`] searched first.
    pub fn command_with_fakes(&self) -> Command {
        let mut cmd = self.command();
        cmd.env("PATH", self.search_path());
        cmd
    }

    /// `bin_dir` followed by the inherited `PATH`.
    pub fn search_path(&self) -> OsString {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let mut dirs = vec![self.bin_dir.clone()];
        dirs.extend(std::env::split_paths(&inherited));
        std::env::join_paths(dirs).expect("Failed to join PATH")
    }

    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write `testdb.yaml` in the working directory.
    pub fn write_project_config(&self, contents: &str) -> PathBuf {
        let path = self.temp_path.join("testdb.yaml");
        std::fs::write(&path, contents).expect("Failed to write config");
        path
    }

    /// Install an executable shell script named `name` in `bin_dir`.
    #[cfg(unix)]
    pub fn fake_binary(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        std::fs::create_dir_all(&self.bin_dir).expect("Failed to create bin dir");
        let path = self.bin_dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");
        path
    }

    /// Fake installs of every required executable that succeed silently.
    #[cfg(unix)]
    pub fn fake_toolchain(&self) {
        for name in ["postgres", "initdb", "createdb", "dropdb", "psql", "createuser"] {
            self.fake_binary(name, "exit 0");
        }
    }
}
