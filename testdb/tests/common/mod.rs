//! Common test utilities for integration tests.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use testdb::Port;

/// Shorthand for a known-valid port.
#[allow(dead_code)]
pub fn port(value: u16) -> Port {
    Port::try_from(value).unwrap()
}

/// Write an executable `#!/bin/sh` script called `name` into `dir`.
#[cfg(unix)]
#[allow(dead_code)]
pub fn fake_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// RAII guard for setting and restoring environment variables.
///
/// Tests using it must be `#[serial]`.
#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    old_value: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn new(key: &str, value: &str) -> Self {
        let old_value = env::var(key).ok();
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            old_value,
        }
    }

    pub fn remove(key: &str) -> Self {
        let old_value = env::var(key).ok();
        env::remove_var(key);
        Self {
            key: key.to_string(),
            old_value,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.old_value {
            Some(val) => env::set_var(&self.key, val),
            None => env::remove_var(&self.key),
        }
    }
}

/// Every variable the configuration layer reads.
#[allow(dead_code)]
pub const TESTDB_ENV_VARS: [&str; 15] = [
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
    "TESTDB_LOG_MODE",
];

/// Clear every `TESTDB_*` variable for the guard's lifetime.
#[allow(dead_code)]
pub fn clear_testdb_env() -> Vec<EnvGuard> {
    TESTDB_ENV_VARS.iter().map(|key| EnvGuard::remove(key)).collect()
}
