//! Integration tests for the configuration system.
//!
//! Tests that modify environment variables are marked with `#[serial]`:
//! environment variables are process-global, so concurrent access would race.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::{clear_testdb_env, EnvGuard};
use serial_test::serial;
use tempfile::TempDir;
use testdb::config::{Config, ConfigBuilder};
use testdb::error::Error;
use testdb::{init_logger, LogLevel};

fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, content).unwrap();
    path
}

/// Builder isolated from the real home directory.
fn isolated_builder(project: &Path, user: &Path) -> ConfigBuilder {
    ConfigBuilder::new()
        .with_working_dir(project)
        .with_user_dir(user)
}

#[test]
#[serial]
fn test_precedence_user_project_local() {
    let _env = clear_testdb_env();
    let user = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    create_temp_config(
        user.path(),
        "config.yaml",
        "host: /user\ncreate_user: true\nstop_timeout_ms: 1000\n",
    );
    create_temp_config(project.path(), "testdb.yaml", "host: /project\nstop_timeout_ms: 2000\n");
    create_temp_config(project.path(), "testdb.local.yaml", "stop_timeout_ms: 3000\n");

    let config = isolated_builder(project.path(), user.path()).build().unwrap();

    assert_eq!(config.host.as_deref(), Some("/project"));
    assert_eq!(config.create_user, Some(true));
    assert_eq!(config.stop_timeout(), Duration::from_secs(3));
}

#[test]
#[serial]
fn test_env_overrides_files() {
    let _env = clear_testdb_env();
    let user = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    create_temp_config(
        project.path(),
        "testdb.yaml",
        "host: /project\nports:\n  min: 20000\n  max: 30000\n",
    );

    let _host = EnvGuard::new("TESTDB_HOST", "/from-env");
    let _max = EnvGuard::new("TESTDB_PORT_MAX", "25000");
    let _rollback = EnvGuard::new("TESTDB_ROLLBACK_ON_FAILURE", "yes");
    let _timeout = EnvGuard::new("TESTDB_READINESS_TIMEOUT_MS", "7500");

    let config = isolated_builder(project.path(), user.path()).build().unwrap();

    assert_eq!(config.host.as_deref(), Some("/from-env"));
    let range = config.port_range().unwrap().unwrap();
    assert_eq!(range.min().value(), 20000);
    assert_eq!(range.max().value(), 25000);
    assert!(config.provision_options().rollback_on_failure);
    assert_eq!(config.readiness_policy().timeout, Duration::from_millis(7500));
}

#[test]
#[serial]
fn test_env_binary_overrides() {
    let _env = clear_testdb_env();
    let _server = EnvGuard::new("TESTDB_SERVER_BIN", "/opt/pg/bin/postgres");
    let _psql = EnvGuard::new("TESTDB_PSQL_BIN", "/opt/pg/bin/psql");

    let config = ConfigBuilder::new().skip_files().build().unwrap();
    let binaries = config.binaries();

    assert_eq!(binaries.server, "/opt/pg/bin/postgres");
    assert_eq!(binaries.client, "/opt/pg/bin/psql");
    assert_eq!(binaries.initializer, "initdb");
    assert_eq!(binaries.server_process_name(), "postgres");
}

#[test]
#[serial]
fn test_programmatic_overrides_beat_env() {
    let _env = clear_testdb_env();
    let _create = EnvGuard::new("TESTDB_CREATE_USER", "true");

    let config = ConfigBuilder::new()
        .skip_files()
        .with_config(Config {
            create_user: Some(false),
            ..Default::default()
        })
        .build()
        .unwrap();
    assert_eq!(config.create_user, Some(false));
}

#[test]
#[serial]
fn test_invalid_env_values_are_rejected() {
    let _env = clear_testdb_env();

    {
        let _bad = EnvGuard::new("TESTDB_PORT_MIN", "lots");
        let err = ConfigBuilder::new().skip_files().build().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "TESTDB_PORT_MIN"));
    }

    {
        let _bad = EnvGuard::new("TESTDB_CREATE_USER", "sometimes");
        let err = ConfigBuilder::new().skip_files().build().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "TESTDB_CREATE_USER"));
    }

    {
        let _bad = EnvGuard::new("TESTDB_STOP_TIMEOUT_MS", "0");
        let err = ConfigBuilder::new().skip_files().build().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "stop_timeout_ms"));
    }
}

#[test]
#[serial]
fn test_skip_env_ignores_variables() {
    let _env = clear_testdb_env();
    let _host = EnvGuard::new("TESTDB_HOST", "/from-env");

    let config = ConfigBuilder::new().skip_files().skip_env().build().unwrap();
    assert_eq!(config.host, None);
}

#[test]
#[serial]
fn test_invalid_yaml_names_file() {
    let _env = clear_testdb_env();
    let user = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let path = create_temp_config(project.path(), "testdb.yaml", "hots: /typo\n");

    let err = isolated_builder(project.path(), user.path()).build().unwrap_err();
    match err {
        Error::Configuration { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
#[serial]
fn test_config_drives_toolchain_and_allocator() {
    let _env = clear_testdb_env();
    let dir = TempDir::new().unwrap();
    let file = create_temp_config(
        dir.path(),
        "ci.yaml",
        r#"
host: /tmp/sockets
server_args: ["-k", "/tmp/sockets"]
ports:
  min: 40000
  max: 40100
"#,
    );

    let config = ConfigBuilder::new()
        .skip_files()
        .with_file(&file)
        .build()
        .unwrap();

    assert_eq!(config.toolchain().host(), Some("/tmp/sockets"));
    let allocator = config.port_allocator().unwrap();
    let range = allocator.range().unwrap();
    assert_eq!(range.min().value(), 40000);
    assert_eq!(range.max().value(), 40100);
}

#[test]
#[serial]
fn test_log_mode_from_env() {
    let _env = clear_testdb_env();

    {
        let _mode = EnvGuard::new("TESTDB_LOG_MODE", "verbose");
        assert_eq!(init_logger(false, false).level(), LogLevel::Verbose);
        assert_eq!(init_logger(false, true).level(), LogLevel::Quiet);
    }

    {
        let _mode = EnvGuard::new("TESTDB_LOG_MODE", "chatty");
        assert_eq!(init_logger(false, false).level(), LogLevel::Normal);
    }

    assert_eq!(init_logger(false, false).level(), LogLevel::Normal);
}
