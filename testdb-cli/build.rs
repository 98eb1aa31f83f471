//! Build script for testdb-cli.
//!
//! Renders the `testdb.1` man page into OUT_DIR with clap_mangen. Build
//! scripts cannot depend on the crate being built, so the command tree is
//! restated here.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Keep in sync with src/cli.rs.
fn build_cli() -> Command {
    Command::new("testdb")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Provision throwaway PostgreSQL servers and databases for tests")
        .long_about(
            "Command-line tool for starting local PostgreSQL servers on free ports and \
             creating test databases in them",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Read this configuration file on top of the discovered ones")
                .value_name("PATH")
                .global(true)
                .env("TESTDB_CONFIG"),
        )
        .subcommands(vec![
            Command::new("check")
                .about("Check that the PostgreSQL executables are installed")
                .long_about("List missing PostgreSQL executables and fail if any is absent"),
            Command::new("status")
                .about("Report whether a PostgreSQL server is running")
                .long_about("Report whether a server process exists, or listens on --port"),
            Command::new("init")
                .about("Initialize a data directory")
                .long_about("Run the data directory initializer on a directory"),
            Command::new("start")
                .about("Start a server on a data directory")
                .long_about("Launch the server in the background and print its pid and port"),
            Command::new("stop")
                .about("Stop a server by process id")
                .long_about("Kill the server process and wait for it to exit"),
            Command::new("create-db")
                .about("Create a database on a running server"),
            Command::new("create-user")
                .about("Create a user on a running server"),
            Command::new("drop-db")
                .about("Drop a database on a running server"),
            Command::new("exists")
                .about("Check whether a database exists")
                .long_about("Exit with status 1 when the database is not listed by the server"),
            Command::new("up")
                .about("Provision a test database end to end")
                .long_about(
                    "Allocate a port, initialize a data directory, start a server and create \
                     a database in it",
                ),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("testdb.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
