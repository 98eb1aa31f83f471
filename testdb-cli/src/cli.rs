//! CLI structure and command definitions.

use crate::commands::{
    CheckCommand, CompletionsCommand, CreateDbCommand, CreateUserCommand, DropDbCommand,
    ExistsCommand, InitCommand, StartCommand, StatusCommand, StopCommand, UpCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Provision throwaway PostgreSQL servers and databases for tests.
#[derive(Parser)]
#[command(name = "testdb")]
#[command(
    version,
    about = "Provision throwaway PostgreSQL servers and databases for tests",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Read this configuration file on top of the discovered ones
    #[arg(long, value_name = "PATH", global = true, env = "TESTDB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Check that the PostgreSQL executables are installed
    Check(CheckCommand),

    /// Report whether a PostgreSQL server is running
    Status(StatusCommand),

    /// Initialize a data directory
    Init(InitCommand),

    /// Start a server on a data directory
    Start(StartCommand),

    /// Stop a server by process id
    Stop(StopCommand),

    /// Create a database on a running server
    CreateDb(CreateDbCommand),

    /// Create a user on a running server
    CreateUser(CreateUserCommand),

    /// Drop a database on a running server
    DropDb(DropDbCommand),

    /// Check whether a database exists
    Exists(ExistsCommand),

    /// Provision a test database end to end
    Up(UpCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
