//! Main entry point for the testdb CLI.
//!
//! Provisions throwaway PostgreSQL servers for tests:
//! - `check` / `status`: inspect the environment
//! - `init` / `start` / `stop`: drive a server step by step
//! - `create-db` / `create-user` / `drop-db` / `exists`: work inside a server
//! - `up`: all of the above in one go

use clap::Parser;
use testdb_cli::cli::{Cli, Command};
use testdb_cli::utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    testdb::install_logger(testdb::init_logger(cli.verbose, cli.quiet));

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Check(cmd) => cmd.execute(&global),
        Command::Status(cmd) => cmd.execute(&global),
        Command::Init(cmd) => cmd.execute(&global),
        Command::Start(cmd) => cmd.execute(&global),
        Command::Stop(cmd) => cmd.execute(&global),
        Command::CreateDb(cmd) => cmd.execute(&global),
        Command::CreateUser(cmd) => cmd.execute(&global),
        Command::DropDb(cmd) => cmd.execute(&global),
        Command::Exists(cmd) => cmd.execute(&global),
        Command::Up(cmd) => cmd.execute(&global),
        Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
