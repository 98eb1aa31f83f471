//! Library exports for testdb-cli.
//!
//! The binary in `main.rs` is a thin dispatcher over these modules; keeping
//! them in a library lets integration tests and tooling reach the clap tree.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
