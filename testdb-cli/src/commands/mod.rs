//! CLI command implementations.
//!
//! Environment inspection:
//! - `check`: report missing PostgreSQL executables
//! - `status`: report whether a server is running
//!
//! Server lifecycle:
//! - `init`, `start`, `stop`
//!
//! Inside a running server:
//! - `create_db`, `create_user`, `drop_db`, `exists`
//!
//! Everything at once:
//! - `up`: provision a test database on a fresh server

pub mod check;
pub mod completions;
pub mod create_db;
pub mod create_user;
pub mod drop_db;
pub mod exists;
pub mod init;
pub mod start;
pub mod status;
pub mod stop;
pub mod up;

pub use check::CheckCommand;
pub use completions::CompletionsCommand;
pub use create_db::CreateDbCommand;
pub use create_user::CreateUserCommand;
pub use drop_db::DropDbCommand;
pub use exists::ExistsCommand;
pub use init::InitCommand;
pub use start::StartCommand;
pub use status::StatusCommand;
pub use stop::StopCommand;
pub use up::UpCommand;
