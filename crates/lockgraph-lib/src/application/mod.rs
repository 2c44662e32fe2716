//! Application layer modules
//!
//! Organizes CLI interface, configuration management, and command execution.

pub mod cli;
pub mod commands;
pub mod config;
pub mod env;
pub mod loader;
pub mod session;

// Re-export main types for convenience
pub use cli::{Cli, CliConfig, Commands, ProjectArgs};
pub use commands::execute_command;
pub use config::AppConfig;
pub use loader::*;
pub use session::CommandSession;
