//! # lockgraph Library
//!
//! Dependency graphs, diffs and metrics for Python lockfiles.
//!
//! ## Core Modules
//!
//! - [`primitives`] - Foundation types, errors, and shared coordination
//! - [`logger`] - Structured logging with progress tracking
//! - [`networking`] - Async HTTP client with concurrency management and the metadata cache
//! - [`stack`] - Lockfile, manifest and package metadata types
//! - [`api`] - Resolution, graph construction, diffing and metrics
//! - [`application`] - CLI interface, configuration and command execution
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn run() {
//! // Initialize and run lockgraph
//! lockgraph_lib::main().await.unwrap();
//! # }
//! ```

pub mod api;
pub mod application;
pub mod logger;
pub mod networking;
pub mod primitives;
pub mod stack;

// Re-export commonly used types for convenience
pub use api::{
    DependencyGraph, DiffResult, GraphBuilder, GraphDiffer, Metrics, MetricsAggregator,
    PackageResolver,
};
pub use application::{AppConfig, Cli, Commands, execute_command};
pub use logger::Logger;
pub use networking::{MetadataCache, NetworkingConfig, NetworkingManager};
pub use primitives::{ColorIntent, ConfigError, LogFormat, LogLevel, LogOutput, LoggerError};
pub use stack::{Lockfile, Manifest, PackageMetadata};

// Private imports for the main function
use anyhow::Result;
use std::io::IsTerminal;

pub async fn main() -> Result<()> {
    // Load configuration: defaults -> .env -> env vars -> CLI
    let (config, cli) = AppConfig::load()?;

    let is_terminal = match config.log_output {
        LogOutput::Stderr => std::io::stderr().is_terminal(),
        LogOutput::Stdout => std::io::stdout().is_terminal(),
    };
    Logger::init(config.to_logger_config(is_terminal))?;
    AppConfig::init_global(config.clone())?;

    // Execute the command
    execute_command(cli.command, config).await
}
