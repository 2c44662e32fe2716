use crate::primitives::ConfigError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::config::AppConfig;

/// lockgraph CLI - dependency graphs from Python lockfiles
#[derive(Debug, Clone, Parser)]
#[command(name = "lockgraph")]
#[command(about = "Resolve, diff and measure the dependency graph of a Pipfile.lock")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global configuration options
    #[command(flatten)]
    pub config: AppConfig,

    /// lockgraph commands
    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration loaded from CLI
pub struct CliConfig {
    pub app_config: AppConfig,
    pub command: Commands,
}

impl CliConfig {
    /// Load configuration from command line arguments
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::from(Cli::parse()))
    }
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            app_config: cli.config,
            command: cli.command,
        }
    }
}

/// Manifest and lockfile of one project state
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ProjectArgs {
    /// Pipfile listing the top-level packages
    #[arg(long, default_value = "Pipfile")]
    pub manifest: PathBuf,

    /// Pipfile.lock pinning every package
    #[arg(long, default_value = "Pipfile.lock")]
    pub lock: PathBuf,

    /// Include development packages
    #[arg(long)]
    pub dev: bool,
}

/// Available lockgraph commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Resolve a lockfile and print its dependency graph
    Graph {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Compare the dependency graphs of two lockfiles
    Diff {
        /// Pipfile listing the top-level packages
        #[arg(long, default_value = "Pipfile")]
        manifest: PathBuf,

        /// Lockfile before the change
        #[arg(long)]
        old_lock: PathBuf,

        /// Lockfile after the change
        #[arg(long)]
        new_lock: PathBuf,

        /// Include development packages
        #[arg(long)]
        dev: bool,

        /// Keep removed packages in the printed entries
        #[arg(long)]
        show_removed: bool,
    },

    /// Print dependency and license metrics
    Metrics {
        #[command(flatten)]
        project: ProjectArgs,

        /// Package to aggregate from (repeatable; defaults to every top-level package)
        #[arg(long = "root", value_name = "ID")]
        roots: Vec<String>,
    },

    /// Show every path from packages up to the application root
    Why {
        #[command(flatten)]
        project: ProjectArgs,

        /// Package names to explain
        #[arg(required = true)]
        packages: Vec<String>,
    },
}

impl Commands {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Graph { .. } => "graph",
            Commands::Diff { .. } => "diff",
            Commands::Metrics { .. } => "metrics",
            Commands::Why { .. } => "why",
        }
    }
}

#[cfg(test)]
mod tests {
    include!("cli.test.rs");
}
