//! Configuration loading and global state management
//!
//! Coordinates loading configuration from various sources and provides
//! global application configuration access.

use crate::primitives::ConfigError;
use std::sync::OnceLock;
use tracing::trace;

use super::{cli::CliConfig, config::AppConfig, env::EnvironmentConfig};

// Global configuration available throughout the application
static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Environment files read before the process environment, most specific first
pub const ENV_FILES: [&str; 2] = [".env.local", ".env"];

impl AppConfig {
    /// Load config: defaults -> .env -> env vars -> CLI
    ///
    /// Returns the validated configuration together with the parsed command.
    pub fn load() -> Result<(Self, CliConfig), ConfigError> {
        // 1. Start with defaults
        let mut config = Self::default();

        // 2. Load .env files; a missing file is fine
        load_env_files(&ENV_FILES)?;

        // 3. Handle standard environment variables
        let env_config = EnvironmentConfig::load()?;
        config.color = env_config.apply_color_config(config.color);

        // 4. Override with CLI arguments (LOCKGRAPH_* are read here by clap)
        let cli_config = CliConfig::load()?;
        config = config.merge_with(cli_config.app_config.clone());

        // 5. Validate
        config.validate()?;

        Ok((config, cli_config))
    }

    /// Initialize global configuration (call once in main)
    pub fn init_global(config: AppConfig) -> Result<(), ConfigError> {
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| ConfigError::AlreadyInitialized)
    }

    /// Get global configuration reference, if initialized
    pub fn global() -> Option<&'static AppConfig> {
        GLOBAL_CONFIG.get()
    }
}

/// Load `KEY=value` files into the process environment without overriding
/// variables that are already set
pub fn load_env_files(files: &[&str]) -> Result<(), ConfigError> {
    for env_file in files {
        match dotenvy::from_filename(env_file) {
            Ok(path) => trace!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigError::EnvFileError {
                    file: env_file.to_string(),
                    source: e,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("loader.test.rs");
}
