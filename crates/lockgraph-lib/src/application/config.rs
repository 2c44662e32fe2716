//! Application configuration management
//!
//! Handles config loading, validation, and environment variable processing
//! following the precedence: defaults -> .env -> env vars -> CLI args.

use crate::api::licenses::DEFAULT_LICENSE_URL;
use crate::api::thoth::{DEFAULT_PACKAGE_INDEX, DEFAULT_THOTH_URL};
use crate::networking::NetworkingConfig;
use crate::primitives::*;
use clap::Parser;
use serde::Deserialize;

/// Default configuration values
pub mod defaults {
    pub const LOG_LEVEL: &str = "0"; // Error-only logging by default
    pub const LOG_FORMAT: &str = "text";
    pub const LOG_OUTPUT: &str = "stderr";
    pub const NET_TIMEOUT: &str = "30";
    pub const JOBS: &str = "8";
    pub const COLOR: &str = "auto";
    pub const OUTPUT: &str = "json";
}

/// Default value functions for configuration fields
mod default_fns {
    use super::*;

    pub fn log_level() -> u8 {
        0
    }

    pub fn log_format() -> LogFormat {
        LogFormat::Text
    }

    pub fn log_output() -> LogOutput {
        LogOutput::Stderr
    }

    pub fn net_timeout() -> u64 {
        30
    }

    pub fn jobs() -> usize {
        8
    }

    pub fn color() -> ColorIntent {
        ColorIntent::Auto
    }

    pub fn output() -> OutputFormat {
        OutputFormat::Json
    }

    pub fn thoth_url() -> String {
        DEFAULT_THOTH_URL.to_string()
    }

    pub fn package_index() -> String {
        DEFAULT_PACKAGE_INDEX.to_string()
    }

    pub fn license_url() -> String {
        DEFAULT_LICENSE_URL.to_string()
    }
}

/// Application configuration structure
#[derive(Debug, Clone, Parser, Deserialize)]
pub struct AppConfig {
    /// Maximum number of concurrent metadata requests
    #[arg(short = 'j', long, env = "LOCKGRAPH_JOBS", default_value = defaults::JOBS, global = true)]
    #[serde(default = "default_fns::jobs")]
    pub jobs: usize,

    /// HTTP timeout in seconds
    #[arg(long, env = "LOCKGRAPH_NET_TIMEOUT", default_value = defaults::NET_TIMEOUT, global = true)]
    #[serde(default = "default_fns::net_timeout")]
    pub net_timeout: u64,

    /// Thoth user API base URL
    #[arg(long, env = "LOCKGRAPH_THOTH_URL", default_value = DEFAULT_THOTH_URL, global = true)]
    #[serde(default = "default_fns::thoth_url")]
    pub thoth_url: String,

    /// Python package index metadata is looked up against
    #[arg(long, env = "LOCKGRAPH_PACKAGE_INDEX", default_value = DEFAULT_PACKAGE_INDEX, global = true)]
    #[serde(default = "default_fns::package_index")]
    pub package_index: String,

    /// SPDX license list URL
    #[arg(long, env = "LOCKGRAPH_LICENSE_URL", default_value = DEFAULT_LICENSE_URL, global = true)]
    #[serde(default = "default_fns::license_url")]
    pub license_url: String,

    /// Verbosity level (0=error, 1=warn, 2=info, 3=debug, 4=trace)
    #[arg(long, env = "LOCKGRAPH_LOG_LEVEL", default_value = defaults::LOG_LEVEL, global = true)]
    #[serde(default = "default_fns::log_level")]
    pub log_level: u8,

    /// Log format (text, json, pretty)
    #[arg(long, env = "LOCKGRAPH_LOG_FORMAT", default_value = defaults::LOG_FORMAT, global = true)]
    #[serde(default = "default_fns::log_format")]
    pub log_format: LogFormat,

    /// Log output stream (stderr, stdout)
    #[arg(long, env = "LOCKGRAPH_LOG_OUTPUT", default_value = defaults::LOG_OUTPUT, global = true)]
    #[serde(default = "default_fns::log_output")]
    pub log_output: LogOutput,

    /// Color output control (auto, always, never)
    #[arg(short, long, env = "LOCKGRAPH_COLOR", default_value = defaults::COLOR, global = true)]
    #[serde(default = "default_fns::color")]
    pub color: ColorIntent,

    /// Result format written to stdout (json, json-compact)
    #[arg(short, long, env = "LOCKGRAPH_OUTPUT", default_value = defaults::OUTPUT, global = true)]
    #[serde(default = "default_fns::output")]
    pub output: OutputFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jobs: default_fns::jobs(),
            net_timeout: default_fns::net_timeout(),
            thoth_url: default_fns::thoth_url(),
            package_index: default_fns::package_index(),
            license_url: default_fns::license_url(),
            log_level: default_fns::log_level(),
            log_format: default_fns::log_format(),
            log_output: default_fns::log_output(),
            color: default_fns::color(),
            output: default_fns::output(),
        }
    }
}

impl AppConfig {
    /// Create LoggerConfig, resolving color against the log stream
    pub fn to_logger_config(&self, is_terminal: bool) -> LoggerConfig {
        LoggerConfig {
            level: LogLevel::from_verbosity(self.log_level),
            format: self.log_format,
            output: self.log_output,
            color: self.color.enabled(is_terminal),
        }
    }

    /// HTTP client settings
    pub fn networking_config(&self) -> NetworkingConfig {
        NetworkingConfig {
            max_jobs: self.jobs,
            timeout_seconds: self.net_timeout,
            trace_requests: LogLevel::from_verbosity(self.log_level) == LogLevel::Trace,
        }
    }

    /// Merge this config with another, taking non-default values from other
    pub fn merge_with(mut self, other: Self) -> Self {
        // For primitive fields, take other if it's not the default
        if other.jobs != default_fns::jobs() {
            self.jobs = other.jobs;
        }
        if other.net_timeout != default_fns::net_timeout() {
            self.net_timeout = other.net_timeout;
        }
        if other.log_level != default_fns::log_level() {
            self.log_level = other.log_level;
        }
        if other.thoth_url != default_fns::thoth_url() {
            self.thoth_url = other.thoth_url;
        }
        if other.package_index != default_fns::package_index() {
            self.package_index = other.package_index;
        }
        if other.license_url != default_fns::license_url() {
            self.license_url = other.license_url;
        }

        // For enums, detect if it's non-default
        if !matches!(other.log_format, LogFormat::Text) {
            self.log_format = other.log_format;
        }
        if !matches!(other.log_output, LogOutput::Stderr) {
            self.log_output = other.log_output;
        }
        if !matches!(other.color, ColorIntent::Auto) {
            self.color = other.color;
        }
        if !matches!(other.output, OutputFormat::Json) {
            self.output = other.output;
        }

        self
    }

    /// Validate the final configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "jobs must be at least 1".to_string(),
            });
        }
        if self.net_timeout == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "net-timeout must be at least 1 second".to_string(),
            });
        }

        for (name, value) in [
            ("thoth-url", &self.thoth_url),
            ("package-index", &self.package_index),
            ("license-url", &self.license_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    reason: format!("{name} must not be empty"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    include!("config.test.rs");
}
