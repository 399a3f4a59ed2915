//! Tracing setup for the pgmig binary.
//!
//! Logs always go to stderr; stdout belongs to the wizard's prompts and command output.

use anyhow::Result;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration for pgmig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "warn", "debug")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Environment filter (supports directives like "pgmig_core=debug,sqlx=warn")
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Debug output for pgmig itself, warnings only from sqlx
    pub fn verbose() -> Self {
        Self {
            level: "debug".to_string(),
            env_filter: Some("pgmig=debug,pgmig_core=debug,sqlx=warn".to_string()),
            ..Self::default()
        }
    }

    /// Use `level` as the filter, dropping any preset directives
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self.env_filter = None;
        self
    }

    pub fn with_json(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }

    /// Filter directives in effect when `RUST_LOG` is unset
    pub fn directives(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Initialize the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.directives()))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr))
            .try_init()?;
    }

    tracing::debug!(
        target: "pgmig::logging",
        "logging initialized (level: {}, format: {})",
        config.directives(),
        if config.json_format { "JSON" } else { "text" }
    );
    Ok(())
}
