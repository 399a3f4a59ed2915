use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;

/// Core error type for pgmig
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration file path invalid: {path}")]
    InvalidPath { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{message}")]
    Validation { message: String },

    #[error("could not ensure migrations directory at: {path}")]
    Directory {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("{message}")]
    InvalidArgument { message: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CoreError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a directory error, keeping the underlying IO failure when there is one
    pub fn directory(path: impl Into<String>, source: Option<std::io::Error>) -> Self {
        Self::Directory {
            path: path.into(),
            source,
        }
    }

    /// Check if the error is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if the error is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Check if the engine reported that there was nothing to do
    pub fn is_no_change(&self) -> bool {
        matches!(self, Self::Engine(EngineError::NoChange))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
