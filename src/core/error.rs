//! Error types for the doppel library.

use thiserror::Error;

/// Result type alias using doppel's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during duplicate analysis.
///
/// Invalid configuration is the only fatal condition in the core; every
/// other problem degrades to a skip, a warning, or a recorded failure.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analysis-specific error.
    #[error("Analysis error: {message}")]
    Analysis { message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a new analysis error.
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
