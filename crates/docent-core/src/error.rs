use thiserror::Error;

/// Top-level error type for the Docent system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for DocentError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl From<toml::de::Error> for DocentError {
    fn from(err: toml::de::Error) -> Self {
        DocentError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DocentError {
    fn from(err: toml::ser::Error) -> Self {
        DocentError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DocentError {
    fn from(err: serde_json::Error) -> Self {
        DocentError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Docent operations.
pub type Result<T> = std::result::Result<T, DocentError>;
