use anyhow::Error as AnyhowError;
use config::ConfigError;
use std::io::Error as IoError;
use thiserror::Error;

pub type NGResult<T, E = NGError> = anyhow::Result<T, E>;

#[derive(Error, Debug)]
pub enum NGError {
    #[error("{0}")]
    Msg(String),
    #[error("{0}")]
    IoError(#[from] IoError),
    #[error("{0}")]
    Anyhow(#[from] AnyhowError),
    #[error("{0}")]
    ConfigError(#[from] ConfigError),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Initialization error: {0}")]
    InitializationError(String),
    #[error("Registration error: {0}")]
    RegistrationError(String),
    #[error("Data source error: {0}")]
    DataSourceError(String),
    /// A backing resource produced data that cannot be interpreted.
    ///
    /// This always indicates a broken deployment and is never retried.
    #[error("Data corruption: {0}")]
    DataCorruption(String),
}

impl NGError {
    /// Whether the process must terminate instead of continuing with degraded service.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, NGError::DataCorruption(_))
    }
}

impl From<String> for NGError {
    #[inline]
    fn from(e: String) -> Self {
        NGError::Msg(e)
    }
}

impl From<&str> for NGError {
    #[inline]
    fn from(e: &str) -> Self {
        NGError::Msg(e.to_string())
    }
}
