use crate::BuiltinType;
use ng_uaserver_error::NGError;
use thiserror::Error;

/// Per-operation data source errors.
///
/// Every variant except [`DataSourceError::Corrupted`] is reported back to the
/// runtime for the single read or write that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataSourceError {
    /// A sub-range was requested on a value that cannot be range-addressed.
    #[error("index range is invalid or not supported by this data source")]
    InvalidRange,

    /// The snapshot buffer could not be allocated.
    #[error("out of memory while building a snapshot")]
    OutOfMemory,

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: BuiltinType,
        actual: BuiltinType,
    },

    /// The incoming value has no scalar representation in the value model.
    #[error("unsupported value: {reason}")]
    UnsupportedValue { reason: String },

    /// The backing OS resource failed while reading or writing.
    #[error("backing resource of '{provider}' failed: {reason}")]
    Io { provider: String, reason: String },

    /// The backing resource produced unparsable data.
    #[error("corrupted reading from '{provider}': {raw:?}")]
    Corrupted { provider: String, raw: String },
}

impl DataSourceError {
    #[inline]
    pub fn io(provider: &str, err: std::io::Error) -> Self {
        DataSourceError::Io {
            provider: provider.to_string(),
            reason: err.to_string(),
        }
    }

    /// Whether this error signals a broken deployment rather than a transient fault.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, DataSourceError::Corrupted { .. })
    }
}

impl From<DataSourceError> for NGError {
    fn from(e: DataSourceError) -> Self {
        if e.is_fatal() {
            NGError::DataCorruption(e.to_string())
        } else {
            NGError::DataSourceError(e.to_string())
        }
    }
}
