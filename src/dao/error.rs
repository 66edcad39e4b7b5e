use std::error::Error;

use thiserror::Error;

use crate::state::mode::TaggingMode;

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Error raised by tagging backends regardless of the transport.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached or refused the request.
    #[error("backend unavailable: {message}")]
    Unavailable {
        /// What was attempted.
        message: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend answered with a payload that could not be decoded.
    #[error("malformed backend response: {message}")]
    Malformed {
        /// What was decoded.
        message: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend acknowledged a delete without removing the record.
    #[error("backend refused to delete record {id}")]
    DeleteRejected {
        /// Backend id of the record.
        id: i64,
    },
    /// The mode has no remote endpoint.
    #[error("tagging mode `{0}` is not supported yet")]
    UnsupportedMode(TaggingMode),
}

impl BackendError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        BackendError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a malformed-response error from any decoding failure.
    pub fn malformed(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        BackendError::Malformed {
            message,
            source: Box::new(source),
        }
    }
}
