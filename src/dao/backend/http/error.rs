//! Error types shared by the HTTP backend implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::{dao::error::BackendError, state::mode::TaggingMode};

/// Convenient result alias returning [`HttpBackendError`] failures.
pub type HttpResult<T> = Result<T, HttpBackendError>;

/// Failures that can occur while talking to the scoring backend.
#[derive(Debug, Error)]
pub enum HttpBackendError {
    /// Required environment variable is missing.
    #[error("missing tagging backend environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build tagging backend client")]
    ClientBuilder {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent.
    #[error("failed to send tagging backend request to `{path}`")]
    RequestSend {
        /// Request path relative to the base URL.
        path: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The backend returned an unexpected status code.
    #[error("unexpected tagging backend response status {status} for `{path}`")]
    RequestStatus {
        /// Request path relative to the base URL.
        path: String,
        /// Status returned by the backend.
        status: StatusCode,
    },
    /// The response body could not be read.
    #[error("failed to read tagging backend response for `{path}`")]
    ReadBody {
        /// Request path relative to the base URL.
        path: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body is not the expected JSON document.
    #[error("failed to decode tagging backend response for `{path}`")]
    DecodeResponse {
        /// Request path relative to the base URL.
        path: String,
        /// Decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// The backend answered `success: false` to a delete.
    #[error("tagging backend refused to delete record {id}")]
    DeleteRefused {
        /// Backend id of the record.
        id: i64,
    },
    /// The mode has no endpoint.
    #[error("no tagging backend endpoint for mode `{mode}`")]
    UnsupportedMode {
        /// Mode that was requested.
        mode: TaggingMode,
    },
}

impl From<HttpBackendError> for BackendError {
    fn from(err: HttpBackendError) -> Self {
        match err {
            HttpBackendError::UnsupportedMode { mode } => BackendError::UnsupportedMode(mode),
            HttpBackendError::DeleteRefused { id } => BackendError::DeleteRejected { id },
            decode @ HttpBackendError::DecodeResponse { .. } => {
                BackendError::malformed(decode.to_string(), decode)
            }
            other => BackendError::unavailable(other.to_string(), other),
        }
    }
}
