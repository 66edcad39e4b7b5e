use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::error::BackendError,
    state::{
        graph::MalformedGraph, mode::TaggingMode, navigator::NavigationError,
        roster::RosterError, state_machine::InvalidTransition,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Remote backend failed or answered with garbage.
    #[error("backend unavailable")]
    Unavailable(#[source] BackendError),
    /// Application is running in degraded mode without a backend.
    #[error("backend unavailable (degraded mode)")]
    Degraded,
    /// The question catalog cannot drive a traversal.
    #[error("question catalog rejected: {0}")]
    MalformedGraph(#[from] MalformedGraph),
    /// The mode has no remote endpoint.
    #[error("tagging mode `{0}` is not supported yet")]
    UnsupportedMode(TaggingMode),
    /// A completed record could not be persisted and was rolled back.
    #[error("commit failed: {0}")]
    CommitFailed(String),
    /// A record could not be deleted; nothing changed locally.
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl From<BackendError> for ServiceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::UnsupportedMode(mode) => ServiceError::UnsupportedMode(mode),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<NavigationError> for ServiceError {
    fn from(err: NavigationError) -> Self {
        match err {
            NavigationError::NoGraph => ServiceError::NotFound(err.to_string()),
            NavigationError::CommitInFlight | NavigationError::Transition(_) => {
                ServiceError::InvalidState(err.to_string())
            }
            NavigationError::UnknownOption { .. }
            | NavigationError::AnswerMismatch { .. }
            | NavigationError::InvalidAnswer(_) => ServiceError::InvalidInput(err.to_string()),
            NavigationError::UnknownNode(_) => ServiceError::InvalidState(err.to_string()),
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<RosterError> for ServiceError {
    fn from(err: RosterError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Well-formed request the engine cannot honour.
    #[error("unprocessable: {0}")]
    UnprocessableEntity(String),
    /// Remote backend failed or answered with garbage.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Remote backend did not answer in time.
    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::BadGateway(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::MalformedGraph(source) => {
                AppError::BadGateway(format!("question catalog rejected: {source}"))
            }
            ServiceError::UnsupportedMode(mode) => {
                AppError::UnprocessableEntity(format!("tagging mode `{mode}` is not supported yet"))
            }
            ServiceError::CommitFailed(message) => AppError::BadGateway(message),
            ServiceError::DeleteFailed(message) => AppError::BadGateway(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Timeout => AppError::GatewayTimeout("backend did not answer in time".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
