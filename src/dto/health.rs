use serde::Serialize;
use utoipa::ToSchema;

/// Connectivity of the service to its tagging backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Backend installed and answering.
    Ok,
    /// No usable backend; session operations answer 503.
    Degraded,
}

/// Body of `GET /healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Current connectivity.
    pub status: HealthStatus,
}

impl HealthResponse {
    /// The backend is reachable.
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
        }
    }

    /// The service runs without a backend.
    pub fn degraded() -> Self {
        Self {
            status: HealthStatus::Degraded,
        }
    }
}
