use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the installed backend. Degraded when none is installed or it fails the probe.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Some(backend) = state.backend().await else {
        return HealthResponse::degraded();
    };

    if let Err(err) = backend.health_check().await {
        warn!(error = %err, "tagging backend health check failed");
        return HealthResponse::degraded();
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
