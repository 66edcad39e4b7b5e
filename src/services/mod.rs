/// Backend connection supervisor toggling degraded mode.
pub mod backend_supervisor;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Game roster loading and replacement.
pub mod roster_service;
/// Session lifecycle and question navigation.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Record commits and deletes against the backend.
pub mod submitter;

#[cfg(test)]
pub(crate) mod test_support;
