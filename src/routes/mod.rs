use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Health check endpoint.
pub mod health;
/// Roster endpoints.
pub mod roster;
/// Session lifecycle and navigation endpoints.
pub mod session;
/// Server-Sent Events endpoint.
pub mod sse;
/// Recorded tag endpoints.
pub mod tags;

/// Compose all route trees, wiring in shared state and the Swagger UI.
pub fn router(state: SharedState) -> Router<()> {
    let docs: Router<SharedState> = SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into();

    health::router()
        .merge(sse::router())
        .merge(session::router())
        .merge(tags::router())
        .merge(roster::router())
        .merge(docs)
        .with_state(state)
}
