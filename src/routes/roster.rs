use axum::{Json, Router, extract::State, routing::get};
use axum_valid::Valid;

use crate::{
    dto::roster::{ReplaceRosterRequest, RosterResponse},
    error::AppError,
    services::roster_service,
    state::SharedState,
};

/// Roster endpoints for the game of the open session.
pub fn router() -> Router<SharedState> {
    Router::new().route("/session/roster", get(get_roster).put(replace_roster))
}

/// Roster of the session's game, reloaded from the backend.
#[utoipa::path(
    get,
    path = "/session/roster",
    tag = "roster",
    responses(
        (status = 200, description = "Current roster", body = RosterResponse),
        (status = 404, description = "No open session")
    )
)]
pub async fn get_roster(State(state): State<SharedState>) -> Result<Json<RosterResponse>, AppError> {
    Ok(Json(roster_service::roster(&state).await?))
}

/// Replace the roster of the session's game.
#[utoipa::path(
    put,
    path = "/session/roster",
    tag = "roster",
    request_body = ReplaceRosterRequest,
    responses(
        (status = 200, description = "Roster stored", body = RosterResponse),
        (status = 400, description = "Line, slot or player conflict"),
        (status = 404, description = "No open session")
    )
)]
pub async fn replace_roster(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ReplaceRosterRequest>>,
) -> Result<Json<RosterResponse>, AppError> {
    Ok(Json(
        roster_service::replace_roster(&state, payload.entries).await?,
    ))
}
