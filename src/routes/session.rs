use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dto::session::{AnswerRequest, AnswerResponse, OpenSessionRequest, SessionView},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Session lifecycle and navigation endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/session",
            post(open_session).get(get_session).delete(close_session),
        )
        .route("/session/answer", post(answer))
        .route("/session/back", post(step_back))
        .route("/session/reset", post(reset))
}

/// Open a tagging session for a game, replacing the current one.
#[utoipa::path(
    post,
    path = "/session",
    tag = "session",
    request_body = OpenSessionRequest,
    responses(
        (status = 200, description = "Session opened on its first question", body = SessionView),
        (status = 422, description = "Mode has no remote endpoint"),
        (status = 502, description = "Catalog could not be loaded or is malformed"),
        (status = 503, description = "No backend connection")
    )
)]
pub async fn open_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<OpenSessionRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let view = session_service::open_session(&state, payload.game_id, payload.mode).await?;
    Ok(Json(view))
}

/// Current question, draft and history of the open session.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Open session", body = SessionView),
        (status = 404, description = "No open session")
    )
)]
pub async fn get_session(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::session_view(&state).await?))
}

/// Close the open session.
#[utoipa::path(
    delete,
    path = "/session",
    tag = "session",
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "No open session")
    )
)]
pub async fn close_session(State(state): State<SharedState>) -> Result<StatusCode, AppError> {
    session_service::close_session(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Answer the current question. A terminal answer commits the record.
#[utoipa::path(
    post,
    path = "/session/answer",
    tag = "session",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer applied", body = AnswerResponse),
        (status = 400, description = "Answer does not fit the current question"),
        (status = 409, description = "A commit is in flight"),
        (status = 502, description = "Commit failed and was rolled back"),
        (status = 504, description = "Commit timed out and was rolled back")
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    Ok(Json(session_service::answer(&state, payload.answer).await?))
}

/// Go back to the previous question.
#[utoipa::path(
    post,
    path = "/session/back",
    tag = "session",
    responses(
        (status = 200, description = "Previous question restored", body = SessionView),
        (status = 409, description = "A commit is in flight")
    )
)]
pub async fn step_back(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::step_back(&state).await?))
}

/// Drop the draft and return to the first question.
#[utoipa::path(
    post,
    path = "/session/reset",
    tag = "session",
    responses(
        (status = 200, description = "Traversal restarted", body = SessionView),
        (status = 409, description = "A commit is in flight")
    )
)]
pub async fn reset(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::reset(&state).await?))
}
