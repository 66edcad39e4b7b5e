use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};

use crate::{
    dto::tags::TagView,
    error::AppError,
    services::{session_service, submitter},
    state::SharedState,
};

/// Record list endpoints of the open session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session/tags", get(list_tags))
        .route("/session/tags/{record_id}", delete(delete_tag))
}

/// Records of the open session in insertion order.
#[utoipa::path(
    get,
    path = "/session/tags",
    tag = "tags",
    responses(
        (status = 200, description = "Records, oldest first", body = [TagView]),
        (status = 404, description = "No open session")
    )
)]
pub async fn list_tags(State(state): State<SharedState>) -> Result<Json<Vec<TagView>>, AppError> {
    Ok(Json(session_service::tags(&state).await?))
}

/// Delete a committed record, remotely first.
#[utoipa::path(
    delete,
    path = "/session/tags/{record_id}",
    tag = "tags",
    params(("record_id" = i64, Path, description = "Backend id of the record")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Unknown record"),
        (status = 502, description = "Backend refused the delete; nothing changed")
    )
)]
pub async fn delete_tag(
    State(state): State<SharedState>,
    Path(record_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    submitter::delete_record(&state, record_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
