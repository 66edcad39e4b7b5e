use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::RosterEntryEntity,
    dto::roster::RosterResponse,
    error::ServiceError,
    services::sse_events::broadcast_roster_updated,
    state::{
        SharedState,
        roster::{Roster, RosterEntry},
    },
};

async fn active_game(state: &SharedState) -> Result<(Uuid, i64), ServiceError> {
    state
        .read_tagging(|ctx| ctx.active.as_ref().map(|active| (active.id, active.game_id)))
        .await
        .ok_or_else(|| ServiceError::NotFound("no open session".into()))
}

/// Reload the roster of the session's game from the backend.
pub async fn roster(state: &SharedState) -> Result<RosterResponse, ServiceError> {
    let backend = state.require_backend().await?;
    let (session_id, game_id) = active_game(state).await?;

    let roster = Roster::try_from(backend.load_roster(game_id).await?)
        .map_err(|err| ServiceError::InvalidState(format!("stored roster is invalid: {err}")))?;
    let entries = roster.entries().to_vec();

    state
        .with_tagging_mut(|ctx| {
            if let Some(active) = ctx.current_mut(session_id) {
                active.roster = roster;
            }
        })
        .await;

    Ok(RosterResponse { game_id, entries })
}

/// Replace the roster of the session's game.
///
/// Entries are validated before anything is sent; the session keeps what the
/// backend reports as stored.
pub async fn replace_roster(
    state: &SharedState,
    entries: Vec<RosterEntry>,
) -> Result<RosterResponse, ServiceError> {
    Roster::new(entries.clone())?;
    let backend = state.require_backend().await?;
    let (session_id, game_id) = active_game(state).await?;

    let payload: Vec<RosterEntryEntity> = entries.into_iter().map(Into::into).collect();
    let stored = Roster::try_from(backend.replace_roster(game_id, payload).await?)
        .map_err(|err| ServiceError::InvalidState(format!("stored roster is invalid: {err}")))?;
    let entries = stored.entries().to_vec();

    state
        .with_tagging_mut(|ctx| {
            if let Some(active) = ctx.current_mut(session_id) {
                active.roster = stored;
            }
        })
        .await;

    info!(game_id, players = entries.len(), "roster replaced");
    broadcast_roster_updated(state, game_id, &entries);
    Ok(RosterResponse { game_id, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{
            session_service,
            test_support::{FakeBackend, state_with, team_catalog},
        },
        state::{mode::TaggingMode, roster::tests::first_line},
    };

    #[tokio::test]
    async fn replaced_roster_is_used_by_the_session() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        let state = state_with(fake.clone()).await;
        session_service::open_session(&state, 4, TaggingMode::Team)
            .await
            .unwrap();

        let response = replace_roster(&state, first_line().entries().to_vec()).await.unwrap();

        assert_eq!(response.game_id, 4);
        assert_eq!(response.entries.len(), 5);
        let known = state
            .read_tagging(|ctx| ctx.active.as_ref().unwrap().roster.contains(10))
            .await;
        assert!(known);
        assert_eq!(roster(&state).await.unwrap().entries, first_line().entries());
    }

    #[tokio::test]
    async fn duplicate_players_are_rejected_before_the_backend_is_called() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        let state = state_with(fake.clone()).await;
        session_service::open_session(&state, 4, TaggingMode::Team)
            .await
            .unwrap();

        let mut entries = first_line().entries().to_vec();
        entries[1].player = entries[0].player.clone();
        let err = replace_roster(&state, entries).await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(fake.inner.lock().unwrap().roster.is_empty());
    }
}
