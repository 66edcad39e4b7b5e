//! Persists completed records and deletes committed ones.
//!
//! A finalize appends a pending entry, performs exactly one remote write
//! bounded by the commit timeout, then promotes or rolls back that entry.
//! The commit gate keeps at most one finalize in flight, so the store order
//! always matches the order in which records were completed.

use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::error::BackendError,
    dto::{sse::NoticeLevel, tags::TagView},
    error::ServiceError,
    services::sse_events::{broadcast_notice, broadcast_tags_updated},
    state::{
        SharedState,
        session::DraftRecord,
        tag_store::{AttemptId, CommittedRecord, RecordId},
    },
};

/// Persist `draft` for the session `session_id` and settle its navigator.
///
/// Returns the committed entry. On failure the store is left as it was before
/// the call and a notice is broadcast.
pub async fn finalize(
    state: &SharedState,
    session_id: Uuid,
    draft: DraftRecord,
) -> Result<TagView, ServiceError> {
    let _gate = state.lock_commits().await;

    let backend = match state.require_backend().await {
        Ok(backend) => backend,
        Err(err) => {
            abandon(state, session_id).await;
            return Err(err);
        }
    };

    let attempt = AttemptId::new();
    let reserved = state
        .with_tagging_mut(|ctx| {
            let active = ctx
                .current_mut(session_id)
                .ok_or_else(|| ServiceError::InvalidState("session was closed".into()))?;
            if !active.mode.is_supported() {
                return Err(ServiceError::UnsupportedMode(active.mode));
            }
            let record = CommittedRecord::new(active.game_id, active.mode, draft.clone());
            let placeholder = active.tags.append(record, attempt);
            broadcast_tags_updated(state, active);
            Ok((active.mode, active.game_id, placeholder))
        })
        .await;

    let (mode, game_id, placeholder) = match reserved {
        Ok(reserved) => reserved,
        Err(err) => {
            abandon(state, session_id).await;
            return Err(err);
        }
    };

    info!(%session_id, %attempt, %mode, game_id, "committing record");
    let outcome = match timeout(
        state.commit_timeout(),
        backend.commit_tag(mode, game_id, draft),
    )
    .await
    {
        Ok(Ok(id)) => Ok(id),
        Ok(Err(BackendError::UnsupportedMode(mode))) => Err(ServiceError::UnsupportedMode(mode)),
        Ok(Err(err)) => {
            warn!(%attempt, error = %err, "record commit failed");
            Err(ServiceError::CommitFailed(err.to_string()))
        }
        Err(_) => {
            warn!(%attempt, timeout = ?state.commit_timeout(), "record commit timed out");
            Err(ServiceError::Timeout)
        }
    };

    let settled = state
        .with_tagging_mut(|ctx| {
            let active = ctx.current_mut(session_id)?;
            let committed = match &outcome {
                Ok(id) => {
                    active.tags.replace_id(placeholder, *id);
                    let record_id = RecordId::Remote(*id);
                    active
                        .tags
                        .all()
                        .iter()
                        .position(|entry| entry.record.record_id == record_id)
                        .map(|index| TagView::from_entry(index, &active.tags.all()[index]))
                }
                Err(_) => {
                    let removed = active.tags.rollback_attempt(attempt);
                    info!(%attempt, removed, "rolled back pending record");
                    None
                }
            };
            broadcast_tags_updated(state, active);

            if let Err(err) = ctx.navigator.settle(outcome.is_ok()) {
                warn!(error = %err, "navigator could not settle after commit");
            }
            Some(committed)
        })
        .await;

    let Some(committed) = settled else {
        if let Ok(id) = &outcome {
            warn!(%session_id, record_id = id, "session replaced during commit; record kept remotely only");
        } else {
            info!(%session_id, "session replaced during commit; discarding result");
        }
        return Err(ServiceError::InvalidState(
            "session was replaced while the record was being committed".into(),
        ));
    };

    match outcome {
        Ok(id) => committed.ok_or_else(|| {
            ServiceError::InvalidState(format!("committed record {id} vanished from the store"))
        }),
        Err(err) => {
            broadcast_notice(
                state,
                NoticeLevel::Error,
                format!("record was not saved and has been rolled back: {err}"),
            );
            Err(err)
        }
    }
}

/// Delete the committed record `record_id` remotely, then locally.
///
/// Pending records have no backend id and cannot be addressed.
pub async fn delete_record(state: &SharedState, record_id: i64) -> Result<(), ServiceError> {
    let backend = state.require_backend().await?;
    let target = RecordId::Remote(record_id);

    let (session_id, mode) = state
        .read_tagging(|ctx| {
            let active = ctx
                .active
                .as_ref()
                .ok_or_else(|| ServiceError::NotFound("no open session".into()))?;
            active
                .tags
                .get(target)
                .ok_or_else(|| ServiceError::NotFound(format!("record {record_id}")))?;
            Ok::<_, ServiceError>((active.id, active.mode))
        })
        .await?;

    let result = match timeout(state.commit_timeout(), backend.delete_tag(mode, record_id)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(BackendError::UnsupportedMode(mode))) => Err(ServiceError::UnsupportedMode(mode)),
        Ok(Err(err)) => Err(ServiceError::DeleteFailed(err.to_string())),
        Err(_) => Err(ServiceError::Timeout),
    };

    if let Err(err) = result {
        warn!(record_id, error = %err, "record delete failed");
        broadcast_notice(
            state,
            NoticeLevel::Error,
            format!("record {record_id} could not be deleted: {err}"),
        );
        return Err(err);
    }

    state
        .with_tagging_mut(|ctx| {
            if let Some(active) = ctx.current_mut(session_id) {
                active.tags.remove_by_id(target);
                broadcast_tags_updated(state, active);
            }
        })
        .await;
    info!(record_id, "record deleted");
    Ok(())
}

/// Release the navigator of a finalize that never reached the backend.
async fn abandon(state: &SharedState, session_id: Uuid) {
    state
        .with_tagging_mut(|ctx| {
            if ctx.is_current(session_id) {
                if let Err(err) = ctx.navigator.settle(false) {
                    warn!(error = %err, "navigator could not settle after aborted commit");
                }
            }
        })
        .await;
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        services::{
            session_service,
            test_support::{FakeBackend, state_with, team_catalog},
        },
        state::{
            mode::TaggingMode, navigator::Answer, state_machine::NavigatorPhase,
            tag_store::EntryStatus,
        },
    };

    fn turnover() -> Answer {
        Answer::Choice { option: 1 }
    }

    async fn open_team(state: &SharedState) -> Uuid {
        session_service::open_session(state, 7, TaggingMode::Team)
            .await
            .unwrap()
            .session_id
    }

    #[tokio::test]
    async fn successful_commit_appends_one_committed_record_and_resets() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        let state = state_with(fake.clone()).await;
        open_team(&state).await;

        let response = session_service::answer(&state, turnover()).await.unwrap();

        let committed = response.committed.unwrap();
        assert_eq!(committed.position, 1);
        assert_eq!(committed.record_id, RecordId::Remote(101));
        assert_eq!(committed.status, EntryStatus::Committed);
        assert_eq!(committed.fields["play"], json!("turnover"));
        assert_eq!(response.session.current.unwrap().id, 1);
        assert!(response.session.draft.is_empty());
        assert_eq!(response.session.tag_count, 1);

        let commits = fake.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].1, 7);
    }

    #[tokio::test]
    async fn failed_commit_rolls_back_and_notifies() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        fake.edit(|inner| inner.fail_commits = true);
        let state = state_with(fake).await;
        open_team(&state).await;
        let mut events = state.events().subscribe();

        let err = session_service::answer(&state, turnover()).await.unwrap_err();
        assert!(matches!(err, ServiceError::CommitFailed(_)));

        let (phase, tags, draft_empty) = state
            .read_tagging(|ctx| {
                (
                    ctx.navigator.phase(),
                    ctx.active.as_ref().unwrap().tags.len(),
                    ctx.navigator.state().unwrap().draft().is_empty(),
                )
            })
            .await;
        assert_eq!(phase, NavigatorPhase::Traversing);
        assert_eq!(tags, 0);
        assert!(draft_empty);

        let mut saw_notice = false;
        while let Ok(event) = events.try_recv() {
            saw_notice |= event.event.as_deref() == Some("notice");
        }
        assert!(saw_notice);
    }

    #[tokio::test]
    async fn commit_timeout_counts_as_failure() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        fake.edit(|inner| inner.stall_commits = true);
        let state = state_with(fake).await;
        open_team(&state).await;

        let err = session_service::answer(&state, turnover()).await.unwrap_err();

        assert!(matches!(err, ServiceError::Timeout));
        let tags = state
            .read_tagging(|ctx| ctx.active.as_ref().unwrap().tags.len())
            .await;
        assert_eq!(tags, 0);
    }

    #[tokio::test]
    async fn answers_are_rejected_while_a_commit_is_in_flight() {
        let hold = Arc::new(Notify::new());
        let mut fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        fake.commit_hold = Some(hold.clone());
        let state = state_with(fake).await;
        open_team(&state).await;

        let pending = tokio::spawn({
            let state = state.clone();
            async move { session_service::answer(&state, turnover()).await }
        });
        while state.read_tagging(|ctx| ctx.navigator.phase()).await != NavigatorPhase::AwaitingCommit
        {
            tokio::task::yield_now().await;
        }

        let err = session_service::answer(&state, turnover()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let err = session_service::step_back(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        hold.notify_one();
        assert!(pending.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn commit_settles_after_the_caller_is_cancelled() {
        let hold = Arc::new(Notify::new());
        let mut fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        fake.commit_hold = Some(hold.clone());
        let state = state_with(fake.clone()).await;
        open_team(&state).await;

        let caller = tokio::spawn({
            let state = state.clone();
            async move { session_service::answer(&state, turnover()).await }
        });
        while state.read_tagging(|ctx| ctx.navigator.phase()).await != NavigatorPhase::AwaitingCommit
        {
            tokio::task::yield_now().await;
        }
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        hold.notify_one();
        tokio::time::timeout(Duration::from_secs(1), async {
            while state.read_tagging(|ctx| ctx.navigator.phase()).await
                != NavigatorPhase::Traversing
            {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let statuses = state
            .read_tagging(|ctx| {
                ctx.active
                    .as_ref()
                    .unwrap()
                    .tags
                    .all()
                    .iter()
                    .map(|entry| entry.status)
                    .collect::<Vec<_>>()
            })
            .await;
        assert_eq!(statuses, vec![EntryStatus::Committed]);
        assert_eq!(fake.commits().len(), 1);

        hold.notify_one();
        let next = session_service::answer(&state, turnover()).await.unwrap();
        assert_eq!(next.session.tag_count, 2);
    }

    #[tokio::test]
    async fn late_result_of_a_replaced_session_is_discarded() {
        let hold = Arc::new(Notify::new());
        let mut fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        fake.commit_hold = Some(hold.clone());
        let state = state_with(fake).await;
        open_team(&state).await;

        let pending = tokio::spawn({
            let state = state.clone();
            async move { session_service::answer(&state, turnover()).await }
        });
        while state.read_tagging(|ctx| ctx.navigator.phase()).await != NavigatorPhase::AwaitingCommit
        {
            tokio::task::yield_now().await;
        }

        let replacement = open_team(&state).await;
        hold.notify_one();

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let (id, tags, phase) = state
            .read_tagging(|ctx| {
                let active = ctx.active.as_ref().unwrap();
                (active.id, active.tags.len(), ctx.navigator.phase())
            })
            .await;
        assert_eq!(id, replacement);
        assert_eq!(tags, 0);
        assert_eq!(phase, NavigatorPhase::Traversing);
    }

    #[tokio::test]
    async fn goalie_finalize_is_rejected_before_touching_the_store() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        let state = state_with(fake.clone()).await;
        let session_id = open_team(&state).await;
        state
            .with_tagging_mut(|ctx| ctx.active.as_mut().unwrap().mode = TaggingMode::Goalie)
            .await;

        let mut draft = DraftRecord::new();
        draft.insert("play".into(), json!("save"));
        let err = finalize(&state, session_id, draft).await.unwrap_err();

        assert!(matches!(err, ServiceError::UnsupportedMode(TaggingMode::Goalie)));
        assert!(fake.commits().is_empty());
        let tags = state
            .read_tagging(|ctx| ctx.active.as_ref().unwrap().tags.len())
            .await;
        assert_eq!(tags, 0);
    }

    #[tokio::test]
    async fn delete_removes_the_record_after_the_backend_agrees() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        let state = state_with(fake.clone()).await;
        open_team(&state).await;
        session_service::answer(&state, turnover()).await.unwrap();

        delete_record(&state, 101).await.unwrap();

        assert_eq!(fake.deleted(), vec![101]);
        let tags = state
            .read_tagging(|ctx| ctx.active.as_ref().unwrap().tags.len())
            .await;
        assert_eq!(tags, 0);
    }

    #[tokio::test]
    async fn refused_delete_leaves_the_store_unchanged() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        let state = state_with(fake.clone()).await;
        open_team(&state).await;
        session_service::answer(&state, turnover()).await.unwrap();
        fake.edit(|inner| inner.refuse_deletes = true);

        let err = delete_record(&state, 101).await.unwrap_err();

        assert!(matches!(err, ServiceError::DeleteFailed(_)));
        let tags = state
            .read_tagging(|ctx| ctx.active.as_ref().unwrap().tags.len())
            .await;
        assert_eq!(tags, 1);
    }

    #[tokio::test]
    async fn unknown_record_cannot_be_deleted() {
        let fake = FakeBackend::with_catalog(TaggingMode::Team, team_catalog());
        let state = state_with(fake.clone()).await;
        open_team(&state).await;

        let err = delete_record(&state, 55).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(fake.deleted().is_empty());
    }
}
