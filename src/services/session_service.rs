use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    dto::{
        session::{AnswerResponse, SessionView},
        sse::NoticeLevel,
        tags::TagView,
    },
    error::ServiceError,
    services::{
        sse_events::{
            broadcast_notice, broadcast_session_closed, broadcast_session_opened,
            broadcast_session_updated, broadcast_tags_updated,
        },
        submitter,
    },
    state::{
        SharedState,
        graph::{QuestionGraph, QuestionNode},
        mode::TaggingMode,
        navigator::{Answer, AnswerOutcome},
        roster::Roster,
        tag_store::{CommittedRecord, TagSnapshot},
        tagging::ActiveSession,
    },
};

fn no_session() -> ServiceError {
    ServiceError::NotFound("no open session".into())
}

/// Open a session for `game_id` in `mode`, replacing any open one.
///
/// The catalog must load cleanly; roster and record hydration failures only
/// produce a notice. A rejected catalog leaves the previous session untouched.
pub async fn open_session(
    state: &SharedState,
    game_id: i64,
    mode: TaggingMode,
) -> Result<SessionView, ServiceError> {
    if !mode.is_supported() {
        return Err(ServiceError::UnsupportedMode(mode));
    }
    let backend = state.require_backend().await?;

    let catalog = backend.fetch_catalog(mode).await?;
    let graph = catalog
        .into_iter()
        .map(QuestionNode::try_from)
        .collect::<Result<Vec<_>, _>>()
        .and_then(QuestionGraph::load)
        .inspect_err(|err| warn!(%mode, error = %err, "question catalog rejected"))?;

    let mut notices = Vec::new();

    let roster = match backend.load_roster(game_id).await {
        Ok(entities) => Roster::try_from(entities).unwrap_or_else(|err| {
            warn!(game_id, error = %err, "stored roster is invalid; starting without one");
            notices.push(format!("roster of game {game_id} is invalid: {err}"));
            Roster::default()
        }),
        Err(err) => {
            warn!(game_id, error = %err, "failed to load roster");
            notices.push(format!("roster of game {game_id} could not be loaded"));
            Roster::default()
        }
    };

    let snapshot = match backend.load_tags(mode, game_id).await {
        Ok(records) => TagSnapshot::from_committed(
            records
                .into_iter()
                .map(|record| CommittedRecord::from_entity(record, game_id, mode)),
        ),
        Err(err) => {
            warn!(game_id, %mode, error = %err, "failed to load existing records");
            notices.push(format!("existing records of game {game_id} could not be loaded"));
            TagSnapshot::default()
        }
    };

    let mut session = ActiveSession::new(game_id, mode);
    session.roster = roster;
    session.tags.restore(snapshot);
    let graph = Arc::new(graph);

    let (previous, view) = state
        .with_tagging_mut(|ctx| {
            let previous = ctx.close();
            ctx.navigator.load(graph)?;
            ctx.active = Some(session);
            if let Some(active) = ctx.active.as_ref() {
                broadcast_tags_updated(state, active);
            }
            let view = SessionView::from_context(ctx).ok_or_else(no_session)?;
            Ok::<_, ServiceError>((previous, view))
        })
        .await?;

    if let Some(previous) = previous {
        info!(session_id = %previous.id, "replacing open session");
        broadcast_session_closed(state, &previous);
    }
    info!(session_id = %view.session_id, game_id, %mode, tags = view.tag_count, "session opened");
    broadcast_session_opened(state, &view);
    for notice in notices {
        broadcast_notice(state, NoticeLevel::Warning, notice);
    }
    Ok(view)
}

/// Close the open session and drop its store.
pub async fn close_session(state: &SharedState) -> Result<(), ServiceError> {
    let closed = state
        .with_tagging_mut(|ctx| ctx.close())
        .await
        .ok_or_else(no_session)?;
    info!(session_id = %closed.id, "session closed");
    broadcast_session_closed(state, &closed);
    Ok(())
}

/// Projection of the open session.
pub async fn session_view(state: &SharedState) -> Result<SessionView, ServiceError> {
    state
        .read_tagging(SessionView::from_context)
        .await
        .ok_or_else(no_session)
}

/// Answer the current question; a terminal answer commits the record.
///
/// The commit runs on its own task, so dropping this future never leaves the
/// navigator waiting on a commit nobody settles.
pub async fn answer(state: &SharedState, answer: Answer) -> Result<AnswerResponse, ServiceError> {
    let (session_id, outcome) = state
        .with_tagging_mut(|ctx| {
            let active = ctx.active.as_ref().ok_or_else(no_session)?;
            let outcome = ctx.navigator.answer(answer, &active.roster)?;
            Ok::<_, ServiceError>((active.id, outcome))
        })
        .await?;

    let committed = match outcome {
        AnswerOutcome::Advanced => None,
        AnswerOutcome::Completed(draft) => {
            // Detached so the commit settles even when the caller goes away.
            let commit = tokio::spawn({
                let state = state.clone();
                async move {
                    let result = submitter::finalize(&state, session_id, draft).await;
                    if result.is_err() {
                        publish_view(&state).await;
                    }
                    result
                }
            });
            let result = commit.await.map_err(|err| {
                error!(%session_id, error = %err, "commit task did not complete");
                ServiceError::InvalidState(format!("commit task did not complete: {err}"))
            })?;
            Some(result?)
        }
    };

    let session = publish_view(state).await.ok_or_else(no_session)?;
    Ok(AnswerResponse { session, committed })
}

/// Undo the last answer. An empty history leaves the session as it is.
pub async fn step_back(state: &SharedState) -> Result<SessionView, ServiceError> {
    state
        .with_tagging_mut(|ctx| {
            ctx.active.as_ref().ok_or_else(no_session)?;
            ctx.navigator.step_back()?;
            Ok::<_, ServiceError>(())
        })
        .await?;
    publish_view(state).await.ok_or_else(no_session)
}

/// Abandon the draft and return to the first question.
pub async fn reset(state: &SharedState) -> Result<SessionView, ServiceError> {
    state
        .with_tagging_mut(|ctx| {
            ctx.active.as_ref().ok_or_else(no_session)?;
            ctx.navigator.reset()?;
            Ok::<_, ServiceError>(())
        })
        .await?;
    publish_view(state).await.ok_or_else(no_session)
}

/// Records of the open session in insertion order.
pub async fn tags(state: &SharedState) -> Result<Vec<TagView>, ServiceError> {
    state
        .read_tagging(|ctx| ctx.active.as_ref().map(|active| TagView::list(active.tags.all())))
        .await
        .ok_or_else(no_session)
}

async fn publish_view(state: &SharedState) -> Option<SessionView> {
    let view = state.read_tagging(SessionView::from_context).await?;
    broadcast_session_updated(state, &view);
    Some(view)
}
