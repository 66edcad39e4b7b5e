//! In-memory backend used by the service tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::BoxFuture;
use serde_json::json;
use tokio::sync::Notify;

use crate::{
    config::AppConfig,
    dao::{
        backend::TaggingBackend,
        error::{BackendError, BackendResult},
        models::{NodeEntity, RecordEntity, RosterEntryEntity},
    },
    state::{AppState, SharedState, mode::TaggingMode, session::DraftRecord},
};

#[derive(Debug)]
struct Broken;

impl std::fmt::Display for Broken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("backend refused")
    }
}

impl std::error::Error for Broken {}

#[derive(Default)]
pub(crate) struct FakeInner {
    pub catalogs: HashMap<TaggingMode, Vec<NodeEntity>>,
    pub records: Vec<RecordEntity>,
    pub roster: Vec<RosterEntryEntity>,
    pub commits: Vec<(TaggingMode, i64, DraftRecord)>,
    pub deleted: Vec<i64>,
    pub next_id: i64,
    pub fail_commits: bool,
    pub stall_commits: bool,
    pub refuse_deletes: bool,
    pub fail_record_load: bool,
}

/// Scriptable [`TaggingBackend`] keeping everything in memory.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    pub inner: Arc<Mutex<FakeInner>>,
    /// When set, commits wait for a notification before answering.
    pub commit_hold: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn with_catalog(mode: TaggingMode, nodes: Vec<NodeEntity>) -> Self {
        let fake = Self::default();
        {
            let mut inner = fake.inner.lock().unwrap();
            inner.catalogs.insert(mode, nodes);
            inner.next_id = 100;
        }
        fake
    }

    pub fn edit(&self, f: impl FnOnce(&mut FakeInner)) {
        f(&mut self.inner.lock().unwrap());
    }

    pub fn commits(&self) -> Vec<(TaggingMode, i64, DraftRecord)> {
        self.inner.lock().unwrap().commits.clone()
    }

    pub fn deleted(&self) -> Vec<i64> {
        self.inner.lock().unwrap().deleted.clone()
    }
}

fn unavailable() -> BackendError {
    BackendError::unavailable("fake backend failure".into(), Broken)
}

impl TaggingBackend for FakeBackend {
    fn fetch_catalog(&self, mode: TaggingMode) -> BoxFuture<'static, BackendResult<Vec<NodeEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let inner = inner.lock().unwrap();
            Ok(inner.catalogs.get(&mode).cloned().unwrap_or_default())
        })
    }

    fn commit_tag(
        &self,
        mode: TaggingMode,
        game_id: i64,
        fields: DraftRecord,
    ) -> BoxFuture<'static, BackendResult<i64>> {
        let inner = self.inner.clone();
        let hold = self.commit_hold.clone();
        Box::pin(async move {
            if let Some(hold) = hold {
                hold.notified().await;
            }
            let (fail, stall) = {
                let inner = inner.lock().unwrap();
                (inner.fail_commits, inner.stall_commits)
            };
            if stall {
                futures::future::pending::<()>().await;
            }
            if !mode.is_supported() {
                return Err(BackendError::UnsupportedMode(mode));
            }
            if fail {
                return Err(unavailable());
            }
            let mut inner = inner.lock().unwrap();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.commits.push((mode, game_id, fields));
            Ok(id)
        })
    }

    fn delete_tag(&self, _mode: TaggingMode, id: i64) -> BoxFuture<'static, BackendResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut inner = inner.lock().unwrap();
            if inner.refuse_deletes {
                return Err(BackendError::DeleteRejected { id });
            }
            inner.deleted.push(id);
            Ok(())
        })
    }

    fn load_tags(
        &self,
        _mode: TaggingMode,
        _game_id: i64,
    ) -> BoxFuture<'static, BackendResult<Vec<RecordEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let inner = inner.lock().unwrap();
            if inner.fail_record_load {
                return Err(unavailable());
            }
            Ok(inner.records.clone())
        })
    }

    fn load_roster(&self, _game_id: i64) -> BoxFuture<'static, BackendResult<Vec<RosterEntryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().unwrap().roster.clone()) })
    }

    fn replace_roster(
        &self,
        _game_id: i64,
        entries: Vec<RosterEntryEntity>,
    ) -> BoxFuture<'static, BackendResult<Vec<RosterEntryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut inner = inner.lock().unwrap();
            inner.roster = entries.clone();
            Ok(entries)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, BackendResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Two-question team catalog: the result picks a location question or ends.
pub(crate) fn team_catalog() -> Vec<NodeEntity> {
    serde_json::from_value(json!([
        {
            "id": 1,
            "type": "CHOICE",
            "key": "play",
            "prompt": "What happened?",
            "options": [
                { "value": "shot", "next_node_id": 2 },
                { "value": "turnover", "is_terminal": true }
            ]
        },
        {
            "id": 2,
            "type": "SHOT LOCATION",
            "prompt": "Where was the shot taken?",
            "is_terminal": true
        }
    ]))
    .unwrap()
}

/// Shared state with a short commit timeout and `backend` installed.
pub(crate) async fn state_with(backend: FakeBackend) -> SharedState {
    let config = AppConfig {
        commit_timeout: Duration::from_millis(100),
        ..AppConfig::default()
    };
    let state = AppState::new(&config);
    state.set_backend(Arc::new(backend)).await;
    state
}
