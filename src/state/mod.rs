/// Question catalog validated into a traversable graph.
pub mod graph;
/// Tagging modes.
pub mod mode;
/// Question navigation driven by answers.
pub mod navigator;
/// Game roster and participant selection.
pub mod roster;
/// Traversal reducer over the draft record.
pub mod session;
mod sse;
/// Navigator phase transitions.
pub mod state_machine;
/// Ordered store of pending and committed records.
pub mod tag_store;
/// Active session held in shared state.
pub mod tagging;

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, MutexGuard, RwLock, watch};

use crate::{config::AppConfig, dao::backend::TaggingBackend, error::ServiceError};

pub use self::sse::SseHub;
use self::tagging::TaggingContext;

/// Handle to [`AppState`] shared by every route and task.
pub type SharedState = Arc<AppState>;

/// Central application state: backend handle, tagging session and event hub.
pub struct AppState {
    backend: RwLock<Option<Arc<dyn TaggingBackend>>>,
    events: SseHub,
    tagging: RwLock<TaggingContext>,
    degraded: watch::Sender<bool>,
    commit_gate: Mutex<()>,
    commit_timeout: Duration,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a backend is installed.
    pub fn new(config: &AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            backend: RwLock::new(None),
            events: SseHub::new(config.sse_capacity),
            tagging: RwLock::new(TaggingContext::default()),
            degraded: degraded_tx,
            commit_gate: Mutex::new(()),
            commit_timeout: config.commit_timeout,
        })
    }

    /// Obtain a handle to the current backend, if one is installed.
    pub async fn backend(&self) -> Option<Arc<dyn TaggingBackend>> {
        let guard = self.backend.read().await;
        guard.as_ref().cloned()
    }

    /// Current backend, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_backend(&self) -> Result<Arc<dyn TaggingBackend>, ServiceError> {
        self.backend().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new backend implementation and leave degraded mode.
    pub async fn set_backend(&self, backend: Arc<dyn TaggingBackend>) {
        {
            let mut guard = self.backend.write().await;
            *guard = Some(backend);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current backend and enter degraded mode.
    pub async fn clear_backend(&self) {
        {
            let mut guard = self.backend.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Broadcast hub used for the SSE stream.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Run `f` against the tagging context under the read lock.
    pub async fn read_tagging<R>(&self, f: impl FnOnce(&TaggingContext) -> R) -> R {
        let guard = self.tagging.read().await;
        f(&guard)
    }

    /// Run `f` against the tagging context under the write lock.
    pub async fn with_tagging_mut<R>(&self, f: impl FnOnce(&mut TaggingContext) -> R) -> R {
        let mut guard = self.tagging.write().await;
        f(&mut guard)
    }

    /// Serialize commits: at most one finalize is in flight.
    pub async fn lock_commits(&self) -> MutexGuard<'_, ()> {
        self.commit_gate.lock().await
    }

    /// Upper bound for one remote commit.
    pub fn commit_timeout(&self) -> Duration {
        self.commit_timeout
    }
}
