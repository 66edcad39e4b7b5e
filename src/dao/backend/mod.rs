/// HTTP implementation talking to the scoring backend.
pub mod http;

use futures::future::BoxFuture;

use crate::{
    dao::{
        error::BackendResult,
        models::{NodeEntity, RecordEntity, RosterEntryEntity},
    },
    state::{mode::TaggingMode, session::DraftRecord},
};

/// Abstraction over the remote scoring backend used by tagging sessions.
pub trait TaggingBackend: Send + Sync {
    /// Question catalog of a mode, in catalog order.
    fn fetch_catalog(&self, mode: TaggingMode) -> BoxFuture<'static, BackendResult<Vec<NodeEntity>>>;
    /// Persist a completed record and return its backend id.
    fn commit_tag(
        &self,
        mode: TaggingMode,
        game_id: i64,
        fields: DraftRecord,
    ) -> BoxFuture<'static, BackendResult<i64>>;
    /// Delete a committed record.
    fn delete_tag(&self, mode: TaggingMode, id: i64) -> BoxFuture<'static, BackendResult<()>>;
    /// Records already stored for a game.
    fn load_tags(
        &self,
        mode: TaggingMode,
        game_id: i64,
    ) -> BoxFuture<'static, BackendResult<Vec<RecordEntity>>>;
    /// Roster of a game.
    fn load_roster(&self, game_id: i64) -> BoxFuture<'static, BackendResult<Vec<RosterEntryEntity>>>;
    /// Replace the roster of a game, returning what the backend stored.
    fn replace_roster(
        &self,
        game_id: i64,
        entries: Vec<RosterEntryEntity>,
    ) -> BoxFuture<'static, BackendResult<Vec<RosterEntryEntity>>>;
    /// Cheap liveness probe.
    fn health_check(&self) -> BoxFuture<'static, BackendResult<()>>;
}
