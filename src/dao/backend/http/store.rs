use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, Response};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    dao::{
        backend::TaggingBackend,
        error::BackendResult,
        models::{
            CatalogResponse, CommitTagBody, DeleteResponse, IdResponse, NodeEntity, RecordEntity,
            RosterEntryEntity, TagBody,
        },
    },
    state::{mode::TaggingMode, session::DraftRecord},
};

use super::{
    config::HttpBackendConfig,
    error::{HttpBackendError, HttpResult},
};

const HEALTH_PATH: &str = "tagging/test";
const ROSTER_PATH: &str = "tagging/roster-for-game";

/// [`TaggingBackend`] talking JSON over HTTP to the scoring backend.
#[derive(Clone)]
pub struct HttpTaggingBackend {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl HttpTaggingBackend {
    /// Build the client and check that the backend answers.
    pub async fn connect(config: HttpBackendConfig) -> HttpResult<Self> {
        let backend = Self::new(config)?;
        backend.ping().await?;
        Ok(backend)
    }

    /// Build the client without contacting the backend.
    pub fn new(config: HttpBackendConfig) -> HttpResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| HttpBackendError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            token: config.token.map(Arc::<str>::from),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        if let Some(ref token) = self.token {
            builder.bearer_auth(token.as_ref())
        } else {
            builder
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, path: &str) -> HttpResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|source| HttpBackendError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(HttpBackendError::RequestStatus {
                path: path.to_string(),
                status: response.status(),
            })
        }
    }

    async fn read_body(response: Response, path: &str) -> HttpResult<Vec<u8>> {
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| HttpBackendError::ReadBody {
                path: path.to_string(),
                source,
            })
    }

    async fn get_json<T>(&self, builder: reqwest::RequestBuilder, path: &str) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(builder, path).await?;
        let body = Self::read_body(response, path).await?;
        serde_json::from_slice(&body).map_err(|source| HttpBackendError::DecodeResponse {
            path: path.to_string(),
            source,
        })
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> HttpResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path).json(body);
        self.get_json(builder, path).await
    }

    async fn ping(&self) -> HttpResult<()> {
        self.send(self.request(Method::GET, HEALTH_PATH), HEALTH_PATH)
            .await
            .map(|_| ())
    }

    async fn delete(&self, mode: TaggingMode, id: i64) -> HttpResult<()> {
        let path = delete_path(mode, id).ok_or(HttpBackendError::UnsupportedMode { mode })?;
        let response = self.send(self.request(Method::DELETE, &path), &path).await?;
        let body = Self::read_body(response, &path).await?;

        // An empty or non-JSON 2xx body still means the record is gone.
        match serde_json::from_slice::<DeleteResponse>(&body) {
            Ok(DeleteResponse { success: false }) => Err(HttpBackendError::DeleteRefused { id }),
            _ => Ok(()),
        }
    }
}

fn mode_segment(mode: TaggingMode) -> Option<&'static str> {
    match mode {
        TaggingMode::Team => Some("team"),
        TaggingMode::Player => Some("player"),
        TaggingMode::Goalie => None,
    }
}

fn catalog_path(mode: TaggingMode) -> Option<String> {
    mode_segment(mode).map(|segment| format!("tagging/questions/{segment}"))
}

fn commit_path(mode: TaggingMode) -> Option<&'static str> {
    match mode {
        TaggingMode::Team => Some("tagging/add-team-tag"),
        TaggingMode::Player => Some("tagging/add-players-tag"),
        TaggingMode::Goalie => None,
    }
}

fn delete_path(mode: TaggingMode, id: i64) -> Option<String> {
    mode_segment(mode).map(|segment| format!("tagging/delete/{segment}-tag/{id}"))
}

fn load_path(mode: TaggingMode, game_id: i64) -> Option<String> {
    mode_segment(mode).map(|segment| format!("tagging/load/{segment}-tags/{game_id}"))
}

impl TaggingBackend for HttpTaggingBackend {
    fn fetch_catalog(&self, mode: TaggingMode) -> BoxFuture<'static, BackendResult<Vec<NodeEntity>>> {
        let backend = self.clone();
        Box::pin(async move {
            let path = catalog_path(mode).ok_or(HttpBackendError::UnsupportedMode { mode })?;
            let catalog: CatalogResponse = backend
                .get_json(backend.request(Method::GET, &path), &path)
                .await?;
            Ok(catalog.questions)
        })
    }

    fn commit_tag(
        &self,
        mode: TaggingMode,
        game_id: i64,
        fields: DraftRecord,
    ) -> BoxFuture<'static, BackendResult<i64>> {
        let backend = self.clone();
        Box::pin(async move {
            let path = commit_path(mode).ok_or(HttpBackendError::UnsupportedMode { mode })?;
            let body = CommitTagBody {
                tag: TagBody { game_id, fields },
            };
            let created: IdResponse = backend.send_json(Method::POST, path, &body).await?;
            Ok(created.id)
        })
    }

    fn delete_tag(&self, mode: TaggingMode, id: i64) -> BoxFuture<'static, BackendResult<()>> {
        let backend = self.clone();
        Box::pin(async move { backend.delete(mode, id).await.map_err(Into::into) })
    }

    fn load_tags(
        &self,
        mode: TaggingMode,
        game_id: i64,
    ) -> BoxFuture<'static, BackendResult<Vec<RecordEntity>>> {
        let backend = self.clone();
        Box::pin(async move {
            let path = load_path(mode, game_id).ok_or(HttpBackendError::UnsupportedMode { mode })?;
            backend
                .get_json(backend.request(Method::GET, &path), &path)
                .await
                .map_err(Into::into)
        })
    }

    fn load_roster(&self, game_id: i64) -> BoxFuture<'static, BackendResult<Vec<RosterEntryEntity>>> {
        let backend = self.clone();
        Box::pin(async move {
            let builder = backend
                .request(Method::GET, ROSTER_PATH)
                .query(&[("game_id", game_id)]);
            backend.get_json(builder, ROSTER_PATH).await.map_err(Into::into)
        })
    }

    fn replace_roster(
        &self,
        game_id: i64,
        entries: Vec<RosterEntryEntity>,
    ) -> BoxFuture<'static, BackendResult<Vec<RosterEntryEntity>>> {
        let backend = self.clone();
        Box::pin(async move {
            let builder = backend
                .request(Method::PUT, ROSTER_PATH)
                .query(&[("game_id", game_id)])
                .json(&entries);
            backend.get_json(builder, ROSTER_PATH).await.map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, BackendResult<()>> {
        let backend = self.clone();
        Box::pin(async move { backend.ping().await.map_err(Into::into) })
    }
}
