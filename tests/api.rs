use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use ringette_tagger::{
    config::AppConfig,
    dao::backend::http::{HttpBackendConfig, HttpTaggingBackend},
    routes,
    state::{AppState, SharedState},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn mock_backend() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tagging/questions/team"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "questions": [
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
                    "prompt": "Where?",
                    "is_terminal": true
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tagging/roster-for-game"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tagging/load/team-tags/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    server
}

async fn app_with(server: &MockServer) -> (Router, SharedState) {
    let state = AppState::new(&AppConfig::default());
    let backend = HttpTaggingBackend::new(HttpBackendConfig::new(server.uri())).unwrap();
    state.set_backend(Arc::new(backend)).await;
    (routes::router(state.clone()), state)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn degraded_service_reports_it_and_refuses_sessions() {
    let state = AppState::new(&AppConfig::default());
    let app = routes::router(state);

    let (status, body) = call(&app, Method::GET, "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    let (status, _) = call(
        &app,
        Method::POST,
        "/session",
        Some(json!({ "game_id": 5, "mode": "team" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn record_is_committed_listed_and_deleted() {
    let server = mock_backend().await;
    Mock::given(method("POST"))
        .and(path("/tagging/add-team-tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 77 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tagging/delete/team-tag/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    let (app, _state) = app_with(&server).await;

    let (status, session) = call(
        &app,
        Method::POST,
        "/session",
        Some(json!({ "game_id": 5, "mode": "team" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["current"]["id"], 1);
    assert_eq!(session["current"]["type"], "choice");

    let (status, answered) = call(
        &app,
        Method::POST,
        "/session/answer",
        Some(json!({ "answer": { "kind": "choice", "option": 0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answered["session"]["current"]["type"], "location_pick");
    assert!(answered.get("committed").is_none());

    let (status, answered) = call(
        &app,
        Method::POST,
        "/session/answer",
        Some(json!({ "answer": { "kind": "location", "x": 30, "y": 70 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answered["committed"]["record_id"], 77);
    assert_eq!(answered["committed"]["position"], 1);
    assert_eq!(answered["committed"]["fields"]["location"], json!({ "x": 30, "y": 70 }));
    assert_eq!(answered["session"]["current"]["id"], 1);

    let (status, tags) = call(&app, Method::GET, "/session/tags", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::DELETE, "/session/tags/77", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tags) = call(&app, Method::GET, "/session/tags", None).await;
    assert!(tags.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn failed_commit_is_rolled_back() {
    let server = mock_backend().await;
    Mock::given(method("POST"))
        .and(path("/tagging/add-team-tag"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (app, _state) = app_with(&server).await;

    call(
        &app,
        Method::POST,
        "/session",
        Some(json!({ "game_id": 5, "mode": "team" })),
    )
    .await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/session/answer",
        Some(json!({ "answer": { "kind": "choice", "option": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["message"].is_string());

    let (_, tags) = call(&app, Method::GET, "/session/tags", None).await;
    assert!(tags.as_array().unwrap().is_empty());

    let (_, session) = call(&app, Method::GET, "/session", None).await;
    assert_eq!(session["phase"], "traversing");
    assert_eq!(session["current"]["id"], 1);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let server = mock_backend().await;
    let (app, _state) = app_with(&server).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/session",
        Some(json!({ "game_id": 5, "mode": "goalie" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        Method::POST,
        "/session",
        Some(json!({ "game_id": 0, "mode": "team" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/session/answer",
        Some(json!({ "answer": { "kind": "choice", "option": 0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    call(
        &app,
        Method::POST,
        "/session",
        Some(json!({ "game_id": 5, "mode": "team" })),
    )
    .await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/session/answer",
        Some(json!({ "answer": { "kind": "location", "x": 1, "y": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::DELETE, "/session/tags/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
