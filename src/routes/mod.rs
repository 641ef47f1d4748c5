//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - Static review front end from the configured directory with index fallback
/// - CORS (allow any origin/method/headers); the service is meant for localhost
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/files", get(http::http_get_files).post(http::http_post_files))
        .route("/api/v1/load", post(http::http_post_load))
        .route("/api/v1/problem", get(http::http_get_problem))
        .route("/api/v1/navigate", post(http::http_post_navigate))
        .route("/api/v1/edit", post(http::http_post_edit))
        .route("/api/v1/search", post(http::http_post_search))
        .route("/api/v1/edit-mode", post(http::http_post_edit_mode))
        .route("/api/v1/save", post(http::http_post_save))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ReviewConfig;
    use crate::files::SelectedFiles;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn write_inputs(dir: &std::path::Path) {
        std::fs::write(
            dir.join("combined_input.jsonl"),
            "{\"problem_id\":11,\"problem_html\":{\"question_html\":\"<p>q</p>\"}}\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("results.jsonl"),
            "{\"problem_id\":11,\"unit_candidates\":[{\"unit_id\":3,\"valid_knowledges\":[{\"knowledge_id\":30,\"knowledge_name\":\"ratio\"}]}]}\n{\"problem_id\":12}\n",
        )
        .unwrap();
        std::fs::write(dir.join("criteria.jsonl"), "{\"problem_id\":11,\"unit_id\":3,\"knowledge_id\":30,\"knowledge_name\":\"ratio\",\"knowledge_checked\":true}\n").unwrap();
        std::fs::write(
            dir.join("unit_knowledge.json"),
            r#"{"list":[{"curriculum_name":"Numbers","unit_id":3,"unit_name":"Ratios","knowledge_id":30,"knowledge_name":"ratio"}]}"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn review_flow_over_http() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let state = Arc::new(AppState::new(ReviewConfig::default(), SelectedFiles::default()));
        let app = build_router(state);

        let (status, body) = call(&app, "POST", "/api/v1/load", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "missing_input");

        let names = ["combined_input.jsonl", "results.jsonl", "criteria.jsonl", "unit_knowledge.json"];
        let paths: Vec<_> = names.iter().map(|n| dir.path().join(n)).collect();
        let (_, body) = call(&app, "POST", "/api/v1/files", Some(json!({ "paths": paths }))).await;
        assert_eq!(body["can_load"], true);

        let (status, body) = call(&app, "POST", "/api/v1/load", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["problem"]["unit_candidates"][0]["unit_name"], "Ratios");
        assert_eq!(body["criteria"]["checked"]["30"], true);

        let (status, body) = call(&app, "POST", "/api/v1/edit", Some(json!({"op": "toggle_knowledge_necessity", "unit_index": 0, "knowledge_index": 0, "value": false}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["problem"]["unit_candidates"][0]["valid_knowledges"][0]["knowledge_necessity"], false);

        let (status, body) = call(&app, "POST", "/api/v1/navigate", Some(json!({"op": "find_id", "problem_id": 404}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "problem_not_found");

        let (_, body) = call(&app, "POST", "/api/v1/navigate", Some(json!({"op": "next"}))).await;
        assert_eq!(body["problem"]["problem_id"], 12);

        let (status, _) = call(&app, "POST", "/api/v1/save", Some(json!({"token": uuid::Uuid::new_v4()}))).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let (status, grant) = call(&app, "POST", "/api/v1/edit-mode", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, saved) = call(&app, "POST", "/api/v1/save", Some(json!({"token": grant["token"]}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["records"], 2);

        let written = std::fs::read_to_string(dir.path().join("results.jsonl")).unwrap();
        assert!(written.contains("\"knowledge_necessity\":false"));
    }

    #[tokio::test]
    async fn health_reports_load_state() {
        let state = Arc::new(AppState::new(ReviewConfig::default(), SelectedFiles::default()));
        let (status, body) = call(&build_router(state), "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "loaded": false}));
    }
}
