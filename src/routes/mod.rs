//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...` for challenge creation, build events and export
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route(
            "/api/v1/challenges",
            get(http::http_list_challenges).post(http::http_post_challenge),
        )
        .route("/api/v1/challenges/:id", get(http::http_get_challenge))
        .route("/api/v1/builds", post(http::http_post_build))
        .route("/api/v1/export.xml", get(http::http_export_xml))
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
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServiceConfig;
    use crate::coverage::JacocoReports;

    const CSV_HEADER: &str = "GROUP,PACKAGE,CLASS,INSTRUCTION_MISSED,INSTRUCTION_COVERED,BRANCH_MISSED,BRANCH_COVERED,LINE_MISSED,LINE_COVERED,COMPLEXITY_MISSED,COMPLEXITY_COVERED,METHOD_MISSED,METHOD_COVERED";

    fn write_report(root: &Path, second_line_class: &str, line_missed: u32, line_covered: u32) {
        let pkg = root.join("com.example");
        std::fs::create_dir_all(&pkg).unwrap();
        let page = format!(
            "<pre class=\"source lang-java linenums\"><span class=\"fc\" id=\"L3\">int add(int a, int b) {{</span>\n\
             <span class=\"{second_line_class}\" id=\"L4\">  return a + b;</span>\n\
             <span class=\"fc\" id=\"L5\">}}</span></pre>"
        );
        std::fs::write(pkg.join("Calc.java.html"), page).unwrap();
        std::fs::write(
            root.join("jacoco.csv"),
            format!("{CSV_HEADER}\ndemo,com.example,Calc,0,0,0,0,{line_missed},{line_covered},0,0,0,0\n"),
        )
        .unwrap();
    }

    fn app(root: &Path) -> Router {
        let mut config = ServiceConfig::default();
        config.coverage.results_path = root.to_path_buf();
        config.coverage.csv_path = root.join("jacoco.csv");
        config.generation.seed = Some(3);
        build_router(Arc::new(AppState::with_parts(config, Arc::new(JacocoReports))))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(&app(dir.path()), "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn line_challenge_is_solved_by_a_covering_build() {
        let dir = tempfile::tempdir().unwrap();
        write_report(dir.path(), "nc", 1, 2);
        let app = app(dir.path());

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/challenges",
            Some(json!({"kind": "line_coverage", "package": "com.example", "class": "Calc"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let created: Value = serde_json::from_str(&body).unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["type"], "LineCoverageChallenge");
        assert_eq!(created["status"], "open");
        assert_eq!(created["score"], 2);
        assert_eq!(
            created["description"],
            "Write a test to cover line 4 in class Calc in package com.example (created for branch main)"
        );

        let (_, body) = send(&app, "POST", "/api/v1/builds", Some(json!({"branch": "main", "result": "success"}))).await;
        let report: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(report["solved"].as_array().unwrap().len(), 0);
        assert_eq!(report["open"], 1);

        write_report(dir.path(), "fc", 0, 3);
        let (_, body) = send(&app, "POST", "/api/v1/builds", Some(json!({"branch": "main", "result": "failure"}))).await;
        let report: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(report["solved"][0]["id"], id.as_str());
        assert_eq!(report["solved"][0]["detail"]["base"]["solved_coverage"], 100.0);
        assert_eq!(report["score"], 2);

        let (status, body) = send(&app, "GET", &format!("/api/v1/challenges/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let fetched: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(fetched["status"], "completed");
        assert_ne!(fetched["solved"], 0);
    }

    #[tokio::test]
    async fn missing_report_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            &app(dir.path()),
            "POST",
            "/api/v1/challenges",
            Some(json!({"kind": "line_coverage", "package": "com.example", "class": "Ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("failed to read"));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(&app(dir.path()), "GET", "/api/v1/challenges/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn export_lists_every_challenge() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        send(&app, "POST", "/api/v1/challenges", Some(json!({"kind": "build"}))).await;
        send(
            &app,
            "POST",
            "/api/v1/challenges",
            Some(json!({"kind": "test", "user": "alice", "commit": "abc", "testCount": 2})),
        )
        .await;

        let (status, list) = send(&app, "GET", "/api/v1/challenges", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&list).unwrap().as_array().unwrap().len(), 2);

        let (status, xml) = send(&app, "GET", "/api/v1/export.xml", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(xml.contains("<BuildChallenge created=\""));
        assert!(xml.contains(" tests=\"2\" testsAtSolved=\"0\"/>"));
    }
}
