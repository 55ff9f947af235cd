mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{FromRequest, Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use batch_scrape::api::{self, handlers};
use batch_scrape::error::AppError;
use batch_scrape::models::{AppendConfig, FieldSpec, NavConfig, RunOptions, RunRequest};
use batch_scrape::orchestrator::RunManager;
use common::{manager, wait_terminal, FakeDoc, FakeElement, FakeLauncher, Site};
use uuid::Uuid;

fn site() -> Site {
    Arc::new(|url: &str| {
        url.strip_prefix("https://a.test/")
            .map(|id| FakeDoc::new().with("h1", FakeElement::text(&format!("Item {}", id))))
    })
}

fn request(inputs: &[&str]) -> RunRequest {
    RunRequest {
        navigation: NavConfig::Append(AppendConfig {
            base_url: "https://a.test/".into(),
        }),
        input_list: inputs.iter().map(|s| s.to_string()).collect(),
        selectors: vec![FieldSpec::text("title", "h1")],
        options: RunOptions {
            delay_ms_min: 0,
            delay_ms_max: 0,
            ..RunOptions::default()
        },
    }
}

fn status_of(result: Result<Response, AppError>) -> StatusCode {
    match result {
        Ok(response) => response.status(),
        Err(e) => e.into_response().status(),
    }
}

fn shared_manager(dir: &std::path::Path, launcher: FakeLauncher) -> Arc<RunManager> {
    Arc::new(manager(dir, launcher))
}

#[tokio::test]
async fn healthz_is_ok() {
    let response = handlers::healthz().await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn router_builds_with_all_routes() {
    let dir = tempfile::tempdir().unwrap();
    let _router = api::router(shared_manager(dir.path(), FakeLauncher::new(site())));
}

#[tokio::test]
async fn invalid_payload_is_unprocessable() {
    let dir = tempfile::tempdir().unwrap();
    let manager = shared_manager(dir.path(), FakeLauncher::new(site()));

    let result = handlers::submit_run(State(manager.clone()), Ok(Json(request(&[])))).await;
    assert_eq!(status_of(result), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(manager.registry().is_empty());
}

#[tokio::test]
async fn malformed_body_is_unprocessable_json() {
    let dir = tempfile::tempdir().unwrap();
    let manager = shared_manager(dir.path(), FakeLauncher::new(site()));

    let body = Request::builder()
        .method("POST")
        .uri("/run")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"mode\": \"append\", \"input_list\": "))
        .unwrap();
    let rejection = Json::<RunRequest>::from_request(body, &()).await.unwrap_err();

    let response = handlers::submit_run(State(manager.clone()), Err(rejection))
        .await
        .unwrap_err()
        .into_response();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(error["error"].as_str().unwrap().starts_with("请求体无效"));
    assert!(manager.registry().is_empty());
}

#[tokio::test]
async fn unknown_run_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let manager = shared_manager(dir.path(), FakeLauncher::new(site()));
    let id = Uuid::new_v4();

    let status = handlers::run_status(State(manager.clone()), Path(id)).await;
    assert_eq!(status_of(status), StatusCode::NOT_FOUND);
    let download = handlers::download_run(State(manager.clone()), Path(id)).await;
    assert_eq!(status_of(download), StatusCode::NOT_FOUND);
    let cancel = handlers::cancel_run(State(manager), Path(id)).await;
    assert_eq!(status_of(cancel), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn finished_run_downloads_as_csv() {
    let dir = tempfile::tempdir().unwrap();
    let manager = shared_manager(dir.path(), FakeLauncher::new(site()));

    let submitted = handlers::submit_run(State(manager.clone()), Ok(Json(request(&["1", "2"]))))
        .await
        .unwrap();
    assert_eq!(submitted.status(), StatusCode::ACCEPTED);

    let body = to_bytes(submitted.into_body(), usize::MAX).await.unwrap();
    let ticket: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ticket["status"], "queued");
    let run_id = Uuid::parse_str(ticket["run_id"].as_str().unwrap()).unwrap();
    let run = wait_terminal(&manager, &run_id).await;
    assert_eq!(run.stats.ok, 2);

    let response = handlers::download_run(State(manager.clone()), Path(run_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains(&format!("{}.csv", run_id)));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("title,source_url,timestamp,error\r\n"));
    assert!(text.contains("Item 2,https://a.test/2,"));

    let cancel = handlers::cancel_run(State(manager), Path(run_id)).await;
    assert_eq!(status_of(cancel), StatusCode::CONFLICT);
}

#[tokio::test]
async fn failed_run_cannot_be_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let mut launcher = FakeLauncher::new(site());
    launcher.fail = true;
    let manager = shared_manager(dir.path(), launcher);

    let ticket = manager.submit(request(&["1"])).unwrap();
    let run = wait_terminal(&manager, &ticket.run_id).await;
    assert!(run.error.is_some());

    let status = handlers::run_status(State(manager.clone()), Path(ticket.run_id)).await;
    assert_eq!(status_of(status), StatusCode::OK);
    let download = handlers::download_run(State(manager), Path(ticket.run_id)).await;
    assert_eq!(status_of(download), StatusCode::CONFLICT);
}
