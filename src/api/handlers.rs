use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::request::RunRequest;
use crate::orchestrator::RunManager;

/// 存活检查
pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// 提交运行，立即返回 run_id
pub async fn submit_run(
    State(manager): State<Arc<RunManager>>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidPayload(rejection.body_text()))?;
    let ticket = manager.submit(request)?;
    Ok((StatusCode::ACCEPTED, Json(ticket)).into_response())
}

/// 运行记录快照
pub async fn run_status(
    State(manager): State<Arc<RunManager>>,
    Path(run_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let run = manager.status(&run_id).ok_or(AppError::NotFound(run_id))?;
    Ok(Json(run).into_response())
}

/// 下载已完成运行的 CSV
pub async fn download_run(
    State(manager): State<Arc<RunManager>>,
    Path(run_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let path = manager.download(&run_id)?;
    let body = tokio::fs::read(&path)
        .await
        .with_context(|| format!("读取 CSV 失败: {}", path.display()))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.csv\"", run_id),
        ),
    ];
    Ok((headers, body).into_response())
}

/// 请求取消运行
pub async fn cancel_run(
    State(manager): State<Arc<RunManager>>,
    Path(run_id): Path<Uuid>,
) -> Result<Response, AppError> {
    manager.cancel(&run_id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "run_id": run_id, "cancel_requested": true })),
    )
        .into_response())
}
