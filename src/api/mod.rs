//! HTTP 边界
//!
//! 只做请求解析和状态码映射，所有运行逻辑都委托给 `RunManager`

pub mod handlers;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::error::AppError;
use crate::orchestrator::RunManager;

/// 创建应用路由
pub fn router(manager: Arc<RunManager>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/run", post(handlers::submit_run))
        .route("/runs/{run_id}", get(handlers::run_status))
        .route("/runs/{run_id}/download", get(handlers::download_run))
        .route("/runs/{run_id}/cancel", post(handlers::cancel_run))
        .with_state(manager)
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::InvalidPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotReady(_) | AppError::AlreadyFinished(_) => StatusCode::CONFLICT,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
