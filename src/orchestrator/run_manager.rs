//! 运行管理器 - 编排层入口
//!
//! 接收运行请求、登记、在后台任务中执行，并提供状态查询 / 下载 / 取消

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::browser::{BrowserLauncher, ChromeLauncher};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::request::RunRequest;
use crate::models::run::{short_id, Run, RunStatus};
use crate::orchestrator::registry::{CancelOutcome, RunRegistry};
use crate::orchestrator::run_processor::{execute_run, RunJob};

/// 提交后立即返回的凭据
#[derive(Debug, Clone, Serialize)]
pub struct RunTicket {
    pub run_id: Uuid,
    pub status: RunStatus,
}

/// 运行管理器
///
/// 每次运行独占一个浏览器会话，多个运行之间互不共享状态
pub struct RunManager {
    config: Config,
    registry: Arc<RunRegistry>,
    launcher: Arc<dyn BrowserLauncher>,
}

impl RunManager {
    pub fn new(config: Config, registry: Arc<RunRegistry>, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            config,
            registry,
            launcher,
        }
    }

    /// 使用真实 Chrome 的管理器
    pub fn with_chrome(config: Config) -> Self {
        let launcher = Arc::new(ChromeLauncher::new(&config));
        Self::new(config, Arc::new(RunRegistry::new()), launcher)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// 校验并提交运行，立即返回
    ///
    /// 校验失败时不会创建 Run 记录
    pub fn submit(&self, request: RunRequest) -> AppResult<RunTicket> {
        self.spawn(request).map(|(ticket, _)| ticket)
    }

    /// 提交并等待运行结束，返回终态记录
    pub async fn run_to_completion(&self, request: RunRequest) -> AppResult<Run> {
        let (ticket, handle) = self.spawn(request)?;
        handle
            .await
            .map_err(|e| anyhow!("运行任务异常退出: {}", e))?;
        self.status(&ticket.run_id)
            .ok_or(AppError::NotFound(ticket.run_id))
    }

    pub fn status(&self, run_id: &Uuid) -> Option<Run> {
        self.registry.get(run_id)
    }

    /// 已完成运行的 CSV 路径
    pub fn download(&self, run_id: &Uuid) -> AppResult<PathBuf> {
        let run = self.status(run_id).ok_or(AppError::NotFound(*run_id))?;
        if run.status != RunStatus::Done {
            return Err(AppError::NotReady(*run_id));
        }
        run.output_path
            .filter(|path| path.is_file())
            .ok_or(AppError::NotReady(*run_id))
    }

    /// 请求取消，运行会在下一条输入开始前停止
    pub fn cancel(&self, run_id: &Uuid) -> AppResult<()> {
        match self.registry.cancel(run_id) {
            CancelOutcome::Requested => {
                info!("🛑 [run {}] 已请求取消", short_id(run_id));
                Ok(())
            }
            CancelOutcome::AlreadyFinished => Err(AppError::AlreadyFinished(*run_id)),
            CancelOutcome::NotFound => Err(AppError::NotFound(*run_id)),
        }
    }

    fn spawn(&self, request: RunRequest) -> AppResult<(RunTicket, JoinHandle<()>)> {
        request.validate()?;

        let (run_id, cancel) = self.registry.create(request.clone());
        let job = RunJob {
            run_id,
            request,
            export_dir: PathBuf::from(&self.config.export_dir),
            field_wait: self.config.field_wait(),
            search_probe: self.config.search_probe(),
            verbose: self.config.verbose_logging,
            cancel,
        };

        let launcher = self.launcher.clone();
        let registry = self.registry.clone();
        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(execute_run(job, launcher, registry.clone()))
                .catch_unwind()
                .await;
            if let Err(panic) = outcome {
                let message = panic_message(panic.as_ref());
                error!("❌ [run {}] 运行任务 panic: {}", short_id(&run_id), message);
                registry.finish_error(&run_id, format!("Panic: {}", message));
            }
        });

        info!("📥 [run {}] 已提交", short_id(&run_id));
        let status = self
            .registry
            .get(&run_id)
            .map(|run| run.status)
            .unwrap_or(RunStatus::Queued);
        Ok((RunTicket { run_id, status }, handle))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
