//! 单次运行处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **生命周期**：queued → running → done | error
//! 2. **资源管理**：获取浏览器会话，结束时无论成败都释放
//! 3. **流程调度**：按导航模式创建策略，逐条处理输入
//! 4. **写行与计数**：每条输入恰好写一行并计入 ok / err
//! 5. **节奏控制**：条目之间随机等待

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::browser::{BrowserLauncher, BrowserSession, LaunchOptions};
use crate::error::RunError;
use crate::models::request::{NavConfig, RunRequest};
use crate::models::row::ExtractionRow;
use crate::models::run::short_id;
use crate::orchestrator::registry::{CancelFlag, RunRegistry};
use crate::services::{CsvSink, FieldExtractor, Pacer};
use crate::utils::diagnostics::error_report;
use crate::utils::logging::{log_run_complete, log_run_start, truncate_text};
use crate::workflow::{AppendFlow, ItemCtx, NavigationFlow, SearchFlow};

/// 一次运行所需的全部输入
pub struct RunJob {
    pub run_id: Uuid,
    pub request: RunRequest,
    pub export_dir: PathBuf,
    pub field_wait: Duration,
    pub search_probe: Duration,
    pub verbose: bool,
    pub cancel: CancelFlag,
}

/// 执行一次运行，结果写回登记表
///
/// 返回时记录一定处于终态
pub async fn execute_run(
    job: RunJob,
    launcher: Arc<dyn BrowserLauncher>,
    registry: Arc<RunRegistry>,
) {
    let run_id = job.run_id;
    if !registry.mark_running(&run_id) {
        warn!("⚠️ [run {}] 状态不是 queued，跳过执行", short_id(&run_id));
        return;
    }

    log_run_start(
        &run_id,
        job.request.navigation.mode(),
        job.request.input_list.len(),
    );

    match drive_run(&job, launcher.as_ref(), &registry).await {
        Ok(path) => {
            registry.finish_done(&run_id, path.clone());
            if let Some(run) = registry.get(&run_id) {
                log_run_complete(&run_id, &run.stats, &path.display().to_string());
            }
        }
        Err(run_err) => {
            let err = anyhow::Error::new(run_err);
            error!("❌ [run {}] 运行失败: {:#}", short_id(&run_id), err);
            registry.finish_error(&run_id, error_report(&err));
        }
    }
}

/// 准备 CSV、获取会话、处理所有输入，并确认产物存在
async fn drive_run(
    job: &RunJob,
    launcher: &dyn BrowserLauncher,
    registry: &RunRegistry,
) -> Result<PathBuf, RunError> {
    let field_names = job.request.field_names();

    let sink = CsvSink::open_for(&job.export_dir, &job.run_id).map_err(|source| RunError::Sink {
        path: job.export_dir.clone(),
        source,
    })?;
    sink.write_header_once(&field_names)
        .map_err(|source| RunError::Sink {
            path: sink.path().to_path_buf(),
            source,
        })?;
    debug!("[run {}] CSV: {}", short_id(&job.run_id), sink.path().display());

    let options = LaunchOptions {
        headless: job.request.options.headless,
        request_timeout: job.request.options.step_timeout(),
    };
    let mut session = launcher.launch(&options).await?;
    info!("[run {}] ✓ 浏览器会话已就绪", short_id(&job.run_id));

    let outcome = process_items(job, session.as_ref(), &sink, &field_names, registry).await;

    session.close().await;
    debug!("[run {}] 浏览器会话已释放", short_id(&job.run_id));
    outcome?;

    if !sink.exists() {
        return Err(RunError::ArtifactMissing(sink.path().to_path_buf()));
    }
    Ok(sink.path().to_path_buf())
}

/// 按导航模式创建策略并逐条处理
async fn process_items(
    job: &RunJob,
    session: &dyn BrowserSession,
    sink: &CsvSink,
    field_names: &[String],
    registry: &RunRegistry,
) -> Result<(), RunError> {
    let options = &job.request.options;
    let step_timeout = options.step_timeout();
    let pacer = Pacer::new(options.delay_ms_min, options.delay_ms_max);
    let extractor = FieldExtractor::new(job.field_wait, step_timeout);
    let specs = job.request.selectors.clone();

    let mut flow: Box<dyn NavigationFlow> = match &job.request.navigation {
        NavConfig::Append(config) => Box::new(AppendFlow::new(
            config.clone(),
            specs,
            extractor,
            step_timeout,
        )),
        NavConfig::Search(config) => Box::new(
            SearchFlow::open(
                session,
                config.clone(),
                specs,
                extractor,
                pacer.clone(),
                step_timeout,
                job.search_probe,
            )
            .await?,
        ),
    };

    let result = run_items(job, flow.as_mut(), session, sink, field_names, registry, &pacer).await;
    flow.finish().await;
    result
}

async fn run_items(
    job: &RunJob,
    flow: &mut dyn NavigationFlow,
    session: &dyn BrowserSession,
    sink: &CsvSink,
    field_names: &[String],
    registry: &RunRegistry,
    pacer: &Pacer,
) -> Result<(), RunError> {
    let total = job.request.input_list.len();

    for (index, value) in job.request.input_list.iter().enumerate() {
        if job.cancel.is_cancelled() {
            return Err(RunError::Cancelled {
                processed: index,
                total,
            });
        }

        let ctx = ItemCtx::new(job.run_id, index + 1, total, value.clone());

        let (row, success) = match flow.run_item(session, &ctx).await {
            Ok(row) => {
                info!("{} ✓ 提取完成", ctx);
                if job.verbose {
                    for name in field_names {
                        debug!(
                            "{}   {} = {}",
                            ctx,
                            name,
                            truncate_text(row.value(name).unwrap_or("<空>"), 80)
                        );
                    }
                }
                (row, true)
            }
            Err(e) => {
                warn!("{} ⚠️ 处理失败: {}", ctx, e);
                (ExtractionRow::failed(e.source_url.clone(), e.annotation()), false)
            }
        };

        sink.append_row(field_names, &row)
            .map_err(|source| RunError::Sink {
                path: sink.path().to_path_buf(),
                source,
            })?;
        registry.record_item(&job.run_id, success);

        pacer.pace().await;
    }

    Ok(())
}
