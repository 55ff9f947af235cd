use std::sync::Arc;

use anyhow::{bail, Context, Result};
use batch_scrape::api;
use batch_scrape::models::load_job_files;
use batch_scrape::utils::logging;
use batch_scrape::{Config, RunManager, RunStatus};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();
    let manager = Arc::new(RunManager::with_chrome(config.clone()));

    if let Some(job_path) = config.job_file.as_deref() {
        logging::log_startup("任务文件模式", &config.export_dir);
        return run_job_files(&manager, job_path).await;
    }

    logging::log_startup("HTTP 服务模式", &config.export_dir);
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("无法监听 {}", config.bind_addr))?;
    info!("🌐 监听地址: http://{}", config.bind_addr);

    axum::serve(listener, api::router(manager)).await?;
    Ok(())
}

/// 依次执行任务文件中的运行，有失败时以非零状态退出
async fn run_job_files(manager: &RunManager, job_path: &str) -> Result<()> {
    let jobs = load_job_files(job_path).await?;
    if jobs.is_empty() {
        warn!("⚠️ 没有找到待处理的任务文件，程序结束");
        return Ok(());
    }

    let total = jobs.len();
    let mut done = 0;
    let mut failed = 0;

    for (path, request) in jobs {
        info!("\n📁 任务文件: {}", path.display());
        match manager.run_to_completion(request).await {
            Ok(run) if run.status == RunStatus::Done => {
                done += 1;
                if let Some(output) = run.output_path.as_deref() {
                    info!("📄 输出: {}", output.display());
                }
            }
            Ok(run) => {
                failed += 1;
                error!(
                    "❌ {} 运行失败: {}",
                    path.display(),
                    run.error.as_deref().and_then(|e| e.lines().next()).unwrap_or("未知错误")
                );
            }
            Err(e) => {
                failed += 1;
                error!("❌ {} 未能提交: {}", path.display(), e);
            }
        }
    }

    logging::print_final_stats(done, failed, total);

    if failed > 0 {
        bail!("{} 个任务运行失败", failed);
    }
    Ok(())
}
