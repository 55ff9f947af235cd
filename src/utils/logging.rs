/// 日志工具模块
///
/// 提供日志初始化与格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::run::{short_id, RunStats};
use uuid::Uuid;

/// 初始化 tracing 日志，默认 `info` 级别，可通过 `RUST_LOG` 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // 测试中可能被重复调用，忽略重复初始化的错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(mode: &str, export_dir: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("📁 CSV 输出目录: {}", export_dir);
    info!("{}", "=".repeat(60));
}

/// 记录运行开始
pub fn log_run_start(run_id: &Uuid, mode: &str, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 [run {}] 开始运行 (mode={})", short_id(run_id), mode);
    info!("📄 [run {}] 输入总数: {}", short_id(run_id), total);
    info!("{}", "=".repeat(60));
}

/// 记录运行完成
pub fn log_run_complete(run_id: &Uuid, stats: &RunStats, output: &str) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ [run {}] 运行完成: 成功 {}/{}，失败 {}",
        short_id(run_id),
        stats.ok,
        stats.total,
        stats.err
    );
    info!("📄 [run {}] CSV: {}", short_id(run_id), output);
    info!("{}", "─".repeat(60));
}

/// 打印任务文件模式的最终统计
pub fn print_final_stats(done: usize, failed: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部任务处理完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 完成: {}/{}", done, total);
    info!("❌ 出错: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
