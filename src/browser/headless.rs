use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::browser::{spawn_event_loop, LaunchOptions};

/// 启动浏览器（无头或有头）
///
/// 返回浏览器句柄和后台事件处理任务
pub async fn launch_browser(
    options: &LaunchOptions,
    chrome_executable: Option<&Path>,
) -> Result<(Browser, JoinHandle<()>)> {
    info!(
        "🚀 启动{}浏览器...",
        if options.headless { "无头" } else { "有头" }
    );

    let mut builder = BrowserConfig::builder();
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = chrome_executable {
        debug!("使用浏览器可执行文件: {}", path.display());
        builder = builder.chrome_executable(path);
    }

    let config = builder
        .request_timeout(options.request_timeout)
        .args(vec![
            "--disable-gpu",           // 无头模式下禁用 GPU
            "--no-sandbox",            // 容器内运行时沙盒不可用
            "--disable-dev-shm-usage", // 防止共享内存不足
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            anyhow::anyhow!("配置浏览器失败: {}", e)
        })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    Ok((browser, spawn_event_loop(handler)))
}
