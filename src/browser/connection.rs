use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::browser::spawn_event_loop;

/// 连接后等待浏览器状态同步的时间
const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// 连接到本机调试端口上已运行的浏览器
///
/// 连接得到的浏览器不归运行所有，运行结束时只断开，不关闭
pub async fn connect_to_browser(port: u16) -> Result<(Browser, JoinHandle<()>)> {
    let devtools_url = format!("http://localhost:{}", port);
    info!("🔌 连接浏览器: {}", devtools_url);

    let (browser, handler) = Browser::connect(&devtools_url)
        .await
        .with_context(|| format!("连接浏览器失败: {}", devtools_url))?;
    let handle = spawn_event_loop(handler);

    sleep(SETTLE_DELAY).await;
    debug!("浏览器连接成功 (port={})", port);

    Ok((browser, handle))
}
