//! 浏览器会话
//!
//! 编排层通过 `BrowserLauncher` 获取会话，会话只负责开新标签页和最终释放。
//! 一个会话在整个运行期间只属于一个运行。

pub mod connection;
pub mod headless;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, Handler};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{DriverResult, RunError};
use crate::infrastructure::{ChromePage, PageDriver};

pub use connection::connect_to_browser;
pub use headless::launch_browser;

/// 启动参数
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub request_timeout: Duration,
}

/// 一次运行独占的浏览器会话
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 在同一浏览器上下文中打开新标签页（cookie 在标签页之间共享）
    async fn new_page(&self) -> DriverResult<Box<dyn PageDriver>>;

    /// 释放会话
    async fn close(&mut self);
}

/// 浏览器会话的来源
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, RunError>;
}

/// chromiumoxide 会话
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    /// 自行启动的浏览器在关闭会话时退出，连接得到的只断开
    owned: bool,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn new_page(&self) -> DriverResult<Box<dyn PageDriver>> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(Box::new(ChromePage::new(page)))
    }

    async fn close(&mut self) {
        if self.owned {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                debug!("等待浏览器进程退出失败: {}", e);
            }
        }
        self.handler.abort();
    }
}

/// 在后台驱动 CDP 事件流，出错即退出
pub(crate) fn spawn_event_loop(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("浏览器事件循环结束: {}", e);
                break;
            }
        }
    })
}

/// 按配置启动或连接 Chrome
pub struct ChromeLauncher {
    chrome_executable: Option<PathBuf>,
    debug_port: Option<u16>,
}

impl ChromeLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone().map(PathBuf::from),
            debug_port: config.browser_debug_port,
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, RunError> {
        let (browser, handler, owned) = match self.debug_port {
            Some(port) => {
                let (browser, handler) = connect_to_browser(port)
                    .await
                    .map_err(|e| RunError::BrowserLaunch(format!("{:#}", e)))?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) =
                    launch_browser(options, self.chrome_executable.as_deref())
                        .await
                        .map_err(|e| RunError::BrowserLaunch(format!("{:#}", e)))?;
                (browser, handler, true)
            }
        };

        Ok(Box::new(ChromeSession {
            browser,
            handler,
            owned,
        }))
    }
}
