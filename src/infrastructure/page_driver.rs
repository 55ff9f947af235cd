//! 页面驱动 - 基础设施层
//!
//! `PageDriver` 是导航策略与浏览器之间唯一的接缝：每个操作都带显式超时，
//! 超时与其他失败一样以 `DriverError` 返回，不会拆掉浏览器会话。
//! `ChromePage` 是基于 chromiumoxide 的实现，测试中可替换为内存假页面。

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    GetNavigationHistoryParams, NavigateToHistoryEntryParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::js_executor::JsExecutor;
use crate::models::field_spec::{FieldKind, FieldSpec};

/// 轮询等待的间隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const VISIBILITY_CHECK: &str = "if (!el.isConnected) return false; \
    const style = window.getComputedStyle(el); \
    if (style.visibility === 'hidden' || style.display === 'none') return false; \
    const rect = el.getBoundingClientRect(); \
    return rect.width > 0 && rect.height > 0;";

/// 文本字段读 `textContent`，不受 CSS 布局和变换影响
const TEXT_CONTENT: &str = "return el.textContent ?? '';";

/// 聚焦并清空输入框，触发 input 事件让页面感知
const CLEAR_INPUT: &str = "el.focus(); \
    if ('value' in el) { el.value = ''; el.dispatchEvent(new Event('input', { bubbles: true })); } \
    return true;";

/// 单个页面（标签页）的操作能力
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定 URL
    async fn goto(&self, url: &str, timeout: Duration) -> DriverResult<()>;

    /// 等待文档解析完成（`readyState != "loading"`）
    async fn wait_for_content_loaded(&self, timeout: Duration) -> DriverResult<()>;

    /// 等待第一个匹配元素可见
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

    /// 清空输入框并输入文本
    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> DriverResult<()>;

    /// 在元素中按下回车
    async fn press_enter(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

    /// 点击第一个匹配元素
    async fn click(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

    /// 浏览器历史后退一步
    async fn go_back(&self, timeout: Duration) -> DriverResult<()>;

    /// 当前页面 URL
    async fn current_url(&self) -> Option<String>;

    /// 按字段规格读取第一个匹配元素的值
    async fn read_field(&self, spec: &FieldSpec, timeout: Duration) -> DriverResult<Option<String>>;

    /// 关闭页面
    async fn close(&self) -> DriverResult<()>;
}

/// 给操作套上超时，超时转为 `DriverError::Timeout`
pub async fn with_timeout<T, F>(action: &str, timeout: Duration, fut: F) -> DriverResult<T>
where
    F: Future<Output = DriverResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::timeout(action, timeout)),
    }
}

/// 每隔 `POLL_INTERVAL` 探测一次，直到探测返回 true 或超时
///
/// 探测本身出错（例如页面跳转中执行上下文被销毁）视为"尚未满足"
pub async fn poll_until<F, Fut>(action: &str, timeout: Duration, mut probe: F) -> DriverResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DriverResult<bool>>,
{
    with_timeout(action, timeout, async {
        loop {
            match probe().await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => debug!("{} 探测失败: {}", action, e),
            }
            sleep(POLL_INTERVAL).await;
        }
    })
    .await
}

/// 基于 chromiumoxide 的页面驱动
pub struct ChromePage {
    executor: JsExecutor,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self {
            executor: JsExecutor::new(page),
        }
    }

    fn page(&self) -> &Page {
        self.executor.page()
    }

    /// 在超时内等待元素出现并返回句柄
    async fn find_element_within(&self, selector: &str, timeout: Duration) -> DriverResult<Element> {
        let action = format!("等待元素 {} 出现", selector);
        with_timeout(&action, timeout, async {
            loop {
                match self.page().find_element(selector).await {
                    Ok(element) => return Ok(element),
                    Err(e) => debug!("查找 {} 失败，继续等待: {}", selector, e),
                }
                sleep(POLL_INTERVAL).await;
            }
        })
        .await
    }

    async fn is_visible(&self, selector: &str) -> DriverResult<bool> {
        let visible = self
            .executor
            .with_element::<bool>(selector, VISIBILITY_CHECK)
            .await;
        match visible {
            Err(DriverError::ElementNotFound { .. }) => Ok(false),
            other => other,
        }
    }

    /// 原生点击失败时的 JS 兜底点击
    async fn js_click(&self, selector: &str) -> DriverResult<()> {
        self.executor
            .with_element::<bool>(selector, "el.click(); return true;")
            .await
            .map(|_| ())
    }

    async fn history_index(&self) -> DriverResult<i64> {
        let history = self
            .page()
            .execute(GetNavigationHistoryParams::default())
            .await?;
        Ok(history.result.current_index)
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> DriverResult<()> {
        let action = format!("导航到 {}", url);
        with_timeout(&action, timeout, async {
            self.page()
                .goto(url)
                .await
                .map_err(|e| DriverError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        })
        .await
    }

    async fn wait_for_content_loaded(&self, timeout: Duration) -> DriverResult<()> {
        poll_until("等待页面内容加载", timeout, || async {
            let state: String = self.executor.eval("document.readyState").await?;
            Ok(state != "loading")
        })
        .await
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let action = format!("等待 {} 可见", selector);
        poll_until(&action, timeout, || self.is_visible(selector)).await
    }

    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> DriverResult<()> {
        let element = self.find_element_within(selector, timeout).await?;
        let action = format!("输入 {}", selector);
        with_timeout(&action, timeout, async {
            self.executor
                .with_element::<bool>(selector, CLEAR_INPUT)
                .await?;
            element.type_str(value).await?;
            Ok(())
        })
        .await
    }

    async fn press_enter(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let element = self.find_element_within(selector, timeout).await?;
        with_timeout("按下回车", timeout, async {
            element.press_key("Enter").await?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let element = self.find_element_within(selector, timeout).await?;
        let action = format!("点击 {}", selector);
        with_timeout(&action, timeout, async {
            if let Err(e) = element.click().await {
                debug!("原生点击 {} 失败，改用 JS 点击: {}", selector, e);
                self.js_click(selector).await?;
            }
            Ok(())
        })
        .await
    }

    async fn go_back(&self, timeout: Duration) -> DriverResult<()> {
        with_timeout("历史后退", timeout, async {
            let history = self
                .page()
                .execute(GetNavigationHistoryParams::default())
                .await?;
            let current = history.result.current_index;
            if current <= 0 {
                return Err(DriverError::NoHistory);
            }
            let entry = history
                .result
                .entries
                .get((current - 1) as usize)
                .ok_or(DriverError::NoHistory)?;
            debug!("后退到: {}", entry.url);

            self.page()
                .execute(NavigateToHistoryEntryParams::new(entry.id))
                .await?;

            let target = current - 1;
            loop {
                if matches!(self.history_index().await, Ok(idx) if idx == target) {
                    break;
                }
                sleep(POLL_INTERVAL).await;
            }
            Ok(())
        })
        .await?;

        self.wait_for_content_loaded(timeout).await
    }

    async fn current_url(&self) -> Option<String> {
        self.page().url().await.ok().flatten()
    }

    async fn read_field(&self, spec: &FieldSpec, timeout: Duration) -> DriverResult<Option<String>> {
        let element = self.find_element_within(&spec.selector, timeout).await?;
        let action = format!("读取字段 {}", spec.name);
        with_timeout(&action, timeout, async {
            let value = match spec.kind {
                FieldKind::Text => {
                    let text: String = self
                        .executor
                        .with_element(&spec.selector, TEXT_CONTENT)
                        .await?;
                    Some(text.trim().to_string()).filter(|t| !t.is_empty())
                }
                FieldKind::Attribute => match spec.attribute_name.as_deref() {
                    Some(name) => element.attribute(name).await?,
                    None => None,
                },
                FieldKind::Html => element.inner_html().await?,
            };
            Ok(value)
        })
        .await
    }

    async fn close(&self) -> DriverResult<()> {
        self.page().clone().close().await?;
        Ok(())
    }
}
