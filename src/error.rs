use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// 应用程序错误类型（边界层使用）
#[derive(Debug, Error)]
pub enum AppError {
    /// 提交的运行配置不合法
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 请求体无法解析为运行请求
    #[error("请求体无效: {0}")]
    InvalidPayload(String),
    /// 运行不存在
    #[error("run not found: {0}")]
    NotFound(Uuid),
    /// 运行尚未完成（或产物不存在）
    #[error("run not finished: {0}")]
    NotReady(Uuid),
    /// 运行已结束，无法取消
    #[error("run already finished: {0}")]
    AlreadyFinished(Uuid),
    /// 其他错误（用于包装第三方库错误）
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 运行配置校验错误
///
/// 在获取任何浏览器资源之前返回，不会产生 Run 记录
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("input_list 不能为空")]
    EmptyInputList,
    #[error("selectors 不能为空")]
    EmptySelectors,
    #[error("字段名不能为空")]
    EmptyFieldName,
    #[error("字段名重复: {0}")]
    DuplicateField(String),
    #[error("字段名 {0} 与固定列重名")]
    ReservedFieldName(String),
    #[error("字段 {0} 的 selector 不能为空")]
    EmptySelector(String),
    #[error("字段 {0} 的类型为 attr，但缺少 attr 属性名")]
    MissingAttributeName(String),
    #[error("mode='append' 需要 base_url")]
    MissingBaseUrl,
    #[error("mode='search' 需要 start_url")]
    MissingStartUrl,
    #[error("mode='search' 需要 input_selector")]
    MissingInputSelector,
    #[error("delay_ms_min ({min}) 不能大于 delay_ms_max ({max})")]
    InvalidDelayBounds { min: u64, max: u64 },
    #[error("timeout_ms 必须大于 0")]
    ZeroTimeout,
}

/// 页面驱动错误
///
/// 所有导航 / 等待 / 交互操作的失败都归为此类，超时也是普通失败
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("{action} 超时 ({timeout_ms}ms)")]
    Timeout { action: String, timeout_ms: u64 },
    #[error("未找到元素: {selector}")]
    ElementNotFound { selector: String },
    #[error("没有可返回的历史记录")]
    NoHistory,
    #[error("导航到 {url} 失败: {message}")]
    Navigation { url: String, message: String },
    #[error("执行脚本失败: {0}")]
    Script(String),
    #[error("浏览器协议错误: {0}")]
    Cdp(String),
}

impl DriverError {
    /// 创建超时错误
    pub fn timeout(action: impl Into<String>, timeout: Duration) -> Self {
        DriverError::Timeout {
            action: action.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// 错误类别（写入 CSV error 列的前缀）
    pub fn kind(&self) -> &'static str {
        match self {
            DriverError::Timeout { .. } => "Timeout",
            DriverError::ElementNotFound { .. } => "ElementNotFound",
            DriverError::NoHistory => "NoHistory",
            DriverError::Navigation { .. } => "NavigationError",
            DriverError::Script(_) => "ScriptError",
            DriverError::Cdp(_) => "CdpError",
        }
    }
}

impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DriverError::Cdp(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Script(err.to_string())
    }
}

/// 单条输入在状态机中失败时所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    OpenTab,
    Navigate,
    WaitLoaded,
    Start,
    SearchReady,
    Submit,
    ResultsList,
    DetailReady,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStage::OpenTab => "open_tab",
            ItemStage::Navigate => "navigate",
            ItemStage::WaitLoaded => "wait_loaded",
            ItemStage::Start => "start",
            ItemStage::SearchReady => "search_ready",
            ItemStage::Submit => "submitted",
            ItemStage::ResultsList => "results_list",
            ItemStage::DetailReady => "detail_ready",
        };
        f.write_str(name)
    }
}

/// 单条输入处理失败
///
/// 由导航策略返回，编排层据此写入带错误标注的空行并计入 err
#[derive(Debug, Clone, Error)]
#[error("[{stage}] {source}")]
pub struct ItemError {
    pub stage: ItemStage,
    /// 失败时最后已知的页面 URL
    pub source_url: String,
    #[source]
    pub source: DriverError,
}

impl ItemError {
    pub fn new(stage: ItemStage, source_url: impl Into<String>, source: DriverError) -> Self {
        Self {
            stage,
            source_url: source_url.into(),
            source,
        }
    }

    /// CSV error 列的内容，形如 `Timeout: 等待 #detail 可见 超时 (30000ms) [detail_ready]`
    pub fn annotation(&self) -> String {
        format!("{}: {} [{}]", self.source.kind(), self.source, self.stage)
    }
}

/// 运行级致命错误
///
/// 只有阻止后续任何进展的失败才会升级到这里，Run 随之进入 error 状态
#[derive(Debug, Error)]
pub enum RunError {
    #[error("启动浏览器失败: {0}")]
    BrowserLaunch(String),
    #[error("打开页面失败: {0}")]
    PageOpen(#[source] DriverError),
    #[error("写入 CSV 失败 ({}): {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("运行结束后未找到 CSV 文件: {}", .0.display())]
    ArtifactMissing(PathBuf),
    #[error("运行已取消 (已处理 {processed}/{total})")]
    Cancelled { processed: usize, total: usize },
}

impl RunError {
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::BrowserLaunch(_) => "BrowserLaunchError",
            RunError::PageOpen(_) => "PageOpenError",
            RunError::Sink { .. } => "SinkError",
            RunError::ArtifactMissing(_) => "ArtifactMissing",
            RunError::Cancelled { .. } => "Cancelled",
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 页面驱动结果类型
pub type DriverResult<T> = Result<T, DriverError>;
