//! 运行请求模型
//!
//! 两种导航模式用带标签的枚举表示，由 `mode` 字段区分

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::field_spec::{validate_field_specs, FieldSpec};

/// Append 模式：`base_url + 输入值` 直接拼接后抓取
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendConfig {
    pub base_url: String,
}

/// Search 模式：在搜索框输入值 → （结果列表）→ 详情页 → 返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub start_url: String,
    pub input_selector: String,
    /// 未设置时在输入框中按回车提交
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_selector: Option<String>,
    /// 中间结果列表，设置后点击第一条结果
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_selector: Option<String>,
    /// 未设置时只等待页面内容加载完成
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_ready_selector: Option<String>,
    /// 未设置时使用浏览器历史后退
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_to_search_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer_selector: Option<String>,
    #[serde(default)]
    pub disclaimer_dismiss_per_item: bool,
}

impl SearchConfig {
    pub fn new(start_url: impl Into<String>, input_selector: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            input_selector: input_selector.into(),
            submit_selector: None,
            results_selector: None,
            detail_ready_selector: None,
            back_to_search_selector: None,
            disclaimer_selector: None,
            disclaimer_dismiss_per_item: false,
        }
    }
}

/// 导航配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum NavConfig {
    Append(AppendConfig),
    Search(SearchConfig),
}

impl NavConfig {
    pub fn mode(&self) -> &'static str {
        match self {
            NavConfig::Append(_) => "append",
            NavConfig::Search(_) => "search",
        }
    }
}

/// 两种模式共享的运行参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_delay_ms_min")]
    pub delay_ms_min: u64,
    #[serde(default = "default_delay_ms_max")]
    pub delay_ms_max: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_headless() -> bool {
    true
}

fn default_delay_ms_min() -> u64 {
    300
}

fn default_delay_ms_max() -> u64 {
    900
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            delay_ms_min: default_delay_ms_min(),
            delay_ms_max: default_delay_ms_max(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RunOptions {
    /// 单步超时
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// 一次批量运行的完整请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(flatten)]
    pub navigation: NavConfig,
    pub input_list: Vec<String>,
    pub selectors: Vec<FieldSpec>,
    #[serde(flatten)]
    pub options: RunOptions,
}

impl RunRequest {
    /// 在获取任何浏览器资源之前校验请求
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_list.is_empty() {
            return Err(ConfigError::EmptyInputList);
        }
        validate_field_specs(&self.selectors)?;

        match &self.navigation {
            NavConfig::Append(cfg) => {
                if cfg.base_url.trim().is_empty() {
                    return Err(ConfigError::MissingBaseUrl);
                }
            }
            NavConfig::Search(cfg) => {
                if cfg.start_url.trim().is_empty() {
                    return Err(ConfigError::MissingStartUrl);
                }
                if cfg.input_selector.trim().is_empty() {
                    return Err(ConfigError::MissingInputSelector);
                }
            }
        }

        if self.options.delay_ms_min > self.options.delay_ms_max {
            return Err(ConfigError::InvalidDelayBounds {
                min: self.options.delay_ms_min,
                max: self.options.delay_ms_max,
            });
        }
        if self.options.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// 按规格顺序排列的字段名
    pub fn field_names(&self) -> Vec<String> {
        self.selectors.iter().map(|s| s.name.clone()).collect()
    }
}
