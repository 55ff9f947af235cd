//! # Batch Scrape
//!
//! 基于无头浏览器的批量抓取引擎：对输入列表逐条导航、提取字段并写入 CSV
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 浏览器会话的启动 / 连接与释放
//! - `infrastructure/` - `PageDriver`：导航、等待、交互，所有操作都有超时
//!
//! ### ② 业务能力层（Services）
//! - `FieldExtractor` - 按字段规格从当前页面取值
//! - `CsvSink` - 每次运行一个 CSV，逐行落盘
//! - `Pacer` - 条目间隔与人工停顿
//!
//! ### ③ 流程层（Workflow）
//! - `NavigationFlow` - 单条输入的处理流程
//! - `AppendFlow` / `SearchFlow` - 两种导航模式
//!
//! ### ④ 编排层（Orchestration）
//! - `RunManager` - 提交、查询、下载、取消
//! - `run_processor` - 单次运行的生命周期
//! - `RunRegistry` - 运行状态登记表
//!
//! ### ⑤ 边界（API）
//! - `api/` - HTTP 路由，把 `AppError` 映射为状态码

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{BrowserLauncher, BrowserSession, ChromeLauncher, LaunchOptions};
pub use config::Config;
pub use error::{AppError, AppResult, ConfigError, DriverError, ItemError, RunError};
pub use infrastructure::PageDriver;
pub use models::{FieldKind, FieldSpec, NavConfig, Run, RunRequest, RunStats, RunStatus};
pub use orchestrator::{RunManager, RunRegistry, RunTicket};
pub use workflow::{AppendFlow, ItemCtx, NavigationFlow, SearchFlow};
