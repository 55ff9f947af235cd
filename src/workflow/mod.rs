//! 流程层：定义"一条输入"的完整处理流程

pub mod append_flow;
pub mod item_ctx;
pub mod search_flow;

use async_trait::async_trait;

use crate::browser::BrowserSession;
use crate::error::ItemError;
use crate::models::row::ExtractionRow;

pub use append_flow::AppendFlow;
pub use item_ctx::ItemCtx;
pub use search_flow::SearchFlow;

/// 单条输入的处理结果
pub type ItemResult = Result<ExtractionRow, ItemError>;

/// 导航策略
///
/// 每次调用处理一条输入，失败在条目内吸收并以 `ItemError` 返回，
/// 编排层负责写行、计数和节奏控制
#[async_trait]
pub trait NavigationFlow: Send {
    async fn run_item(&mut self, session: &dyn BrowserSession, ctx: &ItemCtx) -> ItemResult;

    /// 释放流程自己持有的页面
    async fn finish(&mut self);
}
