//! 条目处理上下文
//!
//! 封装"我正在处理哪次运行的第几条输入"这一信息

use std::fmt::Display;

use uuid::Uuid;

use crate::models::run::short_id;

/// 条目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 运行ID
    pub run_id: Uuid,

    /// 条目在输入列表中的索引（从1开始）
    pub item_index: usize,

    /// 输入总数（仅用于日志显示）
    pub total: usize,

    /// 输入值
    pub value: String,
}

impl ItemCtx {
    /// 创建新的条目上下文
    pub fn new(run_id: Uuid, item_index: usize, total: usize, value: impl Into<String>) -> Self {
        Self {
            run_id,
            item_index,
            total,
            value: value.into(),
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[run {} item {}/{}]",
            short_id(&self.run_id),
            self.item_index,
            self.total
        )
    }
}
