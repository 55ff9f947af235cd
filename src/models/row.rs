use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// 字段列之后固定追加的列，字段名不能与之重名
pub const TRAILING_COLUMNS: [&str; 3] = ["source_url", "timestamp", "error"];

/// 提取结果行，每条输入一行，只在写入 CSV 前短暂存在
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRow {
    pub values: HashMap<String, Option<String>>,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl ExtractionRow {
    pub fn success(values: HashMap<String, Option<String>>, source_url: impl Into<String>) -> Self {
        Self {
            values,
            source_url: source_url.into(),
            captured_at: Utc::now(),
            error: None,
        }
    }

    /// 失败行：所有字段为空，附带错误标注
    pub fn failed(source_url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            values: HashMap::new(),
            source_url: source_url.into(),
            captured_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }
}
