//! 字段提取服务 - 业务能力层
//!
//! 只负责"按字段规格从当前页面取值"，不关心导航流程

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::infrastructure::PageDriver;
use crate::models::field_spec::FieldSpec;

/// 字段提取器
///
/// 每个字段独立提取：任何一个字段失败只会让该字段为空，不影响其余字段。
/// 提取发生在目标状态已就绪之后，所以单字段的等待比单步超时短。
pub struct FieldExtractor {
    field_wait: Duration,
}

impl FieldExtractor {
    /// `field_wait` 会被限制在 `step_timeout` 以内
    pub fn new(field_wait: Duration, step_timeout: Duration) -> Self {
        Self {
            field_wait: field_wait.min(step_timeout),
        }
    }

    pub fn field_wait(&self) -> Duration {
        self.field_wait
    }

    /// 提取所有字段，返回 字段名 → 值（失败为 None）
    pub async fn extract(
        &self,
        page: &dyn PageDriver,
        specs: &[FieldSpec],
    ) -> HashMap<String, Option<String>> {
        let mut values = HashMap::with_capacity(specs.len());

        for spec in specs {
            let value = match page.read_field(spec, self.field_wait).await {
                Ok(value) => value,
                Err(e) => {
                    debug!("字段 {} ({}) 提取失败: {}", spec.name, spec.selector, e);
                    None
                }
            };
            values.insert(spec.name.clone(), value);
        }

        values
    }
}
