use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::request::RunRequest;

/// 运行状态
///
/// `queued → running → done | error`，done 与 error 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Done | RunStatus::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Done => "done",
            RunStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// 运行计数，始终满足 total = ok + err
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub ok: usize,
    pub err: usize,
}

impl RunStats {
    pub fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.ok += 1;
        } else {
            self.err += 1;
        }
    }
}

/// 一次批量运行的记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stats: RunStats,
    /// error 状态下的诊断信息
    pub error: Option<String>,
    /// 仅在 done 且 CSV 确认存在时设置
    pub output_path: Option<PathBuf>,
    pub payload: RunRequest,
}

impl Run {
    pub fn new(id: Uuid, payload: RunRequest) -> Self {
        Self {
            id,
            status: RunStatus::Queued,
            created_at: Utc::now(),
            finished_at: None,
            stats: RunStats::default(),
            error: None,
            output_path: None,
            payload,
        }
    }

    /// 日志中使用的短 ID
    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }
}

pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
