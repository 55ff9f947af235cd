//! 运行登记表
//!
//! 进程内共享、可注入的运行状态存储。每条记录只由对应运行的编排任务写入，
//! 轮询方只读到克隆出来的快照。

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::request::RunRequest;
use crate::models::run::{Run, RunStatus};

/// 协作式取消标记，编排任务在每条输入开始前检查
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 取消请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Requested,
    AlreadyFinished,
    NotFound,
}

struct RunEntry {
    run: Run,
    cancel: CancelFlag,
}

/// 运行登记表
#[derive(Default)]
pub struct RunRegistry {
    runs: DashMap<Uuid, RunEntry>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新运行（queued）
    pub fn create(&self, payload: RunRequest) -> (Uuid, CancelFlag) {
        let id = Uuid::new_v4();
        let cancel = CancelFlag::default();
        self.runs.insert(
            id,
            RunEntry {
                run: Run::new(id, payload),
                cancel: cancel.clone(),
            },
        );
        (id, cancel)
    }

    /// 当前记录的快照
    pub fn get(&self, id: &Uuid) -> Option<Run> {
        self.runs.get(id).map(|entry| entry.run.clone())
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// queued → running
    pub fn mark_running(&self, id: &Uuid) -> bool {
        self.update(id, |run| {
            if run.status != RunStatus::Queued {
                return false;
            }
            run.status = RunStatus::Running;
            true
        })
    }

    /// 记录一条输入的处理结果，运行中可见
    pub fn record_item(&self, id: &Uuid, success: bool) -> bool {
        self.update(id, |run| {
            if run.status != RunStatus::Running {
                return false;
            }
            run.stats.record(success);
            true
        })
    }

    /// running → done，同时记录输出位置
    pub fn finish_done(&self, id: &Uuid, output_path: PathBuf) -> bool {
        self.update(id, |run| {
            if run.status != RunStatus::Running {
                return false;
            }
            run.status = RunStatus::Done;
            run.finished_at = Some(Utc::now());
            run.output_path = Some(output_path);
            true
        })
    }

    /// queued | running → error
    pub fn finish_error(&self, id: &Uuid, detail: String) -> bool {
        self.update(id, |run| {
            if run.status.is_terminal() {
                return false;
            }
            run.status = RunStatus::Error;
            run.finished_at = Some(Utc::now());
            run.error = Some(detail);
            run.output_path = None;
            true
        })
    }

    /// 请求取消运行，在下一条输入开始前生效
    pub fn cancel(&self, id: &Uuid) -> CancelOutcome {
        match self.runs.get(id) {
            None => CancelOutcome::NotFound,
            Some(entry) if entry.run.status.is_terminal() => CancelOutcome::AlreadyFinished,
            Some(entry) => {
                entry.cancel.cancel();
                CancelOutcome::Requested
            }
        }
    }

    fn update(&self, id: &Uuid, apply: impl FnOnce(&mut Run) -> bool) -> bool {
        match self.runs.get_mut(id) {
            Some(mut entry) => apply(&mut entry.run),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field_spec::FieldSpec;
    use crate::models::request::{AppendConfig, NavConfig, RunOptions};

    fn payload() -> RunRequest {
        RunRequest {
            navigation: NavConfig::Append(AppendConfig {
                base_url: "https://x.test/".into(),
            }),
            input_list: vec!["1".into()],
            selectors: vec![FieldSpec::text("t", "h1")],
            options: RunOptions::default(),
        }
    }

    #[test]
    fn follows_the_lifecycle() {
        let registry = RunRegistry::new();
        let (id, _) = registry.create(payload());
        assert_eq!(registry.get(&id).unwrap().status, RunStatus::Queued);

        // queued 状态下不计数
        assert!(!registry.record_item(&id, true));
        assert!(registry.mark_running(&id));
        assert!(!registry.mark_running(&id));
        assert!(registry.record_item(&id, true));
        assert!(registry.record_item(&id, false));

        let run = registry.get(&id).unwrap();
        assert_eq!(run.stats.total, 2);
        assert_eq!(run.stats.total, run.stats.ok + run.stats.err);

        assert!(registry.finish_done(&id, PathBuf::from("/tmp/x.csv")));
        let run = registry.get(&id).unwrap();
        assert_eq!(run.status, RunStatus::Done);
        assert!(run.finished_at.is_some());
        assert!(run.output_path.is_some());
    }

    #[test]
    fn terminal_states_are_final() {
        let registry = RunRegistry::new();
        let (id, _) = registry.create(payload());
        registry.mark_running(&id);
        assert!(registry.finish_error(&id, "boom".into()));

        assert!(!registry.finish_done(&id, PathBuf::from("/tmp/x.csv")));
        assert!(!registry.finish_error(&id, "again".into()));
        assert!(!registry.record_item(&id, true));

        let run = registry.get(&id).unwrap();
        assert_eq!(run.status, RunStatus::Error);
        assert_eq!(run.error.as_deref(), Some("boom"));
        assert!(run.output_path.is_none());
        assert_eq!(registry.cancel(&id), CancelOutcome::AlreadyFinished);
    }

    #[test]
    fn queued_run_can_fail_directly() {
        let registry = RunRegistry::new();
        let (id, _) = registry.create(payload());
        assert!(registry.finish_error(&id, "never started".into()));
        assert_eq!(registry.get(&id).unwrap().status, RunStatus::Error);
    }

    #[test]
    fn cancel_sets_the_shared_flag() {
        let registry = RunRegistry::new();
        let (id, flag) = registry.create(payload());
        assert!(!flag.is_cancelled());
        assert_eq!(registry.cancel(&id), CancelOutcome::Requested);
        assert!(flag.is_cancelled());
        assert_eq!(registry.cancel(&Uuid::new_v4()), CancelOutcome::NotFound);
    }

    #[test]
    fn registries_are_isolated() {
        let a = RunRegistry::new();
        let b = RunRegistry::new();
        let (id, _) = a.create(payload());
        assert!(b.get(&id).is_none());
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
