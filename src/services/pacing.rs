//! 节奏控制：条目之间的随机间隔和模拟人工的短暂停顿

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

/// 点击结果 / 返回按钮之前的停顿范围（毫秒）
pub const HUMAN_DWELL_MS: RangeInclusive<u64> = 150..=350;

#[derive(Debug, Clone)]
pub struct Pacer {
    delay_ms: RangeInclusive<u64>,
    dwell_ms: RangeInclusive<u64>,
}

impl Pacer {
    /// `min > max` 时两者交换
    pub fn new(delay_ms_min: u64, delay_ms_max: u64) -> Self {
        let (lo, hi) = if delay_ms_min <= delay_ms_max {
            (delay_ms_min, delay_ms_max)
        } else {
            (delay_ms_max, delay_ms_min)
        };
        Self {
            delay_ms: lo..=hi,
            dwell_ms: HUMAN_DWELL_MS,
        }
    }

    /// 从 `[min, max]` 均匀抽取下一个条目间隔
    pub fn next_delay(&self) -> Duration {
        Duration::from_millis(pick(&self.delay_ms))
    }

    pub fn next_dwell(&self) -> Duration {
        Duration::from_millis(pick(&self.dwell_ms))
    }

    /// 条目之间的节奏等待
    pub async fn pace(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    /// 模拟人工停顿
    pub async fn dwell(&self) {
        sleep(self.next_dwell()).await;
    }
}

fn pick(range: &RangeInclusive<u64>) -> u64 {
    if range.start() == range.end() {
        *range.start()
    } else {
        rand::rng().random_range(range.clone())
    }
}
