//! 运行统计：总次数、成功 / 失败次数、平均耗时
//!
//! 统计汇聚点由调用方注入；同一进程内并发的多次运行共享一个 sink 时，
//! 读-改-写在同一把锁内完成。

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunStatsSnapshot {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    /// 所有运行（含失败）的平均耗时，秒
    pub average_duration_secs: f64,
}

/// 统计汇聚点
pub trait RunStatsSink: Send + Sync {
    fn record(&self, success: bool, elapsed: Duration);

    fn snapshot(&self) -> RunStatsSnapshot;
}

#[derive(Debug, Default)]
pub struct InMemoryRunStats {
    inner: Mutex<RunStatsSnapshot>,
}

impl InMemoryRunStats {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunStatsSink for InMemoryRunStats {
    fn record(&self, success: bool, elapsed: Duration) {
        let mut stats = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous_total = stats.total_runs as f64;
        stats.total_runs += 1;
        if success {
            stats.successful_runs += 1;
        } else {
            stats.failed_runs += 1;
        }
        stats.average_duration_secs = (stats.average_duration_secs * previous_total
            + elapsed.as_secs_f64())
            / stats.total_runs as f64;
    }

    fn snapshot(&self) -> RunStatsSnapshot {
        match self.inner.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
