//! Update pass counters for host-side dashboards.
//!
//! The monitor never alerts or enforces limits; it only accumulates.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the monitor counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    /// Completed update passes
    pub update_count: u64,
    /// Element updates that failed across all passes
    pub error_count: u64,
    /// Duration of the most recent pass
    pub last_update_duration_ms: f64,
    /// Mean duration over all recorded passes
    pub average_update_duration_ms: f64,
    /// Resizes that were dropped by change detection
    pub skipped_count: u64,
    /// Registry entries removed because their drawable was gone
    pub pruned_count: u64,
}

#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    update_count: u64,
    error_count: u64,
    skipped_count: u64,
    pruned_count: u64,
    last_duration: Duration,
    total_duration: Duration,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed update pass and the number of element errors it produced.
    pub fn record(&mut self, duration: Duration, error_delta: u64) {
        self.update_count += 1;
        self.error_count += error_delta;
        self.last_duration = duration;
        self.total_duration += duration;
    }

    /// Records a resize that did not lead to a pass.
    pub fn record_skip(&mut self) {
        self.skipped_count += 1;
    }

    pub fn record_pruned(&mut self, count: usize) {
        self.pruned_count += count as u64;
    }

    pub fn stats(&self) -> PerformanceSnapshot {
        let average = if self.update_count == 0 {
            0.0
        } else {
            as_ms(self.total_duration) / self.update_count as f64
        };

        PerformanceSnapshot {
            update_count: self.update_count,
            error_count: self.error_count,
            last_update_duration_ms: as_ms(self.last_duration),
            average_update_duration_ms: average,
            skipped_count: self.skipped_count,
            pruned_count: self.pruned_count,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn as_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_monitor_reports_zeroes() {
        let stats = PerformanceMonitor::new().stats();
        assert_eq!(stats, PerformanceSnapshot::default());
    }

    #[test]
    fn counters_accumulate() {
        let mut mon = PerformanceMonitor::new();
        mon.record(Duration::from_millis(4), 0);
        mon.record(Duration::from_millis(8), 2);
        mon.record_skip();
        mon.record_pruned(3);

        let stats = mon.stats();
        assert_eq!(stats.update_count, 2);
        assert_eq!(stats.error_count, 2);
        assert_eq!(stats.skipped_count, 1);
        assert_eq!(stats.pruned_count, 3);
        assert!((stats.last_update_duration_ms - 8.0).abs() < 1e-9);
        assert!((stats.average_update_duration_ms - 6.0).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_everything() {
        let mut mon = PerformanceMonitor::new();
        mon.record(Duration::from_millis(10), 1);
        mon.reset();
        assert_eq!(mon.stats(), PerformanceSnapshot::default());
    }

    #[test]
    fn snapshot_uses_camel_case_json() {
        let mut mon = PerformanceMonitor::new();
        mon.record(Duration::from_millis(2), 1);

        let json = serde_json::to_value(mon.stats()).unwrap();
        assert_eq!(json["updateCount"], 1);
        assert_eq!(json["errorCount"], 1);
        assert!(json.get("averageUpdateDurationMs").is_some());
    }
}
