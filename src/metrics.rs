//! Fetch client metrics
//!
//! Rolling latency window plus lifetime counters, one collector per client.
//! A sample covers a whole fetch, retries and cooldowns included.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Maximum number of samples to keep for latency percentiles
const MAX_SAMPLES: usize = 100;

/// Snapshot of the collected metrics
#[derive(Debug, Clone, PartialEq)]
pub struct FetchMetrics {
    /// 50th percentile latency of successful fetches, in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful fetches, in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    pub total_fetches: u64,
    pub failed_fetches: u64,
    /// Attempts beyond the first, summed over all fetches
    pub retries: u64,
}

impl Default for FetchMetrics {
    fn default() -> Self {
        Self {
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_fetches: 0,
            failed_fetches: 0,
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Inner {
    samples: VecDeque<Sample>,
    total: u64,
    failed: u64,
    retries: u64,
}

/// Collects fetch outcomes
#[derive(Debug, Default)]
pub struct MetricsCollector {
    inner: Mutex<Inner>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fetch with its total duration and attempt count
    pub fn record(&self, duration: Duration, success: bool, attempts: u32) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        inner.total += 1;
        if !success {
            inner.failed += 1;
        }
        inner.retries += u64::from(attempts.saturating_sub(1));

        if inner.samples.len() >= MAX_SAMPLES {
            inner.samples.pop_front();
        }
        inner.samples.push_back(Sample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    pub fn snapshot(&self) -> FetchMetrics {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.total == 0 {
            return FetchMetrics::default();
        }

        let mut latencies: Vec<f64> = inner
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.total_cmp(b));

        FetchMetrics {
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate: (inner.total - inner.failed) as f64 / inner.total as f64,
            total_fetches: inner.total,
            failed_fetches: inner.failed,
            retries: inner.retries,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}
