//! Feed cycle metrics collection and reporting
//!
//! Tracks latency histograms, success rates, and the consecutive-failure
//! streak of the polling loop. Failed cycles never interrupt the
//! schedule; the streak is the observable signal that the provider has
//! been unreachable for a while.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics snapshot for the live price feed
#[derive(Debug, Clone)]
pub struct FeedMetrics {
    /// Name of the price provider backing the feed
    pub provider_name: String,
    /// 50th percentile cycle latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile cycle latency in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of cycles run
    pub total_cycles: u64,
    /// Number of wholly failed cycles
    pub failed_cycles: u64,
    /// Failed cycles since the last success
    pub consecutive_failures: u32,
}

impl FeedMetrics {
    /// Creates metrics with no data
    pub fn empty(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_cycles: 0,
            failed_cycles: 0,
            consecutive_failures: 0,
        }
    }
}

/// Internal sample for latency tracking
#[derive(Debug, Clone)]
struct CycleSample {
    duration_ms: f64,
    success: bool,
}

#[derive(Default)]
struct Counters {
    total_cycles: u64,
    failed_cycles: u64,
    consecutive_failures: u32,
}

/// Collects and computes metrics for the feed's fetch-and-update cycles
pub struct MetricsCollector {
    provider_name: String,
    samples: RwLock<VecDeque<CycleSample>>,
    counters: RwLock<Counters>,
}

impl MetricsCollector {
    /// Creates a new metrics collector for a provider
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            samples: RwLock::new(VecDeque::with_capacity(MAX_SAMPLES)),
            counters: RwLock::new(Counters::default()),
        }
    }

    /// Records one cycle with its duration and success status
    ///
    /// Returns the consecutive-failure streak after this cycle.
    pub async fn record_cycle(&self, duration: Duration, success: bool) -> u32 {
        let duration_ms = duration.as_secs_f64() * 1000.0;

        let streak = {
            let mut counters = self.counters.write().await;
            counters.total_cycles += 1;
            if success {
                counters.consecutive_failures = 0;
            } else {
                counters.failed_cycles += 1;
                counters.consecutive_failures += 1;
            }
            counters.consecutive_failures
        };

        {
            let mut samples = self.samples.write().await;
            if samples.len() >= MAX_SAMPLES {
                samples.pop_front();
            }
            samples.push_back(CycleSample {
                duration_ms,
                success,
            });
        }

        streak
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> FeedMetrics {
        let samples = self.samples.read().await;
        let counters = self.counters.read().await;

        if samples.is_empty() {
            return FeedMetrics::empty(&self.provider_name);
        }

        // Extract successful latencies for percentile calculation
        let mut latencies: Vec<f64> = samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();

        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let p50 = percentile(&latencies, 50.0);
        let p99 = percentile(&latencies, 99.0);

        let success_rate = if counters.total_cycles > 0 {
            (counters.total_cycles - counters.failed_cycles) as f64 / counters.total_cycles as f64
        } else {
            1.0
        };

        FeedMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: p50,
            latency_p99_ms: p99,
            success_rate,
            total_cycles: counters.total_cycles,
            failed_cycles: counters.failed_cycles,
            consecutive_failures: counters.consecutive_failures,
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
