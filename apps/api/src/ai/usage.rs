//! In-process usage tracker.
//!
//! One instance is owned by the orchestrator and shared through `AppState`.
//! Counts are per process: several replicas each keep their own counter, and a
//! restart resets it. The Redis-backed `QuotaTracker` is the cross-process view.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::info;

/// 3 free models × 50 requests/day.
pub const DEFAULT_DAILY_CAP: u64 = 150;

/// Accumulated cost is stored in nano-dollars so it fits an atomic integer.
const NANOS_PER_DOLLAR: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub count: u64,
    pub percent_of_daily_cap: f64,
    pub daily_cap: u64,
    pub total_estimated_cost: f64,
    pub recommendation: String,
}

#[derive(Debug)]
pub struct UsageTracker {
    count: AtomicU64,
    cost_nanos: AtomicU64,
    daily_cap: u64,
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::with_daily_cap(DEFAULT_DAILY_CAP)
    }
}

impl UsageTracker {
    pub fn with_daily_cap(daily_cap: u64) -> Self {
        Self {
            count: AtomicU64::new(0),
            cost_nanos: AtomicU64::new(0),
            daily_cap: daily_cap.max(1),
        }
    }

    /// Records one successful orchestrated request. Returns the new count.
    pub fn increment(&self, estimated_cost: f64) -> u64 {
        let nanos = (estimated_cost.max(0.0) * NANOS_PER_DOLLAR).round() as u64;
        self.cost_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.cost_nanos.store(0, Ordering::Relaxed);
        info!("Usage counter reset");
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn total_estimated_cost(&self) -> f64 {
        self.cost_nanos.load(Ordering::Relaxed) as f64 / NANOS_PER_DOLLAR
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let count = self.count();
        let percent = (count as f64 / self.daily_cap as f64 * 100.0).min(100.0);

        UsageSnapshot {
            count,
            percent_of_daily_cap: percent,
            daily_cap: self.daily_cap,
            total_estimated_cost: self.total_estimated_cost(),
            recommendation: recommendation_for(percent, self.daily_cap),
        }
    }
}

fn recommendation_for(percent: f64, daily_cap: u64) -> String {
    if percent > 90.0 {
        format!("URGENT: Consider upgrading to a paid plan - you're using all {daily_cap} daily requests")
    } else if percent > 75.0 {
        "WARNING: High usage detected - paid plan recommended for production".to_string()
    } else if percent > 50.0 {
        "MODERATE: Monitor usage - may need upgrade soon".to_string()
    } else {
        "NORMAL: Current free tier sufficient for now".to_string()
    }
}
