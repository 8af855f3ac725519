//! Daily quota tracker backed by Redis.
//!
//! Unlike `UsageTracker` this counter is shared by every replica: requests are
//! counted with atomic `INCR`/`HINCRBY` on a key per UTC day. Tracking is best
//! effort; Redis failures and timeouts are logged and never fail the calling request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Free-tier allowance is 50/day per model; keep a small buffer.
pub const FREE_TIER_DAILY_LIMIT: u64 = 45;

const KEY_PREFIX: &str = "ai_quota";
/// Keys outlive their day so yesterday's numbers can still be inspected.
const KEY_TTL_SECS: i64 = 2 * 24 * 60 * 60;
/// Upper bound on any single quota round trip, connecting included.
const REDIS_TIMEOUT: Duration = Duration::from_millis(500);

/// Anything that counts served AI requests for a feature.
#[async_trait]
pub trait RequestTracker: Send + Sync {
    async fn track_request(&self, feature: &str);
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaStatus {
    pub can_proceed: bool,
    pub remaining_quota: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaUsage {
    pub date: NaiveDate,
    pub request_count: u64,
    pub remaining_quota: u64,
}

/// Holds one lazily opened multiplexed connection shared by every clone.
#[derive(Clone)]
pub struct QuotaTracker {
    redis: redis::Client,
    connection: Arc<OnceCell<MultiplexedConnection>>,
    daily_limit: u64,
}

#[async_trait]
impl RequestTracker for QuotaTracker {
    /// Counts one AI request for `feature` against today's quota.
    async fn track_request(&self, feature: &str) {
        let date = Utc::now().date_naive();
        match tokio::time::timeout(REDIS_TIMEOUT, self.increment(date, feature)).await {
            Ok(Ok(())) => info!(feature, %date, "Tracked AI request"),
            Ok(Err(e)) => error!(feature, error = %e, "Failed to track AI request"),
            Err(_) => error!(feature, "Timed out tracking AI request"),
        }
    }
}

impl QuotaTracker {
    pub fn new(redis: redis::Client) -> Self {
        Self {
            redis,
            connection: Arc::new(OnceCell::new()),
            daily_limit: FREE_TIER_DAILY_LIMIT,
        }
    }

    /// Whether today's quota still has room. Errors read as "proceed" with the full allowance.
    pub async fn status(&self) -> QuotaStatus {
        let usage = self.today_usage().await;
        QuotaStatus {
            can_proceed: usage.remaining_quota > 0,
            remaining_quota: usage.remaining_quota,
        }
    }

    pub async fn today_usage(&self) -> QuotaUsage {
        let date = Utc::now().date_naive();
        let request_count = match tokio::time::timeout(REDIS_TIMEOUT, self.read_count(date)).await {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                error!(error = %e, "Failed to read AI quota usage");
                0
            }
            Err(_) => {
                error!("Timed out reading AI quota usage");
                0
            }
        };
        QuotaUsage {
            date,
            request_count,
            remaining_quota: remaining(self.daily_limit, request_count),
        }
    }

    /// Opens the connection on first use. A failed attempt leaves the cell
    /// empty so the next call tries again.
    async fn connection(&self) -> redis::RedisResult<MultiplexedConnection> {
        self.connection
            .get_or_try_init(|| self.redis.get_multiplexed_async_connection())
            .await
            .cloned()
    }

    async fn increment(&self, date: NaiveDate, feature: &str) -> redis::RedisResult<()> {
        let mut con = self.connection().await?;
        let key = day_key(date);
        let feature_key = feature_key(date);

        redis::pipe()
            .atomic()
            .incr(&key, 1)
            .ignore()
            .hincr(&feature_key, feature, 1)
            .ignore()
            .expire(&key, KEY_TTL_SECS)
            .ignore()
            .expire(&feature_key, KEY_TTL_SECS)
            .ignore()
            .query_async::<_, ()>(&mut con)
            .await
    }

    async fn read_count(&self, date: NaiveDate) -> redis::RedisResult<u64> {
        let mut con = self.connection().await?;
        let count: Option<u64> = con.get(day_key(date)).await?;
        Ok(count.unwrap_or(0))
    }
}

fn day_key(date: NaiveDate) -> String {
    format!("{KEY_PREFIX}:{}", date.format("%Y-%m-%d"))
}

fn feature_key(date: NaiveDate) -> String {
    format!("{}:features", day_key(date))
}

fn remaining(limit: u64, used: u64) -> u64 {
    limit.saturating_sub(used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_per_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(day_key(date), "ai_quota:2026-03-07");
        assert_eq!(feature_key(date), "ai_quota:2026-03-07:features");
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_best_effort() {
        // Nothing listens on port 1, so connecting fails fast or times out.
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let tracker = QuotaTracker::new(client);

        tracker.track_request("resume-analysis").await;
        let usage = tracker.today_usage().await;

        assert_eq!(usage.request_count, 0);
        assert_eq!(usage.remaining_quota, FREE_TIER_DAILY_LIMIT);
        assert!(tracker.connection.get().is_none());
    }

    #[test]
    fn test_remaining_never_underflows() {
        assert_eq!(remaining(45, 10), 35);
        assert_eq!(remaining(45, 45), 0);
        assert_eq!(remaining(45, 60), 0);
    }
}
