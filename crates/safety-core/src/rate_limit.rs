//! Daily per-pair quota for rate-limited ping classes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use database::ping;
use serde::Serialize;
use sqlx::{Executor, Sqlite};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::clock::DayPolicy;
use crate::error::Result;
use crate::ping_type::PingType;

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    Deny { limit: u32 },
}

/// Today's usage of one ordered pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairQuota {
    pub receiver_id: String,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
}

/// Today's emergency pings from one sender across every recipient.
///
/// This is an aggregate for display only; the enforced limit is per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyUsage {
    pub daily_emergency_pings_sent: u32,
    pub limit_per_friend: u32,
}

/// Counts prior pings of a limited class for the exact (sender, receiver)
/// pair within the canonical calendar day.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    daily_limit: u32,
    day_policy: DayPolicy,
}

impl RateLimiter {
    pub fn new(daily_limit: u32, day_policy: DayPolicy) -> Self {
        Self {
            daily_limit,
            day_policy,
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Decide whether one more ping of `ping_type` fits in today's quota.
    ///
    /// Unlimited classes always pass without touching the store. The check does
    /// not reserve anything by itself: callers hold the pair lock and insert
    /// in the same transaction.
    pub async fn check<'e, E>(
        &self,
        executor: E,
        sender_id: &str,
        receiver_id: &str,
        ping_type: &PingType,
        occurred_at: DateTime<Utc>,
    ) -> Result<RateDecision>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if !ping_type.is_rate_limited() {
            return Ok(RateDecision::Allow);
        }

        let (from, until) = self.day_policy.day_bounds(occurred_at);
        let count =
            ping::count_for_pair(executor, sender_id, receiver_id, ping_type.as_str(), from, until)
                .await?;

        if count >= i64::from(self.daily_limit) {
            Ok(RateDecision::Deny {
                limit: self.daily_limit,
            })
        } else {
            Ok(RateDecision::Allow)
        }
    }

    /// Emergency quota used and left today for one ordered pair.
    pub async fn pair_quota<'e, E>(
        &self,
        executor: E,
        sender_id: &str,
        receiver_id: &str,
        at: DateTime<Utc>,
    ) -> Result<PairQuota>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let (from, until) = self.day_policy.day_bounds(at);
        let used = ping::count_for_pair(
            executor,
            sender_id,
            receiver_id,
            PingType::Emergency.as_str(),
            from,
            until,
        )
        .await?;
        let used = u32::try_from(used).unwrap_or(u32::MAX);

        Ok(PairQuota {
            receiver_id: receiver_id.to_string(),
            used,
            limit: self.daily_limit,
            remaining: self.daily_limit.saturating_sub(used),
        })
    }

    /// Emergency pings sent today by `sender_id` to anyone.
    pub async fn daily_usage<'e, E>(
        &self,
        executor: E,
        sender_id: &str,
        at: DateTime<Utc>,
    ) -> Result<DailyUsage>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let (from, until) = self.day_policy.day_bounds(at);
        let sent =
            ping::count_for_sender(executor, sender_id, PingType::Emergency.as_str(), from, until)
                .await?;

        Ok(DailyUsage {
            daily_emergency_pings_sent: u32::try_from(sent).unwrap_or(u32::MAX),
            limit_per_friend: self.daily_limit,
        })
    }
}

/// In-process locks serializing check-then-insert per ordered pair.
#[derive(Debug, Default)]
pub(crate) struct PairLocks {
    locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl PairLocks {
    /// Entries kept before idle locks are pruned.
    const PRUNE_THRESHOLD: usize = 1024;

    pub(crate) async fn acquire(&self, sender_id: &str, receiver_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() >= Self::PRUNE_THRESHOLD {
                // Only the map holds an idle lock.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks
                .entry((sender_id.to_string(), receiver_id.to_string()))
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_lock_is_per_ordered_pair() {
        let locks = PairLocks::default();
        let _ab = locks.acquire("alice", "bob").await;

        // The reverse direction is a different quota, so it must not wait.
        let ba = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            locks.acquire("bob", "alice"),
        )
        .await;
        assert!(ba.is_ok());

        let ab_again = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            locks.acquire("alice", "bob"),
        )
        .await;
        assert!(ab_again.is_err());
        assert_eq!(locks.len().await, 2);
    }
}
