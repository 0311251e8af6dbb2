//! Per-channel cooldown guard.
//!
//! `acquire` takes an async mutex for the (channel, action) pair and holds it
//! inside the returned [`RateLimitPermit`] for the whole invocation. A second
//! invocation for the same pair waits on that mutex and then sees whatever
//! timestamp the first one committed, so check and update act as one step.
//!
//! The timestamp is written only by [`RateLimitPermit::commit`]. Dropping a
//! permit without committing (insufficient history, completion failure)
//! leaves the store untouched.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use recap_core::types::ActionKind;

use crate::error::MemoryError;
use crate::store::RateLimitStore;

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("{action} is on cooldown for another {}s", remaining.as_secs())]
    Cooldown {
        action: ActionKind,
        remaining: Duration,
    },

    #[error(transparent)]
    Store(#[from] MemoryError),
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    locks: DashMap<(u64, ActionKind), Arc<Mutex<()>>>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RateLimitStore> {
        &self.store
    }

    /// Enter the exclusion region for (channel, action) and check its cooldown.
    pub async fn acquire(
        &self,
        channel_id: u64,
        action: ActionKind,
        cooldown: Duration,
    ) -> Result<RateLimitPermit, RateLimitError> {
        let lock = self
            .locks
            .entry((channel_id, action))
            .or_default()
            .value()
            .clone();
        let guard = lock.lock_owned().await;

        let last_invoked = self.store.get(channel_id, action)?;
        if let Some(last) = last_invoked {
            if let Some(remaining) = remaining_cooldown(last, Utc::now(), cooldown) {
                debug!(channel_id, action = %action, remaining_secs = remaining.as_secs(), "rate limited");
                return Err(RateLimitError::Cooldown { action, remaining });
            }
        }

        Ok(RateLimitPermit {
            _guard: guard,
            store: Arc::clone(&self.store),
            channel_id,
            action,
            last_invoked,
        })
    }
}

/// Time left before `cooldown` has elapsed since `last`, or `None` if it has.
pub fn remaining_cooldown(
    last: DateTime<Utc>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<Duration> {
    let cooldown_delta = TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX);
    let elapsed = now - last;
    if elapsed >= cooldown_delta {
        return None;
    }
    // A timestamp in the future (clock skew) can push this past the cooldown.
    let remaining = cooldown_delta
        .checked_sub(&elapsed)
        .and_then(|left| left.to_std().ok())
        .unwrap_or(cooldown);
    Some(remaining.min(cooldown))
}

/// Exclusive right to run one invocation of an action in a channel.
pub struct RateLimitPermit {
    _guard: OwnedMutexGuard<()>,
    store: Arc<dyn RateLimitStore>,
    channel_id: u64,
    action: ActionKind,
    last_invoked: Option<DateTime<Utc>>,
}

impl RateLimitPermit {
    /// Timestamp of the previous successful invocation, if any.
    pub fn last_invoked(&self) -> Option<DateTime<Utc>> {
        self.last_invoked
    }

    /// Record a successful invocation and release the exclusion region.
    pub fn commit(self, at: DateTime<Utc>) -> Result<(), MemoryError> {
        self.store.upsert(self.channel_id, self.action, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteRateLimitStore;
    use chrono::SubsecRound;
    use rusqlite::Connection;

    fn limiter() -> RateLimiter {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        RateLimiter::new(Arc::new(SqliteRateLimitStore::new(conn)))
    }

    const COOLDOWN: Duration = Duration::from_secs(15 * 60);

    #[tokio::test]
    async fn first_invocation_is_admitted() {
        let rl = limiter();
        let permit = rl.acquire(1, ActionKind::Summary, COOLDOWN).await.unwrap();
        assert!(permit.last_invoked().is_none());
    }

    #[tokio::test]
    async fn second_invocation_within_cooldown_is_rejected() {
        let rl = limiter();
        let permit = rl.acquire(1, ActionKind::Summary, COOLDOWN).await.unwrap();
        // the store keeps microsecond precision
        let committed = Utc::now().trunc_subsecs(6);
        permit.commit(committed).unwrap();

        match rl.acquire(1, ActionKind::Summary, COOLDOWN).await {
            Err(RateLimitError::Cooldown { action, remaining }) => {
                assert_eq!(action, ActionKind::Summary);
                assert!(remaining <= COOLDOWN);
                assert!(remaining > Duration::from_secs(14 * 60));
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected cooldown"),
        }
        // the rejected call did not touch the record
        assert_eq!(
            rl.store().get(1, ActionKind::Summary).unwrap(),
            Some(committed)
        );
    }

    #[tokio::test]
    async fn dropped_permit_writes_nothing() {
        let rl = limiter();
        drop(rl.acquire(1, ActionKind::Summary, COOLDOWN).await.unwrap());
        assert!(rl.store().get(1, ActionKind::Summary).unwrap().is_none());
        assert!(rl.acquire(1, ActionKind::Summary, COOLDOWN).await.is_ok());
    }

    #[tokio::test]
    async fn other_channel_and_action_are_independent() {
        let rl = limiter();
        rl.acquire(1, ActionKind::Summary, COOLDOWN)
            .await
            .unwrap()
            .commit(Utc::now())
            .unwrap();
        assert!(rl.acquire(2, ActionKind::Summary, COOLDOWN).await.is_ok());
        assert!(rl.acquire(1, ActionKind::MentionReply, COOLDOWN).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_invocation_waits_and_sees_commit() {
        let rl = Arc::new(limiter());
        let first = rl.acquire(1, ActionKind::Summary, COOLDOWN).await.unwrap();

        let rl2 = Arc::clone(&rl);
        let second =
            tokio::spawn(async move { rl2.acquire(1, ActionKind::Summary, COOLDOWN).await.is_ok() });

        tokio::task::yield_now().await;
        first.commit(Utc::now()).unwrap();

        assert!(!second.await.unwrap(), "second caller must observe the commit");
    }

    #[test]
    fn remaining_is_none_after_cooldown() {
        let last = Utc::now() - TimeDelta::minutes(16);
        assert!(remaining_cooldown(last, Utc::now(), COOLDOWN).is_none());
    }

    #[test]
    fn future_timestamp_is_capped_at_cooldown() {
        let now = Utc::now();
        let last = now + TimeDelta::minutes(5);
        assert_eq!(remaining_cooldown(last, now, COOLDOWN), Some(COOLDOWN));
    }

    #[test]
    fn huge_cooldown_with_future_timestamp_does_not_overflow() {
        let now = Utc::now();
        let last = now + TimeDelta::hours(1);
        let huge = Duration::from_secs(u64::MAX);
        assert_eq!(remaining_cooldown(last, now, huge), Some(huge));
    }

    #[test]
    fn remaining_counts_down() {
        let now = Utc::now();
        let last = now - TimeDelta::minutes(10);
        let remaining = remaining_cooldown(last, now, COOLDOWN).unwrap();
        assert_eq!(remaining, Duration::from_secs(5 * 60));
    }
}
