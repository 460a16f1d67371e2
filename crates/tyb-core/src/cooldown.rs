//! Per-user bookkeeping for the media pipelines: fetch cooldown and
//! in-flight slots.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use moka::{future::Cache, policy::EvictionPolicy};

use crate::domain::UserId;

/// Minimum interval between a user's successful fetches.
pub const FETCH_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownState {
    Ready,
    Wait(Duration),
}

/// Last-success table, bounded in size. Entries expire one window after
/// the fetch; at capacity the least recently used entry is evicted, so a
/// new record is always kept.
pub struct Cooldown {
    window: Duration,
    last: Cache<UserId, Instant>,
}

impl Cooldown {
    pub fn new(window: Duration, capacity: u64) -> Self {
        Self {
            window,
            last: Cache::builder()
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru())
                .time_to_live(window)
                .build(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn check(&self, user_id: UserId) -> CooldownState {
        self.check_at(user_id, Instant::now()).await
    }

    pub async fn check_at(&self, user_id: UserId, now: Instant) -> CooldownState {
        let Some(last) = self.last.get(&user_id).await else {
            return CooldownState::Ready;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.window {
            CooldownState::Ready
        } else {
            CooldownState::Wait(self.window - elapsed)
        }
    }

    /// Record a successful fetch.
    pub async fn record(&self, user_id: UserId) {
        self.record_at(user_id, Instant::now()).await
    }

    pub async fn record_at(&self, user_id: UserId, now: Instant) {
        self.last.insert(user_id, now).await;
    }
}

/// Whole seconds to report for a remaining wait; never rounds down to zero.
pub fn remaining_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs();
    if wait.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// At most one media operation per user at a time.
#[derive(Clone, Default)]
pub struct InFlight {
    users: Arc<Mutex<HashSet<UserId>>>,
}

impl InFlight {
    /// `None` when the user already has an operation running.
    pub fn try_acquire(&self, user_id: UserId) -> Option<InFlightGuard> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if !users.insert(user_id) {
            return None;
        }
        Some(InFlightGuard {
            users: Arc::clone(&self.users),
            user_id,
        })
    }
}

/// Releases the user's slot when dropped.
pub struct InFlightGuard {
    users: Arc<Mutex<HashSet<UserId>>>,
    user_id: UserId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.users
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.user_id);
    }
}
