//! Sliding fixed-window rate limiter for pitch generation.
//!
//! Per-process and in-memory: one entry per user, reset when its window has
//! fully elapsed. Exceeding the limit only delays an AI call, so no
//! cross-process coordination is attempted; a multi-instance deployment
//! must pin users to instances or move this state to a shared store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::RateLimitConfig;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed {
        /// Actions left in the current window after this one
        remaining: u32,
    },
    Limited {
        /// Whole seconds until the window resets (rounded up)
        retry_after_secs: u64,
    },
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u32,
    window_resets_at: Instant,
}

/// Per-user fixed-window counter, shared across handlers via `web::Data`
pub struct RateLimiter {
    window: Duration,
    max_per_window: u32,
    gc_grace: Duration,
    entries: Mutex<HashMap<Uuid, WindowState>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_secs),
            max_per_window: config.max_per_window,
            gc_grace: Duration::from_secs(config.gc_grace_secs),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks the caller against its window and counts this action if
    /// allowed. The counter is only incremented after it has been confirmed
    /// below the limit for the active window.
    pub fn check_and_increment(&self, user_id: Uuid) -> RateDecision {
        self.check_at(user_id, Instant::now())
    }

    fn check_at(&self, user_id: Uuid, now: Instant) -> RateDecision {
        let mut entries = self.entries.lock().expect("rate limiter lock poisoned");

        let state = entries.entry(user_id).or_insert(WindowState {
            count: 0,
            window_resets_at: now + self.window,
        });

        // Stale window: start a fresh one before consulting the count
        if now > state.window_resets_at {
            state.count = 0;
            state.window_resets_at = now + self.window;
        }

        if state.count >= self.max_per_window {
            let remaining_window = state.window_resets_at.saturating_duration_since(now);
            return RateDecision::Limited {
                retry_after_secs: remaining_window.as_millis().div_ceil(1000) as u64,
            };
        }

        state.count += 1;
        RateDecision::Allowed {
            remaining: self.max_per_window - state.count,
        }
    }

    /// Drops entries whose window expired more than the grace period ago.
    /// Purely a memory bound, not needed for correctness.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().expect("rate limiter lock poisoned");
        let before = entries.len();
        entries.retain(|_, state| now < state.window_resets_at + self.gc_grace);
        before - entries.len()
    }

    /// Number of tracked users (for tests and diagnostics)
    pub fn tracked_users(&self) -> usize {
        self.entries.lock().expect("rate limiter lock poisoned").len()
    }
}

/// Spawns the periodic purge task for a shared limiter
pub fn spawn_purge_task(limiter: actix_web::web::Data<RateLimiter>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            let purged = limiter.purge_expired();
            if purged > 0 {
                log::debug!("Purged {} expired rate limit entries", purged);
            }
        }
    });
}
