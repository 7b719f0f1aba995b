//! Fixed-window request counting per client identifier.
//!
//! Each window starts on the first request from an identifier and lasts
//! `window`. Because windows are not sliding, a client can get up to
//! `2 * max_requests` through in a short span straddling a window boundary.

use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::clock::{Clock, SystemClock};
use crate::metrics::TRACKED_CLIENTS;

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: i64, // unix millis when the window closes
}

#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u32,
    pub message: String,
}

// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_time: i64,
    pub cooldown_ms: u64, // time left in the window when the check ran
}

impl RateLimitDecision {
    // whole seconds, rounded up
    pub fn retry_after_secs(&self) -> u64 {
        self.cooldown_ms.div_ceil(1000)
    }
}

pub struct RateLimiter {
    name: String,
    policy: RateLimitPolicy,
    entries: DashMap<String, RateLimitEntry>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, policy: RateLimitPolicy) -> Self {
        Self::with_clock(name, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        name: impl Into<String>,
        policy: RateLimitPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            policy,
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limit(&self) -> u32 {
        self.policy.max_requests
    }

    pub fn message(&self) -> &str {
        &self.policy.message
    }

    fn window_millis(&self) -> i64 {
        self.policy.window.as_millis() as i64
    }

    /// Counts a request for `identifier` and reports whether it fits in the
    /// current window. Denied requests are not counted.
    pub fn is_allowed(&self, identifier: &str) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let window = self.window_millis();

        // the shard lock is held for the whole read-check-increment
        let mut entry = self
            .entries
            .entry(identifier.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                reset_time: now + window,
            });

        // window expired..? start a new one
        if now > entry.reset_time {
            entry.count = 0;
            entry.reset_time = now + window;
        }

        let cooldown_ms = (entry.reset_time - now).max(0) as u64;

        if entry.count >= self.policy.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_time: entry.reset_time,
                cooldown_ms,
            };
        }

        entry.count += 1;

        RateLimitDecision {
            allowed: true,
            remaining: self.policy.max_requests - entry.count,
            reset_time: entry.reset_time,
            cooldown_ms,
        }
    }

    /// Milliseconds until the identifier's window closes, 0 if untracked.
    pub fn remaining_cooldown(&self, identifier: &str) -> u64 {
        match self.entries.get(identifier) {
            Some(entry) => (entry.reset_time - self.clock.now_millis()).max(0) as u64,
            None => 0,
        }
    }

    /// Drops entries whose window has already closed. Returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_time >= now);
        before - self.entries.len()
    }

    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

pub fn rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_time: i64) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
    let reset = DateTime::<Utc>::from_timestamp_millis(reset_time)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .and_then(|t| HeaderValue::from_str(&t).ok());
    if let Some(reset) = reset {
        headers.insert(RESET_HEADER, reset);
    }
}

// Background sweep - keeps abandoned identifiers from piling up
pub async fn sweeper(limiters: Vec<Arc<RateLimiter>>, every: Duration) {
    let mut interval = interval(every);

    tracing::info!("Rate limit sweeper started (interval: {:?})", every);

    loop {
        interval.tick().await;

        let mut tracked = 0;
        for limiter in &limiters {
            let removed = limiter.sweep_expired();
            if removed > 0 {
                tracing::debug!(
                    limiter = limiter.name(),
                    removed,
                    "Swept expired rate limit entries"
                );
            }
            tracked += limiter.tracked();
        }
        TRACKED_CLIENTS.set(tracked as f64);
    }
}
