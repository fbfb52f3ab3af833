//! Client-side pacing for outbound generation calls.
//!
//! A [`RateWindowState`] keeps the instants of recent successful calls inside a
//! sliding window. Before each call the gate ([`RateWindowState::check_at`])
//! prunes the window and decides whether the call may go out. Recording happens
//! separately, only once a call has actually succeeded.

pub mod sessions;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::fmt;

use crate::config::RateLimitConfig;

/// The cadence enforced on one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePolicy {
    pub max_requests: usize,
    pub window: TimeDelta,
    pub min_interval: TimeDelta,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            max_requests: 15,
            window: TimeDelta::seconds(60),
            min_interval: TimeDelta::seconds(4),
        }
    }
}

impl From<&RateLimitConfig> for RatePolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: TimeDelta::seconds(config.window_secs as i64),
            min_interval: TimeDelta::milliseconds((config.min_interval_secs * 1000.0).round() as i64),
        }
    }
}

/// Why the gate refused a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Denial {
    /// The window already holds `max_requests` calls.
    WindowFull,
    /// The previous call was too recent; `wait_secs` remain.
    TooSoon { wait_secs: f64 },
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::WindowFull => write!(
                f,
                "Rate limit exceeded. Please wait a minute before making another request."
            ),
            Denial::TooSoon { wait_secs } => write!(
                f,
                "Please wait {:.1} seconds before making another request.",
                wait_secs
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateDecision {
    Allowed,
    Denied(Denial),
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }

    /// Human readable reason, "OK" when the call may proceed.
    pub fn reason(&self) -> String {
        match self {
            RateDecision::Allowed => "OK".to_string(),
            RateDecision::Denied(denial) => denial.to_string(),
        }
    }
}

/// Point-in-time view of a window, for status displays.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WindowSnapshot {
    pub requests_in_window: usize,
    pub max_requests: usize,
    pub seconds_since_last: Option<f64>,
}

/// Recent call history of one session.
///
/// Invariant: after any `check_at`/`snapshot_at`, `history` holds only instants
/// younger than the policy window, oldest first.
#[derive(Debug, Clone, Default)]
pub struct RateWindowState {
    history: Vec<DateTime<Utc>>,
    last_call: Option<DateTime<Utc>>,
}

impl RateWindowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, policy: &RatePolicy) -> RateDecision {
        self.check_at(Utc::now(), policy)
    }

    /// Gate a call at `now`. Prunes expired entries but never records.
    pub fn check_at(&mut self, now: DateTime<Utc>, policy: &RatePolicy) -> RateDecision {
        self.prune(now, policy.window);

        if self.history.len() >= policy.max_requests {
            return RateDecision::Denied(Denial::WindowFull);
        }

        if let Some(last) = self.last_call {
            let elapsed = now - last;
            if elapsed < policy.min_interval {
                return RateDecision::Denied(Denial::TooSoon {
                    wait_secs: seconds(policy.min_interval - elapsed),
                });
            }
        }

        RateDecision::Allowed
    }

    pub fn record(&mut self) {
        self.record_at(Utc::now());
    }

    /// Note a successful call made at `now`.
    pub fn record_at(&mut self, now: DateTime<Utc>) {
        self.history.push(now);
        self.last_call = Some(now);
    }

    pub fn snapshot_at(&mut self, now: DateTime<Utc>, policy: &RatePolicy) -> WindowSnapshot {
        self.prune(now, policy.window);
        WindowSnapshot {
            requests_in_window: self.history.len(),
            max_requests: policy.max_requests,
            seconds_since_last: self.last_call.map(|last| seconds(now - last)),
        }
    }

    /// True when nothing in the window would affect the next decision.
    pub fn is_idle_at(&self, now: DateTime<Utc>, policy: &RatePolicy) -> bool {
        match self.last_call {
            Some(last) => now - last >= policy.window,
            None => true,
        }
    }

    pub fn history(&self) -> &[DateTime<Utc>] {
        &self.history
    }

    pub fn last_call(&self) -> Option<DateTime<Utc>> {
        self.last_call
    }

    fn prune(&mut self, now: DateTime<Utc>, window: TimeDelta) {
        self.history.retain(|t| now - *t < window);
    }
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_microseconds().unwrap_or(i64::MAX) as f64 / 1_000_000.0
}
