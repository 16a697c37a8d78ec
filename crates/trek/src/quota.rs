//! Request budget for the elevation correction service.

use std::time::Duration;

/// Tracks requests issued today against a daily cap, plus the per-second
/// throttle the free service tier asks for.
///
/// Created fresh per enhancement run, or injected by a caller that wants to
/// share one budget across several runs. Never persisted; only one
/// enhancement pass may hold it at a time, which `&mut` access enforces.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaState {
    requests_today: u32,
    daily_limit: u32,
    per_second_limit: f64,
}

impl QuotaState {
    pub fn new(daily_limit: u32, per_second_limit: f64) -> Self {
        Self {
            requests_today: 0,
            daily_limit,
            per_second_limit,
        }
    }

    /// Accounts for requests already spent today, e.g. by an earlier run.
    pub fn with_requests_today(mut self, count: u32) -> Self {
        self.requests_today = count;
        self
    }

    pub fn requests_today(&self) -> u32 {
        self.requests_today
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// True once the daily budget is spent; no further request may be issued.
    pub fn is_exhausted(&self) -> bool {
        self.requests_today >= self.daily_limit
    }

    /// Counts one issued request against today's budget.
    pub fn record_request(&mut self) {
        self.requests_today = self.requests_today.saturating_add(1);
    }

    /// Pause between successful requests that keeps under the per-second cap.
    /// A non-positive cap disables throttling.
    pub fn throttle_interval(&self) -> Duration {
        if self.per_second_limit > 0.0 {
            Duration::from_secs_f64(1.0 / self.per_second_limit)
        } else {
            Duration::ZERO
        }
    }
}
