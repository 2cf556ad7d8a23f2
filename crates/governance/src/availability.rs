//! Availability aggregation.
//!
//! [`evaluate`] folds the kill-switch, credential presence, ledger state and
//! limiter state into one snapshot. [`Governor`] owns the shared ledger and
//! limiter and runs the inspect → consume admission sequence.

use crate::budget::{BudgetLedger, BudgetSnapshot};
use crate::rate_limit::{DenyReason, RateDecision, RateLimitPolicy, RateLimiter, ceil_secs};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, warn};
use vouch_config::AppConfig;

/// Why the assistant cannot serve a caller right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    Disabled,
    MissingApiKey,
    DailyBudgetExceeded,
    Cooldown,
    RateLimited,
}

impl UnavailableReason {
    /// Caller-side throttling, as opposed to a service-side outage.
    pub fn is_throttle(&self) -> bool {
        matches!(self, Self::Cooldown | Self::RateLimited)
    }
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disabled => "disabled",
            Self::MissingApiKey => "missing_api_key",
            Self::DailyBudgetExceeded => "daily_budget_exceeded",
            Self::Cooldown => "cooldown",
            Self::RateLimited => "rate_limited",
        };
        f.write_str(s)
    }
}

/// Remaining capacity, attached to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageWindow {
    pub remaining_in_window: u32,
    pub session_remaining: u32,
    pub remaining_tokens: u64,
    pub reset_at: DateTime<Utc>,
}

/// The authoritative answer to "can this caller proceed, and why not".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySnapshot {
    pub available: bool,
    /// `None` serializes as `"ok"`.
    #[serde(serialize_with = "serialize_reason")]
    pub reason: Option<UnavailableReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_sec: Option<u64>,
    pub usage_window: UsageWindow,
}

fn serialize_reason<S: Serializer>(
    reason: &Option<UnavailableReason>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match reason {
        Some(reason) => reason.serialize(serializer),
        None => serializer.serialize_str("ok"),
    }
}

/// Combine the four inputs in strict priority order.
pub fn evaluate(
    enabled: bool,
    has_api_key: bool,
    budget: &BudgetSnapshot,
    rate: &RateDecision,
    now: DateTime<Utc>,
) -> AvailabilitySnapshot {
    let usage_window = UsageWindow {
        remaining_in_window: rate.remaining_in_window,
        session_remaining: rate.session_remaining,
        remaining_tokens: budget.remaining_tokens,
        reset_at: budget.reset_at,
    };

    let denied = |reason, retry_after_sec| AvailabilitySnapshot {
        available: false,
        reason: Some(reason),
        retry_after_sec,
        usage_window: usage_window.clone(),
    };

    if !enabled {
        return denied(UnavailableReason::Disabled, None);
    }
    if !has_api_key {
        return denied(UnavailableReason::MissingApiKey, None);
    }
    if !budget.available {
        return denied(
            UnavailableReason::DailyBudgetExceeded,
            Some(ceil_secs(budget.reset_at - now)),
        );
    }
    if !rate.allowed {
        let reason = match rate.reason {
            Some(DenyReason::Cooldown) => UnavailableReason::Cooldown,
            _ => UnavailableReason::RateLimited,
        };
        return denied(reason, rate.retry_after_sec);
    }

    AvailabilitySnapshot {
        available: true,
        reason: None,
        retry_after_sec: None,
        usage_window,
    }
}

/// Result of [`Governor::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The limiter was consumed; the snapshot reflects the post-admission window.
    Admitted(AvailabilitySnapshot),
    Denied(AvailabilitySnapshot),
}

/// Owns the shared ledger and limiter plus the static availability flags.
pub struct Governor {
    enabled: bool,
    has_api_key: bool,
    ledger: Arc<BudgetLedger>,
    limiter: Arc<RateLimiter>,
}

impl Governor {
    pub fn new(
        enabled: bool,
        has_api_key: bool,
        ledger: Arc<BudgetLedger>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            enabled,
            has_api_key,
            ledger,
            limiter,
        }
    }

    /// Build a governor with fresh state from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.enabled,
            config.has_api_key(),
            Arc::new(BudgetLedger::new(config.budget.daily_token_budget)),
            Arc::new(RateLimiter::new(RateLimitPolicy::from(&config.rate_limit))),
        )
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn status(&self, identity: &str, session_id: &str) -> AvailabilitySnapshot {
        self.status_at(identity, session_id, Utc::now())
    }

    /// Side-effect-free availability check.
    pub fn status_at(
        &self,
        identity: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> AvailabilitySnapshot {
        let rate = self.limiter.inspect_at(identity, session_id, now);
        let budget = self.ledger.inspect_at(now);
        evaluate(self.enabled, self.has_api_key, &budget, &rate, now)
    }

    pub fn admit(&self, identity: &str, session_id: &str) -> Admission {
        self.admit_at(identity, session_id, Utc::now())
    }

    /// Check availability, then consume the limiter.
    ///
    /// The limiter is only consumed when the inspection passes, so denied
    /// callers never accrue window timestamps.
    pub fn admit_at(&self, identity: &str, session_id: &str, now: DateTime<Utc>) -> Admission {
        let status = self.status_at(identity, session_id, now);
        if !status.available {
            warn!(
                identity,
                reason = ?status.reason,
                retry_after_sec = ?status.retry_after_sec,
                "Request denied by availability check"
            );
            return Admission::Denied(status);
        }

        let rate = self.limiter.consume_at(identity, session_id, now);
        let budget = self.ledger.inspect_at(now);
        let snapshot = evaluate(self.enabled, self.has_api_key, &budget, &rate, now);
        if snapshot.available {
            debug!(
                identity,
                remaining_in_window = rate.remaining_in_window,
                session_remaining = rate.session_remaining,
                "Request admitted"
            );
            Admission::Admitted(snapshot)
        } else {
            warn!(identity, reason = ?snapshot.reason, "Request denied by rate limiter");
            Admission::Denied(snapshot)
        }
    }

    /// Report tokens actually spent by an admitted request.
    pub fn report_usage(&self, tokens: i64) -> BudgetSnapshot {
        self.report_usage_at(tokens, Utc::now())
    }

    pub fn report_usage_at(&self, tokens: i64, now: DateTime<Utc>) -> BudgetSnapshot {
        let snapshot = self.ledger.consume_at(tokens, now);
        debug!(
            tokens,
            remaining_tokens = snapshot.remaining_tokens,
            "Recorded token usage"
        );
        snapshot
    }
}
