//! Sliding-window rate limiter with cooldown, plus a per-session cap.
//!
//! Two gates are checked together: a window gate keyed by hashed caller
//! identity and a session gate keyed by the opaque session id. A single
//! `RwLock` guards both maps so one identity's consumption is linearizable;
//! `inspect` only ever takes the read lock.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use vouch_config::{MAX_RATE_LIMIT_SECS, RateLimitConfig};

/// Bucket maps are pruned once they track more than this many keys.
pub const MAX_TRACKED_KEYS: usize = 10_000;

/// Rate limiting parameters.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub window: TimeDelta,
    pub window_limit: u32,
    pub session_limit: u32,
    pub session_lifetime: TimeDelta,
    pub cooldown: TimeDelta,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window: TimeDelta::minutes(10),
            window_limit: 8,
            session_limit: 20,
            session_lifetime: TimeDelta::hours(24),
            cooldown: TimeDelta::seconds(60),
        }
    }
}

/// Seconds capped at [`MAX_RATE_LIMIT_SECS`], so unvalidated config cannot overflow.
fn bounded_secs(secs: u64) -> TimeDelta {
    TimeDelta::seconds(secs.min(MAX_RATE_LIMIT_SECS) as i64)
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            window: bounded_secs(config.window_secs),
            window_limit: config.window_limit,
            session_limit: config.session_limit,
            session_lifetime: bounded_secs(config.session_lifetime_secs),
            cooldown: bounded_secs(config.cooldown_secs),
        }
    }
}

/// Why the limiter refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Cooldown,
    SessionLimit,
    WindowLimit,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cooldown => write!(f, "cooldown"),
            Self::SessionLimit => write!(f, "session_limit"),
            Self::WindowLimit => write!(f, "window_limit"),
        }
    }
}

/// Outcome of an `inspect` or `consume` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_sec: Option<u64>,
    pub remaining_in_window: u32,
    pub session_remaining: u32,
}

impl RateDecision {
    fn allow(remaining_in_window: u32, session_remaining: u32) -> Self {
        Self {
            allowed: true,
            reason: None,
            retry_after_sec: None,
            remaining_in_window,
            session_remaining,
        }
    }

    fn deny(
        reason: DenyReason,
        retry_after_sec: u64,
        remaining_in_window: u32,
        session_remaining: u32,
    ) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            retry_after_sec: Some(retry_after_sec),
            remaining_in_window,
            session_remaining,
        }
    }
}

#[derive(Debug, Default)]
struct IdentityBucket {
    timestamps: VecDeque<DateTime<Utc>>,
    cooldown_until: Option<DateTime<Utc>>,
}

impl IdentityBucket {
    fn live_timestamps(
        &self,
        now: DateTime<Utc>,
        window: TimeDelta,
    ) -> impl Iterator<Item = &DateTime<Utc>> {
        let cutoff = now - window;
        self.timestamps.iter().filter(move |t| **t > cutoff)
    }

    fn prune(&mut self, now: DateTime<Utc>, window: TimeDelta) {
        let cutoff = now - window;
        while self.timestamps.front().is_some_and(|t| *t <= cutoff) {
            self.timestamps.pop_front();
        }
        if self.cooldown_until.is_some_and(|until| until <= now) {
            self.cooldown_until = None;
        }
    }

    fn is_idle(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        self.live_timestamps(now, window).next().is_none()
            && !self.cooldown_until.is_some_and(|until| until > now)
    }
}

#[derive(Debug)]
struct SessionBucket {
    count: u32,
    reset_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LimiterState {
    identities: HashMap<String, IdentityBucket>,
    sessions: HashMap<String, SessionBucket>,
    last_session_sweep: Option<DateTime<Utc>>,
}

/// Whole seconds in `delta`, rounded up, never negative.
pub fn ceil_secs(delta: TimeDelta) -> u64 {
    let ms = delta.num_milliseconds();
    if ms <= 0 { 0 } else { ((ms + 999) / 1000) as u64 }
}

/// Per-identity sliding window and per-session daily cap.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    max_tracked: usize,
    state: RwLock<LimiterState>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            max_tracked: MAX_TRACKED_KEYS,
            state: RwLock::new(LimiterState::default()),
        }
    }

    /// Override the bucket-map pruning threshold.
    pub fn with_max_tracked(mut self, max_tracked: usize) -> Self {
        self.max_tracked = max_tracked.max(1);
        self
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn inspect(&self, identity: &str, session_id: &str) -> RateDecision {
        self.inspect_at(identity, session_id, Utc::now())
    }

    /// Evaluate both gates as of `now` without mutating any state.
    pub fn inspect_at(&self, identity: &str, session_id: &str, now: DateTime<Utc>) -> RateDecision {
        let policy = &self.policy;
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        let bucket = state.identities.get(identity);
        let live: Vec<DateTime<Utc>> = bucket
            .map(|b| b.live_timestamps(now, policy.window).copied().collect())
            .unwrap_or_default();
        let cooldown_until = bucket.and_then(|b| b.cooldown_until);

        let (session_count, session_reset) = match state.sessions.get(session_id) {
            Some(s) if s.reset_at > now => (s.count, s.reset_at),
            _ => (0, now + policy.session_lifetime),
        };

        let remaining_in_window = policy.window_limit.saturating_sub(live.len() as u32);
        let session_remaining = policy.session_limit.saturating_sub(session_count);

        if let Some(until) = cooldown_until.filter(|until| *until > now) {
            return RateDecision::deny(
                DenyReason::Cooldown,
                ceil_secs(until - now),
                remaining_in_window,
                session_remaining,
            );
        }

        if session_count >= policy.session_limit {
            return RateDecision::deny(
                DenyReason::SessionLimit,
                ceil_secs(session_reset - now),
                remaining_in_window,
                session_remaining,
            );
        }

        if live.len() as u32 >= policy.window_limit {
            let oldest = live.iter().min().copied().unwrap_or(now);
            return RateDecision::deny(
                DenyReason::WindowLimit,
                ceil_secs(oldest + policy.window - now),
                remaining_in_window,
                session_remaining,
            );
        }

        RateDecision::allow(remaining_in_window, session_remaining)
    }

    pub fn consume(&self, identity: &str, session_id: &str) -> RateDecision {
        self.consume_at(identity, session_id, Utc::now())
    }

    /// Evaluate both gates as of `now` and record the outcome.
    ///
    /// An allowed call appends a window timestamp and increments the session
    /// count. A call over the window limit starts the cooldown penalty.
    pub fn consume_at(&self, identity: &str, session_id: &str, now: DateTime<Utc>) -> RateDecision {
        let policy = &self.policy;
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;

        let session = state
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionBucket {
                count: 0,
                reset_at: now + policy.session_lifetime,
            });
        if session.reset_at <= now {
            *session = SessionBucket {
                count: 0,
                reset_at: now + policy.session_lifetime,
            };
        }
        let session_count = session.count;
        let session_reset = session.reset_at;
        let session_remaining = policy.session_limit.saturating_sub(session_count);

        let bucket = state.identities.entry(identity.to_string()).or_default();
        bucket.prune(now, policy.window);
        let window_count = bucket.timestamps.len() as u32;
        let remaining_in_window = policy.window_limit.saturating_sub(window_count);

        let decision = if let Some(until) = bucket.cooldown_until.filter(|until| *until > now) {
            RateDecision::deny(
                DenyReason::Cooldown,
                ceil_secs(until - now),
                remaining_in_window,
                session_remaining,
            )
        } else if session_count >= policy.session_limit {
            RateDecision::deny(
                DenyReason::SessionLimit,
                ceil_secs(session_reset - now),
                remaining_in_window,
                session_remaining,
            )
        } else if window_count >= policy.window_limit {
            bucket.cooldown_until = Some(now + policy.cooldown);
            tracing::warn!(
                window_count,
                cooldown_secs = policy.cooldown.num_seconds(),
                "Window limit exceeded, cooldown started"
            );
            RateDecision::deny(
                DenyReason::Cooldown,
                ceil_secs(policy.cooldown),
                remaining_in_window,
                session_remaining,
            )
        } else {
            bucket.timestamps.push_back(now);
            if let Some(session) = state.sessions.get_mut(session_id) {
                session.count += 1;
            }
            RateDecision::allow(
                remaining_in_window.saturating_sub(1),
                session_remaining.saturating_sub(1),
            )
        };

        self.evict_idle(state, now);
        self.sweep_sessions(state, now);
        decision
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .identities
            .len()
    }

    /// Number of sessions currently tracked.
    pub fn tracked_sessions(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .len()
    }

    /// Drop expired sessions, at most once per window.
    fn sweep_sessions(&self, state: &mut LimiterState, now: DateTime<Utc>) {
        if state
            .last_session_sweep
            .is_some_and(|last| now - last < self.policy.window)
        {
            return;
        }
        state.sessions.retain(|_, session| session.reset_at > now);
        state.last_session_sweep = Some(now);
    }

    fn evict_idle(&self, state: &mut LimiterState, now: DateTime<Utc>) {
        if state.identities.len() > self.max_tracked {
            let window = self.policy.window;
            let before = state.identities.len();
            state.identities.retain(|_, bucket| !bucket.is_idle(now, window));
            state.sessions.retain(|_, session| session.reset_at > now);
            tracing::debug!(
                evicted = before - state.identities.len(),
                remaining = state.identities.len(),
                "Evicted idle rate-limit buckets"
            );
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}
