//! Request governance for Vouch.
//!
//! Decides, per caller, whether a model call is permitted right now:
//! - [`BudgetLedger`]: daily token budget with lazy UTC rollover
//! - [`RateLimiter`]: sliding window + cooldown per identity, capped sessions
//! - [`availability`]: the single authoritative "can this caller proceed" answer
//!
//! Denials are values, never errors.

pub mod availability;
pub mod budget;
pub mod identity;
pub mod rate_limit;

pub use availability::{
    Admission, AvailabilitySnapshot, Governor, UnavailableReason, UsageWindow, evaluate,
};
pub use budget::{BudgetLedger, BudgetSnapshot, is_stale};
pub use identity::hash_identity;
pub use rate_limit::{DenyReason, RateDecision, RateLimitPolicy, RateLimiter};
