//! Daily token budget ledger.
//!
//! One entry per UTC day. Rollover is lazy: reads on a new day report zero
//! usage without touching state, and the first consumption of the day
//! replaces the stale entry.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};

/// Default daily token ceiling.
pub const DEFAULT_DAILY_TOKEN_BUDGET: u64 = 120_000;

/// Point-in-time view of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub available: bool,
    pub used_tokens: u64,
    pub token_budget: u64,
    pub remaining_tokens: u64,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    day_key: NaiveDate,
    used_tokens: u64,
}

/// Tracks cumulative token consumption for the current UTC day.
pub struct BudgetLedger {
    token_budget: u64,
    entry: RwLock<LedgerEntry>,
}

/// The UTC calendar day `now` falls on.
pub fn day_key(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// The UTC midnight following `now`.
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| now + TimeDelta::days(1))
}

/// Whether an entry recorded on `stored_day` no longer applies on `current_day`.
pub fn is_stale(stored_day: NaiveDate, current_day: NaiveDate) -> bool {
    stored_day != current_day
}

impl BudgetLedger {
    /// Create a ledger with the given ceiling (raised to at least 1).
    pub fn new(token_budget: u64) -> Self {
        Self::starting_at(token_budget, Utc::now())
    }

    /// Create a ledger whose first entry belongs to the day of `now`.
    pub fn starting_at(token_budget: u64, now: DateTime<Utc>) -> Self {
        Self {
            token_budget: token_budget.max(1),
            entry: RwLock::new(LedgerEntry {
                day_key: day_key(now),
                used_tokens: 0,
            }),
        }
    }

    pub fn token_budget(&self) -> u64 {
        self.token_budget
    }

    pub fn inspect(&self) -> BudgetSnapshot {
        self.inspect_at(Utc::now())
    }

    /// Read the ledger as of `now` without mutating it.
    pub fn inspect_at(&self, now: DateTime<Utc>) -> BudgetSnapshot {
        let entry = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        let used = if is_stale(entry.day_key, day_key(now)) {
            0
        } else {
            entry.used_tokens
        };
        self.snapshot(used, now)
    }

    pub fn consume(&self, tokens: i64) -> BudgetSnapshot {
        self.consume_at(tokens, Utc::now())
    }

    /// Record `tokens` of usage as of `now`. Negative input counts as zero.
    pub fn consume_at(&self, tokens: i64, now: DateTime<Utc>) -> BudgetSnapshot {
        let tokens = tokens.max(0) as u64;
        let today = day_key(now);

        let mut entry = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        if is_stale(entry.day_key, today) {
            tracing::info!(
                previous_day = %entry.day_key,
                used_tokens = entry.used_tokens,
                "Token budget rolled over"
            );
            *entry = LedgerEntry {
                day_key: today,
                used_tokens: 0,
            };
        }
        entry.used_tokens = entry.used_tokens.saturating_add(tokens);
        let used = entry.used_tokens;
        drop(entry);

        let snapshot = self.snapshot(used, now);
        if !snapshot.available {
            tracing::warn!(
                used_tokens = snapshot.used_tokens,
                token_budget = snapshot.token_budget,
                "Daily token budget exhausted"
            );
        }
        snapshot
    }

    fn snapshot(&self, used_tokens: u64, now: DateTime<Utc>) -> BudgetSnapshot {
        let remaining_tokens = self.token_budget.saturating_sub(used_tokens);
        BudgetSnapshot {
            available: remaining_tokens > 0,
            used_tokens,
            token_budget: self.token_budget,
            remaining_tokens,
            reset_at: next_utc_midnight(now),
        }
    }
}

impl Default for BudgetLedger {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_TOKEN_BUDGET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn fresh_ledger_is_available() {
        let now = at(2026, 3, 10, 9, 0);
        let ledger = BudgetLedger::starting_at(1000, now);
        let snap = ledger.inspect_at(now);
        assert!(snap.available);
        assert_eq!(snap.used_tokens, 0);
        assert_eq!(snap.remaining_tokens, 1000);
        assert_eq!(snap.reset_at, at(2026, 3, 11, 0, 0));
    }

    #[test]
    fn budget_is_at_least_one() {
        let ledger = BudgetLedger::new(0);
        assert_eq!(ledger.token_budget(), 1);
    }

    #[test]
    fn negative_consumption_counts_as_zero() {
        let now = at(2026, 3, 10, 9, 0);
        let ledger = BudgetLedger::starting_at(1000, now);
        ledger.consume_at(100, now);
        let after_negative = ledger.consume_at(-50, now);
        let after_zero = ledger.consume_at(0, now);
        assert_eq!(after_negative, after_zero);
        assert_eq!(after_zero.used_tokens, 100);
    }

    #[test]
    fn usage_is_monotone_within_a_day() {
        let now = at(2026, 3, 10, 9, 0);
        let ledger = BudgetLedger::starting_at(10_000, now);
        let mut last = 0;
        for tokens in [10, -3, 0, 250, 7] {
            let snap = ledger.consume_at(tokens, now);
            assert!(snap.used_tokens >= last);
            last = snap.used_tokens;
        }
        assert_eq!(last, 267);
    }

    #[test]
    fn exhausting_budget_marks_unavailable() {
        let now = at(2026, 3, 10, 9, 0);
        let ledger = BudgetLedger::starting_at(500, now);
        let snap = ledger.consume_at(600, now);
        assert!(!snap.available);
        assert_eq!(snap.remaining_tokens, 0);
        assert_eq!(snap.used_tokens, 600);
    }

    #[test]
    fn day_boundary_resets_usage() {
        let late = at(2026, 3, 10, 23, 59);
        let ledger = BudgetLedger::starting_at(500, late);
        ledger.consume_at(500, late);
        assert!(!ledger.inspect_at(late).available);

        let next_day = at(2026, 3, 11, 0, 1);
        let snap = ledger.inspect_at(next_day);
        assert!(snap.available);
        assert_eq!(snap.used_tokens, 0);
        assert_eq!(snap.reset_at, at(2026, 3, 12, 0, 0));

        let snap = ledger.consume_at(20, next_day);
        assert_eq!(snap.used_tokens, 20);
    }

    #[test]
    fn inspect_does_not_roll_over() {
        let day_one = at(2026, 3, 10, 12, 0);
        let ledger = BudgetLedger::starting_at(500, day_one);
        ledger.consume_at(300, day_one);

        // Reading tomorrow reports zero but leaves today's entry in place.
        ledger.inspect_at(at(2026, 3, 11, 1, 0));
        assert_eq!(ledger.inspect_at(day_one).used_tokens, 300);
    }

    #[test]
    fn staleness_is_day_inequality() {
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        assert!(!is_stale(d1, d1));
        assert!(is_stale(d1, d2));
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let now = at(2026, 3, 10, 9, 0);
        let ledger = BudgetLedger::starting_at(1000, now);
        let json = serde_json::to_value(ledger.inspect_at(now)).unwrap();
        assert_eq!(json["remainingTokens"], 1000);
        assert!(json.get("resetAt").is_some());
    }
}
