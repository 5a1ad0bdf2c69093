//! Daily spend accounting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cumulative spend against a daily budget.
///
/// `current_spend` only grows between resets; the scheduler debits it with a
/// job's actual cost on success and zeroes it at local midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLedger {
    current_spend: Decimal,
    daily_limit: Decimal,
    last_reset_at: DateTime<Utc>,
}

impl CostLedger {
    /// Create an empty ledger.
    #[must_use]
    pub const fn new(daily_limit: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            current_spend: Decimal::ZERO,
            daily_limit,
            last_reset_at: now,
        }
    }

    /// Spend recorded since the last reset.
    #[must_use]
    pub const fn current_spend(&self) -> Decimal {
        self.current_spend
    }

    /// Configured daily limit.
    #[must_use]
    pub const fn daily_limit(&self) -> Decimal {
        self.daily_limit
    }

    /// Time of the last reset (or creation).
    #[must_use]
    pub const fn last_reset_at(&self) -> DateTime<Utc> {
        self.last_reset_at
    }

    /// Budget left before the limit is reached. Never negative.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        (self.daily_limit - self.current_spend).max(Decimal::ZERO)
    }

    /// Whether `estimated` still fits: `current_spend + estimated <= daily_limit`.
    /// A sum that overflows `Decimal` never fits.
    #[must_use]
    pub fn can_afford(&self, estimated: Decimal) -> bool {
        self.current_spend
            .checked_add(estimated)
            .is_some_and(|total| total <= self.daily_limit)
    }

    /// Debit an actual cost. Negative amounts are ignored so spend never decreases.
    pub fn record(&mut self, amount: Decimal) {
        if amount.is_sign_negative() {
            tracing::warn!(%amount, "ignoring negative ledger debit");
            return;
        }
        self.current_spend = self.current_spend.saturating_add(amount);
    }

    /// Zero the spend and stamp the reset time.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        tracing::info!(spent = %self.current_spend, "resetting daily spend");
        self.current_spend = Decimal::ZERO;
        self.last_reset_at = now;
    }
}
