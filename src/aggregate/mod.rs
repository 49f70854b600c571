//! Rolling aggregates
//!
//! Per-account metrics over a trailing window, always recomputed from the
//! live transaction set at read time.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::{format_cents, AccountId, Transaction};

/// Length of the window reported on every account
pub const THIRTY_DAYS: i64 = 30;

/// Closed time window `[since, until]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl RollingWindow {
    /// Window ending at `now` and reaching `days` back
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            since: now - Duration::days(days),
            until: now,
        }
    }

    /// The thirty-day window used for account summaries
    pub fn last_thirty_days(now: DateTime<Utc>) -> Self {
        Self::trailing_days(now, THIRTY_DAYS)
    }

    /// Whether `timestamp` falls inside the window (both ends inclusive)
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.since && timestamp <= self.until
    }
}

/// Transaction count and signed balance change over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollingAggregate {
    pub transaction_count: i64,
    pub balance_change: Decimal,
}

impl RollingAggregate {
    pub fn new(transaction_count: i64, balance_change: Decimal) -> Self {
        Self {
            transaction_count,
            balance_change,
        }
    }

    /// Fold one transaction amount in
    pub fn record(&mut self, amount: Decimal) {
        self.transaction_count += 1;
        self.balance_change += amount;
    }

    /// Balance change rounded to cents, e.g. `-1304.67`
    pub fn balance_change_display(&self) -> String {
        format_cents(self.balance_change)
    }
}

/// Group transactions by account and aggregate those inside `window`.
///
/// Accounts in `accounts` with nothing in the window get a zero aggregate;
/// transactions of other accounts are ignored.
pub fn summarize<'a, I>(
    accounts: &[AccountId],
    window: &RollingWindow,
    transactions: I,
) -> HashMap<AccountId, RollingAggregate>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut out: HashMap<AccountId, RollingAggregate> = accounts
        .iter()
        .map(|id| (*id, RollingAggregate::default()))
        .collect();

    for tx in transactions {
        if !window.contains(tx.timestamp) {
            continue;
        }
        if let Some(aggregate) = out.get_mut(&tx.account_id) {
            aggregate.record(tx.amount);
        }
    }

    out
}
