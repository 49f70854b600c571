//! Store-neutral predicates
//!
//! Plain values describing "AND of: owner scope, optional account id,
//! optional category, optional timestamp range". Each store translates them
//! into its own query mechanism.

use chrono::{DateTime, Utc};

use crate::access::OwnerScope;
use crate::domain::{Account, AccountId, Transaction};

use super::filter::TransactionFilter;

/// Half-open timestamp range `[from, until)`; missing ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampRange {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimestampRange {
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| timestamp >= from)
            && self.until.map_or(true, |until| timestamp < until)
    }
}

/// Predicate over accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountPredicate {
    pub scope: OwnerScope,
}

impl AccountPredicate {
    pub fn new(scope: OwnerScope) -> Self {
        Self { scope }
    }

    pub fn matches(&self, account: &Account) -> bool {
        self.scope.admits(account.user_id)
    }
}

/// Predicate over transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPredicate {
    pub scope: OwnerScope,
    pub account_id: Option<AccountId>,
    pub category: Option<String>,
    pub range: TimestampRange,
}

impl TransactionPredicate {
    /// Start from the owner scope alone
    pub fn new(scope: OwnerScope) -> Self {
        Self {
            scope,
            account_id: None,
            category: None,
            range: TimestampRange::default(),
        }
    }

    /// Narrow by a parsed filter.
    ///
    /// An account narrowing must already have passed the ownership check.
    pub fn narrowed_by(mut self, filter: &TransactionFilter) -> Self {
        self.account_id = filter.account_id;
        self.category = filter.category.clone();
        self.range = filter.timestamp_range();
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.scope.admits(tx.owner_id)
            && self.account_id.map_or(true, |id| tx.account_id == id)
            && self.category.as_deref().map_or(true, |c| tx.category == c)
            && self.range.contains(tx.timestamp)
    }
}
