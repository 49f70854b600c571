//! Account read model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::RollingAggregate;

use super::principal::{Owned, UserId};

/// Account identity
pub type AccountId = i64;

/// An account owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
}

impl Owned for Account {
    const RESOURCE: &'static str = "account";

    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// Account annotated with its ordering key for list pages.
///
/// `latest_transaction_at` is the newest transaction timestamp, or the Unix
/// epoch for an account without transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub account: Account,
    pub latest_transaction_at: DateTime<Utc>,
}

/// Account with derived rolling metrics, computed at read time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub account: Account,
    pub last_thirty_days: RollingAggregate,
}
