//! Transaction read model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::principal::{Owned, UserId};

/// Transaction identity
pub type TransactionId = i64;

/// A signed movement on one account.
///
/// `owner_id` is the owner of the parent account, loaded together with the
/// row so ownership never needs a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub owner_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub description: String,
    /// Open-ended label such as `PURCHASE` or `SALE`
    pub category: String,
}

impl Owned for Transaction {
    const RESOURCE: &'static str = "transaction";

    fn owner(&self) -> UserId {
        self.owner_id
    }
}
