//! Ledger store
//!
//! Read access to accounts and transactions. Every request works against a
//! [`LedgerSnapshot`] so that list rows and their aggregates come from one
//! consistent view of the data.

mod memory;
mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::aggregate::{RollingAggregate, RollingWindow};
use crate::domain::{Account, AccountId, AccountRow, Transaction, TransactionId};
use crate::pagination::{PageWindow, Position, Positioned};
use crate::query::{AccountPredicate, TransactionPredicate};

pub use memory::{MemoryLedgerStore, NewTransaction};
pub use postgres::PgLedgerStore;

/// Source of per-request snapshots
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a read-consistent view for one request
    async fn snapshot(&self) -> Result<Box<dyn LedgerSnapshot>, StoreError>;
}

/// Read-consistent view of the ledger
#[async_trait]
pub trait LedgerSnapshot: Send {
    /// Fetch an account by id
    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Fetch a transaction by id, with its account owner
    async fn transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Accounts matching `predicate`, annotated with their latest
    /// transaction timestamp and fetched according to `window`
    async fn account_page(
        &mut self,
        predicate: &AccountPredicate,
        window: &PageWindow,
    ) -> Result<Vec<AccountRow>, StoreError>;

    /// Transactions matching `predicate`, fetched according to `window`
    async fn transaction_page(
        &mut self,
        predicate: &TransactionPredicate,
        window: &PageWindow,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Rolling aggregates for a set of accounts, computed in one pass.
    ///
    /// Every requested account is present in the result.
    async fn rolling_aggregates(
        &mut self,
        accounts: &[AccountId],
        window: &RollingWindow,
    ) -> Result<HashMap<AccountId, RollingAggregate>, StoreError>;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Account not found: {0}")]
    UnknownAccount(AccountId),
}

impl Positioned for Transaction {
    fn position(&self) -> Position {
        Position {
            timestamp: self.timestamp,
            id: self.id,
        }
    }
}

impl Positioned for AccountRow {
    fn position(&self) -> Position {
        Position {
            timestamp: self.latest_transaction_at,
            id: self.account.id,
        }
    }
}
