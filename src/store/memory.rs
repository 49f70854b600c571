//! In-memory ledger store
//!
//! Holds accounts and transactions in ordered maps. A snapshot is a clone of
//! the tables taken under the read lock, so a request never observes writes
//! made after it started.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::aggregate::{summarize, RollingAggregate, RollingWindow};
use crate::domain::{Account, AccountId, AccountRow, Transaction, TransactionId, UserId};
use crate::pagination::{PageWindow, Positioned};
use crate::query::{AccountPredicate, TransactionPredicate};

use super::{LedgerSnapshot, LedgerStore, StoreError};

/// Transaction to insert; the id is assigned by the store
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
}

/// Stored transaction row, without the derived owner
#[derive(Debug, Clone)]
struct TransactionRecord {
    id: TransactionId,
    account_id: AccountId,
    timestamp: DateTime<Utc>,
    amount: Decimal,
    description: String,
    category: String,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    transactions: BTreeMap<TransactionId, TransactionRecord>,
}

impl Tables {
    /// Join a record with its account owner
    fn hydrate(&self, record: &TransactionRecord) -> Option<Transaction> {
        let account = self.accounts.get(&record.account_id)?;
        Some(Transaction {
            id: record.id,
            account_id: record.account_id,
            owner_id: account.user_id,
            timestamp: record.timestamp,
            amount: record.amount,
            description: record.description.clone(),
            category: record.category.clone(),
        })
    }

    fn transactions(&self) -> impl Iterator<Item = Transaction> + '_ {
        self.transactions.values().filter_map(|r| self.hydrate(r))
    }
}

/// Ledger store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account with the next free id
    pub async fn add_account(&self, user_id: UserId, name: impl Into<String>) -> Account {
        let mut tables = self.tables.write().await;
        let id = tables.accounts.keys().next_back().map_or(1, |last| last + 1);
        let account = Account {
            id,
            user_id,
            name: name.into(),
        };
        tables.accounts.insert(id, account.clone());
        account
    }

    /// Insert a transaction with the next free id
    pub async fn add_transaction(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&new.account_id) {
            return Err(StoreError::UnknownAccount(new.account_id));
        }

        let id = tables.transactions.keys().next_back().map_or(1, |last| last + 1);
        let record = TransactionRecord {
            id,
            account_id: new.account_id,
            timestamp: new.timestamp,
            amount: new.amount,
            description: new.description,
            category: new.category,
        };
        let transaction = tables
            .hydrate(&record)
            .ok_or(StoreError::UnknownAccount(record.account_id))?;
        tables.transactions.insert(id, record);
        Ok(transaction)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn snapshot(&self) -> Result<Box<dyn LedgerSnapshot>, StoreError> {
        let tables = self.tables.read().await.clone();
        Ok(Box::new(MemorySnapshot { tables }))
    }
}

/// Frozen copy of the tables
struct MemorySnapshot {
    tables: Tables,
}

impl MemorySnapshot {
    fn latest_transaction_at(&self, account_id: AccountId) -> DateTime<Utc> {
        self.tables
            .transactions
            .values()
            .filter(|r| r.account_id == account_id)
            .map(|r| r.timestamp)
            .max()
            .unwrap_or_else(epoch)
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

/// Apply a page window to rows already filtered by predicate
fn seek<T: Positioned>(mut rows: Vec<T>, window: &PageWindow) -> Vec<T> {
    if let Some(after) = window.after {
        rows.retain(|row| window.scan.is_beyond(&row.position(), &after));
    }
    rows.sort_by(|a, b| window.scan.compare(&a.position(), &b.position()));
    rows.truncate(window.limit);
    rows
}

#[async_trait]
impl LedgerSnapshot for MemorySnapshot {
    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.accounts.get(&id).cloned())
    }

    async fn transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .tables
            .transactions
            .get(&id)
            .and_then(|record| self.tables.hydrate(record)))
    }

    async fn account_page(
        &mut self,
        predicate: &AccountPredicate,
        window: &PageWindow,
    ) -> Result<Vec<AccountRow>, StoreError> {
        let rows: Vec<AccountRow> = self
            .tables
            .accounts
            .values()
            .filter(|account| predicate.matches(account))
            .map(|account| AccountRow {
                account: account.clone(),
                latest_transaction_at: self.latest_transaction_at(account.id),
            })
            .collect();

        Ok(seek(rows, window))
    }

    async fn transaction_page(
        &mut self,
        predicate: &TransactionPredicate,
        window: &PageWindow,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows: Vec<Transaction> = self
            .tables
            .transactions()
            .filter(|tx| predicate.matches(tx))
            .collect();

        Ok(seek(rows, window))
    }

    async fn rolling_aggregates(
        &mut self,
        accounts: &[AccountId],
        window: &RollingWindow,
    ) -> Result<HashMap<AccountId, RollingAggregate>, StoreError> {
        let transactions: Vec<Transaction> = self.tables.transactions().collect();
        Ok(summarize(accounts, window, &transactions))
    }
}
