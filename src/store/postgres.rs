//! PostgreSQL ledger store
//!
//! Each snapshot is a `REPEATABLE READ, READ ONLY` transaction, so every
//! query of a request sees the same data. Predicates are rendered with
//! `sqlx::QueryBuilder` and always bound, never interpolated.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction as DbTransaction};

use crate::access::OwnerScope;
use crate::aggregate::{RollingAggregate, RollingWindow};
use crate::domain::{Account, AccountId, AccountRow, Transaction, TransactionId, UserId};
use crate::pagination::{PageWindow, SortOrder};
use crate::query::{AccountPredicate, TransactionPredicate};

use super::{LedgerSnapshot, LedgerStore, StoreError};

type TransactionTuple = (
    TransactionId,
    AccountId,
    UserId,
    DateTime<Utc>,
    Decimal,
    String,
    String,
);

const TRANSACTION_COLUMNS: &str = r#"
    SELECT t.id, t.account_id, a.user_id, t."timestamp", t.amount, t.description, t.transaction_category
    FROM transactions t
    JOIN accounts a ON a.id = t.account_id
"#;

/// Ledger store backed by Postgres
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn snapshot(&self) -> Result<Box<dyn LedgerSnapshot>, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgSnapshot { tx }))
    }
}

/// Open read-only transaction; rolled back on drop
struct PgSnapshot {
    tx: DbTransaction<'static, Postgres>,
}

fn into_transaction(row: TransactionTuple) -> Transaction {
    let (id, account_id, owner_id, timestamp, amount, description, category) = row;
    Transaction {
        id,
        account_id,
        owner_id,
        timestamp,
        amount,
        description,
        category,
    }
}

/// Append `AND (<ts>, <id>) <op> (cursor)` and the ORDER BY / LIMIT of a window
fn push_window(
    builder: &mut QueryBuilder<'_, Postgres>,
    window: &PageWindow,
    timestamp_column: &str,
    id_column: &str,
) {
    let (comparison, direction) = match window.scan {
        SortOrder::Descending => ("<", "DESC"),
        SortOrder::Ascending => (">", "ASC"),
    };

    if let Some(after) = window.after {
        builder
            .push(format!(" AND ({}, {}) {} (", timestamp_column, id_column, comparison))
            .push_bind(after.timestamp)
            .push(", ")
            .push_bind(after.id)
            .push(")");
    }

    builder
        .push(format!(
            " ORDER BY {ts} {dir}, {id} {dir} LIMIT ",
            ts = timestamp_column,
            id = id_column,
            dir = direction
        ))
        .push_bind(window.limit as i64);
}

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &OwnerScope, column: &str) {
    if let OwnerScope::OwnedBy(user_id) = scope {
        builder
            .push(format!(" AND {} = ", column))
            .push_bind(*user_id);
    }
}

#[async_trait]
impl LedgerSnapshot for PgSnapshot {
    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row: Option<(AccountId, UserId, String)> =
            sqlx::query_as("SELECT id, user_id, name FROM accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(row.map(|(id, user_id, name)| Account { id, user_id, name }))
    }

    async fn transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(TRANSACTION_COLUMNS);
        builder.push(" WHERE t.id = ").push_bind(id);

        let row = builder
            .build_query_as::<TransactionTuple>()
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(into_transaction))
    }

    async fn account_page(
        &mut self,
        predicate: &AccountPredicate,
        window: &PageWindow,
    ) -> Result<Vec<AccountRow>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, user_id, name, latest_transaction_at FROM (
                SELECT a.id, a.user_id, a.name,
                       COALESCE(MAX(t."timestamp"), TIMESTAMPTZ '1970-01-01 00:00:00+00') AS latest_transaction_at
                FROM accounts a
                LEFT JOIN transactions t ON t.account_id = a.id
                WHERE TRUE
            "#,
        );
        push_scope(&mut builder, &predicate.scope, "a.user_id");
        builder.push(" GROUP BY a.id, a.user_id, a.name ) annotated WHERE TRUE");
        push_window(&mut builder, window, "latest_transaction_at", "id");

        let rows = builder
            .build_query_as::<(AccountId, UserId, String, DateTime<Utc>)>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, name, latest_transaction_at)| AccountRow {
                account: Account { id, user_id, name },
                latest_transaction_at,
            })
            .collect())
    }

    async fn transaction_page(
        &mut self,
        predicate: &TransactionPredicate,
        window: &PageWindow,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(TRANSACTION_COLUMNS);
        builder.push(" WHERE TRUE");

        push_scope(&mut builder, &predicate.scope, "a.user_id");
        if let Some(account_id) = predicate.account_id {
            builder.push(" AND t.account_id = ").push_bind(account_id);
        }
        if let Some(category) = &predicate.category {
            builder
                .push(" AND t.transaction_category = ")
                .push_bind(category.clone());
        }
        if let Some(from) = predicate.range.from {
            builder.push(r#" AND t."timestamp" >= "#).push_bind(from);
        }
        if let Some(until) = predicate.range.until {
            builder.push(r#" AND t."timestamp" < "#).push_bind(until);
        }
        push_window(&mut builder, window, r#"t."timestamp""#, "t.id");

        let rows = builder
            .build_query_as::<TransactionTuple>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(into_transaction).collect())
    }

    async fn rolling_aggregates(
        &mut self,
        accounts: &[AccountId],
        window: &RollingWindow,
    ) -> Result<HashMap<AccountId, RollingAggregate>, StoreError> {
        let mut out: HashMap<AccountId, RollingAggregate> = accounts
            .iter()
            .map(|id| (*id, RollingAggregate::default()))
            .collect();

        if accounts.is_empty() {
            return Ok(out);
        }

        let rows: Vec<(AccountId, i64, Decimal)> = sqlx::query_as(
            r#"
            SELECT account_id, COUNT(*)::BIGINT, COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE account_id = ANY($1)
              AND "timestamp" >= $2
              AND "timestamp" <= $3
            GROUP BY account_id
            "#,
        )
        .bind(accounts)
        .bind(window.since)
        .bind(window.until)
        .fetch_all(&mut *self.tx)
        .await?;

        for (account_id, count, sum) in rows {
            out.insert(account_id, RollingAggregate::new(count, sum));
        }

        Ok(out)
    }
}
