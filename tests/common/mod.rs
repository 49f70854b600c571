//! Common test utilities
#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgConnection, PgPool};
use tower::util::ServiceExt;
use uuid::Uuid;

use accounts_api::api::{self, AppState};
use accounts_api::clock::FixedClock;
use accounts_api::domain::{AccountId, Principal, UserId};
use accounts_api::pagination::{CursorCodec, Paginator, PAGE_SIZE};
use accounts_api::service::QueryService;
use accounts_api::store::{LedgerStore, MemoryLedgerStore, NewTransaction, PgLedgerStore};

pub const ADMIN: i64 = 1;
pub const USER1: i64 = 2;
pub const USER2: i64 = 3;

pub const JOHN_SMITH: AccountId = 1;
pub const JOHN_SAVINGS: AccountId = 2;
pub const JANE_DOE: AccountId = 3;

/// Transactions visible to USER1 in the fixture
pub const USER1_TRANSACTIONS: usize = 124 + 17;

/// Transactions in the whole fixture
pub const ALL_TRANSACTIONS: usize = USER1_TRANSACTIONS + 12;

/// Instant every request is evaluated at
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 6, 14, 18, 0, 0).unwrap()
}

pub fn admin() -> Principal {
    Principal::staff(ADMIN)
}

pub fn user1() -> Principal {
    Principal::user(USER1)
}

pub fn user2() -> Principal {
    Principal::user(USER2)
}

pub fn new_tx(
    account_id: AccountId,
    timestamp: DateTime<Utc>,
    amount: Decimal,
    description: &str,
    category: &str,
) -> NewTransaction {
    NewTransaction {
        account_id,
        timestamp,
        amount,
        description: description.to_string(),
        category: category.to_string(),
    }
}

/// Sample ledger rows, in insertion (and therefore id) order.
///
/// "John Smith" holds 119 transactions in the thirty days before `now()`
/// summing to -1304.67, plus 5 older ones.
pub struct Fixture {
    pub accounts: Vec<(UserId, &'static str)>,
    pub transactions: Vec<NewTransaction>,
}

pub fn fixture() -> Fixture {
    let accounts = vec![
        (USER1, "John Smith"),
        (USER1, "John Smith Savings"),
        (USER2, "Jane Doe"),
    ];
    let mut transactions = Vec::new();

    for i in 1..=118 {
        let category = if i % 2 == 0 { "PURCHASE" } else { "SALE" };
        transactions.push(new_tx(
            JOHN_SMITH,
            now() - Duration::hours(6 * i),
            dec!(-11.00),
            &format!("Card payment {}", i),
            category,
        ));
    }
    transactions.push(new_tx(
        JOHN_SMITH,
        now() - Duration::minutes(30),
        dec!(-6.67),
        "Coffee",
        "PURCHASE",
    ));
    for k in 0..5 {
        transactions.push(new_tx(
            JOHN_SMITH,
            now() - Duration::days(31 + k),
            dec!(50.00),
            "Old refund",
            "SALE",
        ));
    }

    let january = Utc.with_ymd_and_hms(2023, 1, 1, 15, 30, 0).unwrap();
    for k in 0..15 {
        transactions.push(new_tx(
            JOHN_SAVINGS,
            january + Duration::days(k),
            dec!(25.50),
            "Transfer in",
            "SALE",
        ));
    }
    transactions.push(new_tx(
        JOHN_SAVINGS,
        Utc.with_ymd_and_hms(2023, 1, 31, 20, 0, 0).unwrap(),
        dec!(-5.00),
        "Fee",
        "PURCHASE",
    ));
    transactions.push(new_tx(
        JOHN_SAVINGS,
        Utc.with_ymd_and_hms(2023, 2, 1, 9, 0, 0).unwrap(),
        dec!(-5.00),
        "Fee",
        "PURCHASE",
    ));

    let same_instant = Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap();
    for k in 0..12 {
        transactions.push(new_tx(
            JANE_DOE,
            same_instant,
            dec!(10.00),
            &format!("Batch item {}", k),
            "PURCHASE",
        ));
    }

    Fixture {
        accounts,
        transactions,
    }
}

/// In-memory store holding the sample ledger
pub async fn seeded_store() -> MemoryLedgerStore {
    let store = MemoryLedgerStore::new();
    let fixture = fixture();

    for (user_id, name) in fixture.accounts {
        store.add_account(user_id, name).await;
    }
    for tx in fixture.transactions {
        store.add_transaction(tx).await.unwrap();
    }

    store
}

/// Router over `store` with the clock frozen at `now()`
pub fn app(store: MemoryLedgerStore) -> Router {
    app_over(Arc::new(store))
}

/// Router over any ledger store with the clock frozen at `now()`
pub fn app_over(store: Arc<dyn LedgerStore>) -> Router {
    let service = QueryService::new(
        store,
        Paginator::new(CursorCodec::new("test-secret").unwrap(), PAGE_SIZE),
        Arc::new(FixedClock(now())),
    );
    api::build_router(AppState::new(service))
}

// =========================================================================
// Postgres
// =========================================================================

const INITIAL_SCHEMA: &str = include_str!("../../migrations/001_initial_schema.sql");

/// Sample ledger loaded into a schema of its own
pub struct TestDb {
    pub pool: PgPool,
    schema: String,
}

impl TestDb {
    pub fn store(&self) -> PgLedgerStore {
        PgLedgerStore::new(self.pool.clone())
    }

    pub async fn teardown(self) {
        sqlx::Executor::execute(&self.pool, format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await
            .expect("Failed to drop test schema");
        self.pool.close().await;
    }
}

/// Setup test database - fresh schema, migration applied, sample ledger seeded.
///
/// Returns `None` when `DATABASE_URL` is not set so the suite still runs
/// without a database.
pub async fn setup_test_db() -> Option<TestDb> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    // Tests run concurrently, so each one gets its own schema
    let schema = format!("accounts_api_test_{}", Uuid::new_v4().simple());
    let options = PgConnectOptions::from_str(&database_url)
        .expect("Invalid DATABASE_URL")
        .options([("search_path", schema.as_str())]);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to connect to DB");

    sqlx::Executor::execute(&pool, format!("CREATE SCHEMA {}", schema).as_str())
        .await
        .expect("Failed to create test schema");
    sqlx::Executor::execute(&pool, INITIAL_SCHEMA)
        .await
        .expect("Failed to apply migration");

    seed_postgres(&pool).await;

    Some(TestDb { pool, schema })
}

async fn seed_postgres(pool: &PgPool) {
    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    for (id, username) in [(ADMIN, "admin"), (USER1, "user1"), (USER2, "user2")] {
        sqlx::query("INSERT INTO users (id, username, is_staff) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(username)
            .bind(id == ADMIN)
            .execute(&mut *tx)
            .await
            .expect("Failed to seed user");
    }

    let fixture = fixture();
    for (id, (user_id, name)) in (1..).zip(fixture.accounts) {
        insert_account(&mut tx, id, user_id, name).await;
    }
    for (id, t) in (1..).zip(fixture.transactions) {
        insert_transaction(&mut tx, id, &t).await;
    }

    tx.commit().await.expect("Failed to commit seed data");
}

pub async fn insert_account(conn: &mut PgConnection, id: AccountId, user_id: UserId, name: &str) {
    sqlx::query("INSERT INTO accounts (id, user_id, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(user_id)
        .bind(name)
        .execute(conn)
        .await
        .expect("Failed to seed account");
}

pub async fn insert_transaction(conn: &mut PgConnection, id: i64, t: &NewTransaction) {
    sqlx::query(
        r#"
        INSERT INTO transactions (id, account_id, "timestamp", amount, description, transaction_category)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(t.account_id)
    .bind(t.timestamp)
    .bind(t.amount)
    .bind(&t.description)
    .bind(&t.category)
    .execute(conn)
    .await
    .expect("Failed to seed transaction");
}

// =========================================================================
// HTTP
// =========================================================================

/// Issue a GET as `principal` and decode the JSON body
pub async fn get(app: &Router, uri: &str, principal: Option<Principal>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(principal) = principal {
        builder = builder
            .header("X-Request-User-Id", principal.id.to_string())
            .header("X-Request-User-Staff", principal.is_privileged.to_string());
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Append a cursor to a list URI
pub fn with_cursor(uri: &str, cursor: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}cursor={}", uri, separator, cursor)
}

/// Follow `link` ("next" or "previous") from `uri` (optionally starting at
/// `start`) until it runs out, returning every page body in visiting order
pub async fn walk(
    app: &Router,
    uri: &str,
    start: Option<&str>,
    principal: Principal,
    link: &str,
) -> Vec<Value> {
    let mut pages = Vec::new();
    let mut current = match start {
        Some(cursor) => with_cursor(uri, cursor),
        None => uri.to_string(),
    };

    loop {
        let (status, body) = get(app, &current, Some(principal)).await;
        assert_eq!(status, StatusCode::OK, "page request failed: {}", current);

        let cursor = body[link].as_str().map(str::to_string);
        pages.push(body);

        match cursor {
            Some(cursor) => current = with_cursor(uri, &cursor),
            None => break,
        }
    }

    pages
}

/// `id` of every result across pages
pub fn result_ids(pages: &[Value]) -> Vec<i64> {
    pages
        .iter()
        .flat_map(|page| page["results"].as_array().cloned().unwrap_or_default())
        .map(|row| row["id"].as_i64().unwrap())
        .collect()
}
