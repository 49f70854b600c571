//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{format_cents, AccountId, AccountSummary, Principal, Transaction, TransactionId, UserId};
use crate::error::AppError;
use crate::pagination::Page;
use crate::query::TransactionQueryParams;

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AccountListQuery {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub user: UserId,
    pub name: String,
    pub transaction_count_last_thirty_days: i64,
    pub balance_change_last_thirty_days: String,
}

impl From<AccountSummary> for AccountResponse {
    fn from(summary: AccountSummary) -> Self {
        Self {
            id: summary.account.id,
            user: summary.account.user_id,
            name: summary.account.name,
            transaction_count_last_thirty_days: summary.last_thirty_days.transaction_count,
            balance_change_last_thirty_days: summary.last_thirty_days.balance_change_display(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub account: AccountId,
    pub timestamp: DateTime<Utc>,
    pub amount: String,
    pub description: String,
    pub transaction_category: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            account: tx.account_id,
            timestamp: tx.timestamp,
            amount: format_cents(tx.amount),
            description: tx.description,
            transaction_category: tx.category,
        }
    }
}

/// Paginated list body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub results: Vec<T>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl<T> PageResponse<T> {
    fn from_page<S>(page: Page<S>) -> Self
    where
        T: From<S>,
    {
        let page = page.map(T::from);
        Self {
            results: page.items,
            next: page.next,
            previous: page.previous,
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/accounts/", get(list_accounts))
        .route("/accounts", get(list_accounts))
        .route("/accounts/:account_id/", get(get_account))
        .route("/accounts/:account_id", get(get_account))
        .route("/transactions/", get(list_transactions))
        .route("/transactions", get(list_transactions))
        .route("/transactions/:transaction_id/", get(get_transaction))
        .route("/transactions/:transaction_id", get(get_transaction))
}

/// Path ids that are not integers name nothing that exists
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

// =========================================================================
// GET /accounts/
// =========================================================================

/// List accounts visible to the principal
async fn list_accounts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AccountListQuery>,
) -> Result<Json<PageResponse<AccountResponse>>, AppError> {
    let page = state
        .service
        .list_accounts(&principal, query.cursor.as_deref())
        .await?;

    Ok(Json(PageResponse::from_page(page)))
}

// =========================================================================
// GET /accounts/:account_id/
// =========================================================================

/// Get one account
async fn get_account(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let id = parse_id(&account_id).ok_or(AppError::AccountNotFound(account_id))?;

    let summary = state.service.retrieve_account(&principal, id).await?;

    Ok(Json(summary.into()))
}

// =========================================================================
// GET /transactions/
// =========================================================================

/// List transactions visible to the principal, filtered
async fn list_transactions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<TransactionQueryParams>,
) -> Result<Json<PageResponse<TransactionResponse>>, AppError> {
    let page = state.service.list_transactions(&principal, &query).await?;

    Ok(Json(PageResponse::from_page(page)))
}

// =========================================================================
// GET /transactions/:transaction_id/
// =========================================================================

/// Get one transaction
async fn get_transaction(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionResponse>, AppError> {
    let id = parse_id(&transaction_id).ok_or(AppError::TransactionNotFound(transaction_id))?;

    let transaction = state.service.retrieve_transaction(&principal, id).await?;

    Ok(Json(transaction.into()))
}
