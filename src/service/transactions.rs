//! Transaction queries

use crate::access::{authorize, OwnerScope};
use crate::domain::{AccountId, Principal, Transaction, TransactionId};
use crate::error::{AppError, AppResult};
use crate::pagination::{Page, SortOrder};
use crate::query::{FilterError, TransactionFilter, TransactionPredicate, TransactionQueryParams};
use crate::store::LedgerSnapshot;

use super::{cursor_param, QueryService};

/// Only ordering field clients may choose
const ORDERING_FIELD: &str = "timestamp";

impl QueryService {
    /// List visible transactions matching the request filters.
    ///
    /// Parameters are validated before the store is touched. An `account`
    /// narrowing is authorized before any transaction row is read.
    pub async fn list_transactions(
        &self,
        principal: &Principal,
        params: &TransactionQueryParams,
    ) -> AppResult<Page<Transaction>> {
        tracing::info!(principal = principal.id, "Principal is requesting transaction list");

        let filter = TransactionFilter::parse(params)?;
        let order = SortOrder::from_param(params.ordering.as_deref(), ORDERING_FIELD);
        let window = self
            .paginator
            .window(order, cursor_param(params.cursor.as_deref()))?;

        let scope = OwnerScope::for_principal(principal);
        if !principal.is_privileged {
            tracing::info!(principal = principal.id, "Principal is accessing their own transactions");
        }

        let mut snapshot = self.store.snapshot().await?;

        if let Some(account_id) = filter.account_id {
            tracing::info!(
                principal = principal.id,
                account_id,
                "Principal is requesting transactions for account"
            );
            authorize_account_narrowing(snapshot.as_mut(), principal, account_id).await?;
        }

        let predicate = TransactionPredicate::new(scope).narrowed_by(&filter);
        let rows = snapshot.transaction_page(&predicate, &window).await?;
        let page = self.paginator.finish(&window, rows);

        tracing::info!(
            principal = principal.id,
            count = page.items.len(),
            "Principal retrieved transactions"
        );

        Ok(page)
    }

    /// Fetch one transaction
    pub async fn retrieve_transaction(
        &self,
        principal: &Principal,
        transaction_id: TransactionId,
    ) -> AppResult<Transaction> {
        let mut snapshot = self.store.snapshot().await?;

        let transaction = snapshot
            .transaction(transaction_id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(transaction_id.to_string()))?;

        if let Err(err) = authorize(principal, &transaction).require() {
            tracing::warn!(
                principal = principal.id,
                transaction_id,
                "Principal tried to retrieve a transaction they do not own"
            );
            return Err(err);
        }

        tracing::info!(
            principal = principal.id,
            transaction_id,
            "Principal retrieved transaction '{}'",
            transaction.description
        );

        Ok(transaction)
    }
}

/// Check an explicit `account` narrowing against the principal.
///
/// A non-privileged principal gets the same forbidden answer for a foreign
/// account and for a missing one.
async fn authorize_account_narrowing(
    snapshot: &mut dyn LedgerSnapshot,
    principal: &Principal,
    account_id: AccountId,
) -> AppResult<()> {
    let allowed = match snapshot.account(account_id).await? {
        Some(account) => authorize(principal, &account).is_allowed(),
        None if principal.is_privileged => {
            return Err(FilterError::UnknownAccount(account_id).into());
        }
        None => false,
    };

    if allowed {
        return Ok(());
    }

    tracing::warn!(
        principal = principal.id,
        account_id,
        "Principal tried to access transactions for account without permission"
    );
    Err(AppError::Forbidden(
        "You do not have permission to access transactions for this account.".to_string(),
    ))
}
