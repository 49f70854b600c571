//! Account queries

use crate::access::{authorize, OwnerScope};
use crate::aggregate::RollingWindow;
use crate::domain::{AccountId, AccountSummary, Principal};
use crate::error::{AppError, AppResult};
use crate::pagination::{Page, SortOrder};
use crate::query::AccountPredicate;

use super::{cursor_param, QueryService};

impl QueryService {
    /// List visible accounts, newest activity first, with rolling metrics.
    ///
    /// Metrics for the whole page are loaded with one grouped query.
    pub async fn list_accounts(
        &self,
        principal: &Principal,
        cursor: Option<&str>,
    ) -> AppResult<Page<AccountSummary>> {
        tracing::info!(principal = principal.id, "Principal is requesting account list");

        let window = self
            .paginator
            .window(SortOrder::Descending, cursor_param(cursor))?;

        let scope = OwnerScope::for_principal(principal);
        if principal.is_privileged {
            tracing::info!(principal = principal.id, "Staff principal is accessing all accounts");
        } else {
            tracing::info!(principal = principal.id, "Principal is accessing their own accounts");
        }

        let now = self.clock.now();
        let mut snapshot = self.store.snapshot().await?;

        let rows = snapshot
            .account_page(&AccountPredicate::new(scope), &window)
            .await?;
        let page = self.paginator.finish(&window, rows);

        let ids: Vec<AccountId> = page.items.iter().map(|row| row.account.id).collect();
        let mut aggregates = snapshot
            .rolling_aggregates(&ids, &RollingWindow::last_thirty_days(now))
            .await?;

        let page = page.map(|row| AccountSummary {
            last_thirty_days: aggregates.remove(&row.account.id).unwrap_or_default(),
            account: row.account,
        });

        tracing::info!(
            principal = principal.id,
            count = page.items.len(),
            "Principal retrieved accounts"
        );

        Ok(page)
    }

    /// Fetch one account with its rolling metrics
    pub async fn retrieve_account(
        &self,
        principal: &Principal,
        account_id: AccountId,
    ) -> AppResult<AccountSummary> {
        let now = self.clock.now();
        let mut snapshot = self.store.snapshot().await?;

        let account = snapshot
            .account(account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;

        if let Err(err) = authorize(principal, &account).require() {
            tracing::warn!(
                principal = principal.id,
                account_id,
                "Principal tried to retrieve an account they do not own"
            );
            return Err(err);
        }

        let mut aggregates = snapshot
            .rolling_aggregates(&[account.id], &RollingWindow::last_thirty_days(now))
            .await?;

        tracing::info!(
            principal = principal.id,
            account_id,
            "Principal retrieved account '{}'",
            account.name
        );

        Ok(AccountSummary {
            last_thirty_days: aggregates.remove(&account.id).unwrap_or_default(),
            account,
        })
    }
}
