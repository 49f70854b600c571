//! Query service
//!
//! Composes scoping, filtering, authorization, pagination and aggregation
//! into the four read operations exposed over HTTP. Stateless between
//! requests; every call opens its own store snapshot.

mod accounts;
mod transactions;

use std::sync::Arc;

use crate::clock::Clock;
use crate::pagination::Paginator;
use crate::store::LedgerStore;

/// Read-side service for accounts and transactions
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn LedgerStore>,
    paginator: Paginator,
    clock: Arc<dyn Clock>,
}

impl QueryService {
    pub fn new(store: Arc<dyn LedgerStore>, paginator: Paginator, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            paginator,
            clock,
        }
    }
}

/// Treat an empty `cursor` parameter as absent
fn cursor_param(cursor: Option<&str>) -> Option<&str> {
    cursor.map(str::trim).filter(|c| !c.is_empty())
}
