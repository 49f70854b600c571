//! Domain module
//!
//! Core read-model types: accounts, transactions and the principals that view them.

pub mod account;
pub mod money;
pub mod principal;
pub mod transaction;

pub use account::{Account, AccountId, AccountRow, AccountSummary};
pub use money::{format_cents, round_to_cents};
pub use principal::{Owned, Principal, UserId};
pub use transaction::{Transaction, TransactionId};
