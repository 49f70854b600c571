//! Query module
//!
//! Turns request parameters into validated filters and store-neutral
//! predicates.

mod filter;
mod predicate;

pub use filter::{FilterError, TransactionFilter, TransactionQueryParams};
pub use predicate::{AccountPredicate, TimestampRange, TransactionPredicate};
