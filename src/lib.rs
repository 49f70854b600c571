//! accounts-api Library
//!
//! Read-only account and transaction API scoped by ownership: regular users
//! see their own data, staff see everything.

pub mod access;
pub mod aggregate;
pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod pagination;
pub mod query;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
