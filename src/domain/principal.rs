//! Principal
//!
//! The authenticated caller and the ownership capability shared by every
//! resource it can read.

use serde::{Deserialize, Serialize};

/// Identity of a user as stored in `accounts.user_id`
pub type UserId = i64;

/// Authenticated caller of a request.
///
/// Supplied per request by the upstream gateway; never persisted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub is_privileged: bool,
}

impl Principal {
    /// Regular user who may only see their own data
    pub fn user(id: UserId) -> Self {
        Self {
            id,
            is_privileged: false,
        }
    }

    /// Staff user who may see everything
    pub fn staff(id: UserId) -> Self {
        Self {
            id,
            is_privileged: true,
        }
    }
}

/// A resource that belongs to exactly one user.
pub trait Owned {
    /// Human-readable resource name used in denial messages
    const RESOURCE: &'static str;

    /// The owning user
    fn owner(&self) -> UserId;
}
