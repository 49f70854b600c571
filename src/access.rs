//! Ownership authorization
//!
//! Decides whether a principal may view a resource. Works uniformly over
//! anything implementing [`Owned`].

use std::fmt;

use crate::domain::{Owned, Principal, UserId};
use crate::error::AppError;

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenyReason {
    resource: &'static str,
}

impl DenyReason {
    /// Name of the resource kind that was refused
    pub fn resource(&self) -> &'static str {
        self.resource
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not {} owner", self.resource)
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny(DenyReason),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }

    /// Turn a denial into the forbidden error reported to the client
    pub fn require(self) -> Result<(), AppError> {
        match self {
            Access::Allow => Ok(()),
            Access::Deny(reason) => Err(AppError::Forbidden(format!(
                "You do not have permission to access this {}.",
                reason.resource()
            ))),
        }
    }
}

/// Staff see everything; everyone else only what they own.
pub fn authorize<R: Owned>(principal: &Principal, resource: &R) -> Access {
    if principal.is_privileged || resource.owner() == principal.id {
        Access::Allow
    } else {
        Access::Deny(DenyReason {
            resource: R::RESOURCE,
        })
    }
}

/// Rows a principal may list before any filter is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    All,
    OwnedBy(UserId),
}

impl OwnerScope {
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.is_privileged {
            OwnerScope::All
        } else {
            OwnerScope::OwnedBy(principal.id)
        }
    }

    /// Whether a row owned by `owner` is inside this scope
    pub fn admits(&self, owner: UserId) -> bool {
        match self {
            OwnerScope::All => true,
            OwnerScope::OwnedBy(user_id) => *user_id == owner,
        }
    }
}
