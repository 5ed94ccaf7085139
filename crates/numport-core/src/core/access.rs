// crates/numport-core/src/core/access.rs
// ============================================================================
// Module: Numport Access Control
// Description: Principals, roles, and the admin capability token.
// Purpose: Gate the audit view on a role assertion instead of a shared secret.
// Dependencies: crate::core::identifiers, serde, thiserror
// ============================================================================

//! ## Overview
//! Principals are issued by an external authentication authority; this crate
//! only inspects the roles it was handed. Admin-only views take an
//! [`AdminCapability`], which can be obtained solely from a principal holding
//! the [`Role::Admin`] role.
//!
//! ## Invariants
//! - No credential material is stored or compared here.
//! - [`AdminCapability`] has no public constructor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Roles and Principals
// ============================================================================

/// Portal role asserted by the authentication authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Retail customer.
    Customer,
    /// Reseller vendor.
    Vendor,
    /// Portal administrator.
    Admin,
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user identifier.
    pub user_id: UserId,
    /// Roles asserted for the user.
    pub roles: Vec<Role>,
}

impl Principal {
    /// Creates a principal with the provided roles.
    #[must_use]
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            roles,
        }
    }

    /// Returns true when the principal holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Issues an admin capability for admin principals.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Forbidden`] when the principal lacks the admin role.
    pub fn admin_capability(&self) -> Result<AdminCapability, AccessError> {
        if self.has_role(Role::Admin) {
            Ok(AdminCapability {
                holder: self.user_id.clone(),
            })
        } else {
            Err(AccessError::Forbidden(self.user_id.to_string()))
        }
    }
}

/// Proof that the caller was asserted to be an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCapability {
    /// Admin the capability was issued to.
    holder: UserId,
}

impl AdminCapability {
    /// Returns the admin the capability was issued to.
    #[must_use]
    pub const fn holder(&self) -> &UserId {
        &self.holder
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Access control errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Principal lacks the required role.
    #[error("principal {0} is not an administrator")]
    Forbidden(String),
}
