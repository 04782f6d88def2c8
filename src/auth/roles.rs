// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - The configured privileged address; may list all identities
/// - `Member` - Any other authenticated wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        matches!((self, required), (Role::Admin, _) | (Role::Member, Role::Member))
    }

    /// Role for the identity at `address` given the configured privileged address.
    ///
    /// Both sides are canonical encodings, so plain equality is exact.
    pub fn for_address(address: &str, admin_address: Option<&str>) -> Role {
        match admin_address {
            Some(admin) if admin == address => Role::Admin,
            _ => Role::Member,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
        }
    }
}
