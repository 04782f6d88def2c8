// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated identity representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::address::Scheme;
use super::roles::Role;

/// Identity resolved from a live session.
///
/// This is the primary type handlers use to represent the caller. It is
/// derived on every request from the session's identity reference, so a role
/// change takes effect without re-authenticating.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedIdentity {
    pub identity_id: Uuid,
    /// Canonical wallet address
    pub address: String,
    pub scheme: Scheme,
    pub role: Role,
    /// When the current session expires
    pub session_expires_at: DateTime<Utc>,
}

impl AuthenticatedIdentity {
    /// Check if the identity has the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
