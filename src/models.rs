// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`/`Deserialize` and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Auth**: introduce / prove / disconnect
//! - **Identities**: the caller's profile and the admin listing
//!
//! Signatures and COSE keys travel as hex strings (optional `0x` prefix),
//! which is what both EIP-1193 and CIP-30 wallets return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::address::Scheme;
use crate::auth::challenge::ChallengeView;
use crate::auth::protocol::Introduction;
use crate::auth::Role;
use crate::storage::Identity;

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntroduceRequest {
    /// Wallet address in the route's scheme
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntroduceResponse {
    /// Canonical form of the submitted address
    pub address: String,
    pub scheme: Scheme,
    /// Structure the wallet must sign
    pub challenge: ChallengeView,
}

impl From<Introduction> for IntroduceResponse {
    fn from(intro: Introduction) -> Self {
        Self {
            address: intro.address,
            scheme: intro.scheme,
            challenge: intro.challenge,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProveRequest {
    pub address: String,
    /// Hex signature: 65-byte `r‖s‖v` (evm) or CBOR COSE_Sign1 (cardano)
    pub signature: String,
    /// Hex CBOR COSE_Key (cardano only, optional)
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProveResponse {
    pub session_established: bool,
    pub identity_id: Uuid,
    pub address: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DisconnectResponse {
    /// Whether a live session was presented and destroyed
    pub session_cleared: bool,
}

// =============================================================================
// Identities
// =============================================================================

/// Public view of an identity. The nonce is never exposed here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub identity_id: Uuid,
    pub scheme: Scheme,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IdentityResponse {
    pub fn new(identity: Identity, role: Role) -> Self {
        Self {
            identity_id: identity.id,
            scheme: identity.scheme,
            address: identity.address,
            display_name: identity.display_name,
            role,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    /// New display name; `null` clears it
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListIdentitiesResponse {
    pub identities: Vec<IdentityResponse>,
    pub total: usize,
}
