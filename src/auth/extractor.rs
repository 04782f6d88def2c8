// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for session-authenticated identities.
//!
//! Use the `Auth` extractor in handlers to require a live session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is AuthenticatedIdentity
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::session::token_from_headers;
use super::{AuthError, AuthenticatedIdentity, Role};
use crate::state::AppState;

/// Extractor for authenticated identities.
///
/// Reads the session token from the `wallet_session` cookie or an
/// `Authorization: Bearer` header, resolves the session, then loads the
/// identity it references. Any miss along the way is `Unauthenticated`.
pub struct Auth(pub AuthenticatedIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved earlier in this request
        if let Some(identity) = parts.extensions.get::<AuthenticatedIdentity>().cloned() {
            return Ok(Auth(identity));
        }

        let token = token_from_headers(&parts.headers).ok_or(AuthError::Unauthenticated)?;
        let session = state
            .sessions
            .resolve(&token)?
            .ok_or(AuthError::Unauthenticated)?;

        // The identity may be gone if the directory was reset under a live session.
        let identity = state
            .directory
            .find_by_id(session.identity_id)?
            .ok_or(AuthError::Unauthenticated)?;

        let role = state.auth_config.role_for(&identity.address);
        let authenticated = AuthenticatedIdentity {
            identity_id: identity.id,
            address: identity.address,
            scheme: identity.scheme,
            role,
            session_expires_at: session.expires_at,
        };
        parts.extensions.insert(authenticated.clone());

        Ok(Auth(authenticated))
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub AuthenticatedIdentity);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(identity) = Auth::from_request_parts(parts, state).await?;

        if !identity.has_role(Role::Admin) {
            return Err(AuthError::Forbidden);
        }

        Ok(AdminOnly(identity))
    }
}
