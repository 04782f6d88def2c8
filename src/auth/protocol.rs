// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge-response protocol.
//!
//! ```text
//!   introduce(address) ──► Challenged(nonce) ──prove(sig)──► Verified ──► bind session
//!          ▲                    │    ▲                          │
//!          └── re-introduce ────┘    └──── nonce rotated ◄──────┘
//! ```
//!
//! - `introduce` creates the identity on first contact, or replaces its nonce.
//!   It never authenticates anything.
//! - `prove` rebuilds the challenge from the *current* nonce and verifies the
//!   signature against it. On success the nonce is swapped for a fresh one, so
//!   a captured signature cannot be replayed.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::address::{Scheme, WalletAddress};
use super::challenge::{ChallengeBuilder, ChallengeView};
use super::error::AuthError;
use super::nonce::{generate_nonce, is_valid_nonce};
use super::verify::{SignatureProof, SignatureVerifier, VerificationOutcome, Verifier};
use crate::storage::{Identity, IdentityDirectory};

/// Result of `introduce`: the challenge the wallet must sign.
#[derive(Debug, Clone, Serialize)]
pub struct Introduction {
    pub scheme: Scheme,
    pub address: String,
    pub challenge: ChallengeView,
}

pub struct AuthProtocol {
    directory: Arc<dyn IdentityDirectory>,
    builder: ChallengeBuilder,
    enabled: HashSet<Scheme>,
}

impl AuthProtocol {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        builder: ChallengeBuilder,
        enabled: impl IntoIterator<Item = Scheme>,
    ) -> Self {
        Self {
            directory,
            builder,
            enabled: enabled.into_iter().collect(),
        }
    }

    /// Resolve a route's scheme segment, rejecting unknown or disabled schemes.
    pub fn scheme(&self, raw: &str) -> Result<Scheme, AuthError> {
        match raw.parse::<Scheme>() {
            Ok(scheme) if self.enabled.contains(&scheme) => Ok(scheme),
            _ => Err(AuthError::SchemeUnavailable(raw.to_string())),
        }
    }

    pub fn enabled_schemes(&self) -> Vec<Scheme> {
        Scheme::ALL
            .into_iter()
            .filter(|s| self.enabled.contains(s))
            .collect()
    }

    /// Whether the challenge template is currently readable.
    pub fn challenge_ready(&self) -> bool {
        self.builder.template_text().is_ok()
    }

    /// Issue a fresh challenge for `raw_address`.
    pub fn introduce(&self, scheme: Scheme, raw_address: &str) -> Result<Introduction, AuthError> {
        let address = WalletAddress::parse(scheme, raw_address)
            .map_err(|e| AuthError::InvalidAddress(e.to_string()))?;

        // Template first: a failure here must leave the directory untouched.
        let template = self.builder.template_text()?;

        let nonce = generate_nonce();
        let identity = self.directory.issue_nonce(&address, &nonce)?;
        debug!(identity_id = %identity.id, scheme = %scheme, "challenge issued");

        let challenge = self.builder.build(template, &identity.nonce);
        Ok(Introduction {
            scheme,
            address: identity.address,
            challenge: self.builder.view(&challenge, scheme),
        })
    }

    /// Verify `proof` against the identity's current challenge.
    ///
    /// Every verification failure is reported as [`AuthError::VerificationFailed`];
    /// the specific reason is only logged.
    pub async fn prove(
        &self,
        scheme: Scheme,
        raw_address: &str,
        proof: SignatureProof,
    ) -> Result<Identity, AuthError> {
        let address = WalletAddress::parse(scheme, raw_address)
            .map_err(|e| AuthError::InvalidAddress(e.to_string()))?;

        let identity = self
            .directory
            .find_by_address(&address)?
            .ok_or(AuthError::UnknownAddress)?;

        if !is_valid_nonce(&identity.nonce) {
            warn!(identity_id = %identity.id, "stored nonce is malformed");
            return Err(AuthError::VerificationFailed);
        }

        let template = self.builder.template_text()?;
        let challenge = self.builder.build(template, &identity.nonce);
        let bytes = self.builder.signing_bytes(&challenge, scheme);

        let verifier = Verifier::for_scheme(scheme);
        let claimed = address.clone();
        let outcome = tokio::task::spawn_blocking(move || verifier.verify(&claimed, &bytes, &proof))
            .await
            .map_err(|e| {
                warn!(error = %e, "verification task failed");
                AuthError::VerificationFailed
            })?;

        if let VerificationOutcome::Failed(reason) = outcome {
            debug!(
                identity_id = %identity.id,
                scheme = %scheme,
                reason = %reason,
                "proof rejected"
            );
            return Err(AuthError::VerificationFailed);
        }

        // Rotate on success. Losing the swap means another proof already used this nonce.
        let next = generate_nonce();
        let rotated = self
            .directory
            .consume_nonce(identity.id, &identity.nonce, &next)?
            .ok_or_else(|| {
                debug!(identity_id = %identity.id, "nonce consumed concurrently");
                AuthError::VerificationFailed
            })?;

        info!(identity_id = %rotated.id, scheme = %scheme, "wallet proof accepted");
        Ok(rotated)
    }
}
