// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signature verification.
//!
//! Both schemes share one result type and one entry point, but their byte
//! layouts are kept entirely separate. The verifier is chosen by the route
//! that received the request; the signature shape is never used to guess.
//!
//! Verification is pure and CPU-bound. Callers on the async runtime should
//! run it through `spawn_blocking`.

mod envelope;
mod recoverable;

use thiserror::Error;

pub use envelope::EnvelopeVerifier;
pub use recoverable::RecoverableVerifier;

use super::address::{Scheme, WalletAddress};

/// Why a verification failed. Internal only; callers see a single generic error.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FailureReason {
    #[error("signature does not verify")]
    InvalidSignature,
    #[error("signer address does not match the claimed address")]
    AddressMismatch,
    #[error("signed payload does not match the challenge")]
    PayloadMismatch,
    #[error("signature input is malformed")]
    MalformedInput,
}

/// Signature material submitted with `prove`.
#[derive(Debug, Clone, Default)]
pub struct SignatureProof {
    /// Raw signature bytes (65-byte `r‖s‖v` or a CBOR COSE_Sign1).
    pub signature: Vec<u8>,
    /// Optional CBOR COSE_Key carrying the signer's public key.
    pub key: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Independently recovered or verified signer address.
    Verified(WalletAddress),
    Failed(FailureReason),
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified(_))
    }
}

impl From<Result<WalletAddress, FailureReason>> for VerificationOutcome {
    fn from(result: Result<WalletAddress, FailureReason>) -> Self {
        match result {
            Ok(address) => VerificationOutcome::Verified(address),
            Err(reason) => VerificationOutcome::Failed(reason),
        }
    }
}

/// Capability shared by both scheme verifiers.
pub trait SignatureVerifier {
    fn verify(
        &self,
        claimed: &WalletAddress,
        challenge: &[u8],
        proof: &SignatureProof,
    ) -> VerificationOutcome;
}

/// Scheme-tagged verifier.
#[derive(Debug, Clone, Copy)]
pub enum Verifier {
    Recoverable(RecoverableVerifier),
    Envelope(EnvelopeVerifier),
}

impl Verifier {
    pub fn for_scheme(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Evm => Verifier::Recoverable(RecoverableVerifier),
            Scheme::Cardano => Verifier::Envelope(EnvelopeVerifier),
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Verifier::Recoverable(_) => Scheme::Evm,
            Verifier::Envelope(_) => Scheme::Cardano,
        }
    }
}

impl SignatureVerifier for Verifier {
    fn verify(
        &self,
        claimed: &WalletAddress,
        challenge: &[u8],
        proof: &SignatureProof,
    ) -> VerificationOutcome {
        if claimed.scheme() != self.scheme() {
            return VerificationOutcome::Failed(FailureReason::MalformedInput);
        }
        match self {
            Verifier::Recoverable(v) => v.verify(claimed, challenge, proof),
            Verifier::Envelope(v) => v.verify(claimed, challenge, proof),
        }
    }
}
