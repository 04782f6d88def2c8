// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM: recoverable secp256k1 signatures over EIP-712 digests.

use alloy::primitives::{keccak256, Address};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use super::{FailureReason, SignatureProof, SignatureVerifier, VerificationOutcome};
use crate::auth::address::WalletAddress;

/// `r ‖ s ‖ v`
const SIGNATURE_LEN: usize = 65;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverableVerifier;

impl RecoverableVerifier {
    /// Recover the signer of `challenge` (the full `0x1901 ‖ domain ‖ struct` bytes).
    pub fn recover(challenge: &[u8], signature: &[u8]) -> Result<WalletAddress, FailureReason> {
        if signature.len() != SIGNATURE_LEN {
            return Err(FailureReason::MalformedInput);
        }

        let v = match signature[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            _ => return Err(FailureReason::MalformedInput),
        };
        let recovery_id = RecoveryId::from_byte(v).ok_or(FailureReason::MalformedInput)?;

        let sig =
            Signature::from_slice(&signature[..64]).map_err(|_| FailureReason::MalformedInput)?;
        // Only the low-s form is accepted, so a signature has exactly one valid encoding.
        if sig.normalize_s().is_some() {
            return Err(FailureReason::MalformedInput);
        }

        let digest = keccak256(challenge);
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
            .map_err(|_| FailureReason::InvalidSignature)?;

        Ok(WalletAddress::from_evm(evm_address(&key)))
    }
}

/// Ethereum address: last 20 bytes of keccak256 over the uncompressed point (sans 0x04 prefix).
fn evm_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

impl SignatureVerifier for RecoverableVerifier {
    fn verify(
        &self,
        claimed: &WalletAddress,
        challenge: &[u8],
        proof: &SignatureProof,
    ) -> VerificationOutcome {
        let outcome = Self::recover(challenge, &proof.signature).and_then(|recovered| {
            if &recovered == claimed {
                Ok(recovered)
            } else {
                Err(FailureReason::InvalidSignature)
            }
        });
        outcome.into()
    }
}
