// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cardano: CIP-30 `signData` envelopes (COSE_Sign1 over Ed25519).
//!
//! The envelope carries the signer's address in a protected header and the
//! public key either as the protected `kid` or in a separate COSE_Key. All of
//! the following must hold:
//!
//! 1. The Ed25519 signature verifies over the COSE `Sig_structure`.
//! 2. The signed payload is byte-identical to the expected challenge.
//! 3. The address header equals the claimed address.
//! 4. The public key hashes (blake2b-224) to the address's payment credential.

use blake2::digest::consts::U28;
use blake2::{Blake2b, Digest};
use coset::cbor::value::Value;
use coset::{
    iana, CborSerializable, CoseKey, CoseSign1, Label, RegisteredLabelWithPrivate,
    TaggedCborSerializable,
};
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH};

use super::{FailureReason, SignatureProof, SignatureVerifier, VerificationOutcome};
use crate::auth::address::WalletAddress;

type Blake2b224 = Blake2b<U28>;

/// Protected header carrying the raw address bytes.
const ADDRESS_HEADER: &str = "address";
/// Unprotected header; `true` means the payload was pre-hashed by the wallet.
const HASHED_HEADER: &str = "hashed";

/// COSE_Key OKP parameters.
const OKP_CRV: i64 = -1;
const OKP_X: i64 = -2;

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeVerifier;

impl EnvelopeVerifier {
    fn check(
        claimed: &WalletAddress,
        challenge: &[u8],
        proof: &SignatureProof,
    ) -> Result<WalletAddress, FailureReason> {
        let sign1 = parse_sign1(&proof.signature)?;

        let alg = sign1.protected.header.alg.as_ref();
        if alg != Some(&RegisteredLabelWithPrivate::Assigned(iana::Algorithm::EdDSA)) {
            return Err(FailureReason::MalformedInput);
        }
        if is_hashed(&sign1) {
            return Err(FailureReason::MalformedInput);
        }

        let key = public_key(&sign1, proof.key.as_deref())?;
        let signature =
            Signature::from_slice(&sign1.signature).map_err(|_| FailureReason::MalformedInput)?;

        let tbs = sign1.tbs_data(b"");
        key.verify_strict(&tbs, &signature)
            .map_err(|_| FailureReason::InvalidSignature)?;

        if sign1.payload.as_deref() != Some(challenge) {
            return Err(FailureReason::PayloadMismatch);
        }

        let signer = address_header(&sign1)
            .and_then(|bytes| WalletAddress::from_cardano_bytes(bytes).ok())
            .ok_or(FailureReason::AddressMismatch)?;
        if &signer != claimed {
            return Err(FailureReason::AddressMismatch);
        }

        let credential = claimed
            .key_credential()
            .ok_or(FailureReason::AddressMismatch)?;
        let key_hash = Blake2b224::digest(key.as_bytes());
        if key_hash[..] != *credential {
            return Err(FailureReason::AddressMismatch);
        }

        Ok(signer)
    }
}

impl SignatureVerifier for EnvelopeVerifier {
    fn verify(
        &self,
        claimed: &WalletAddress,
        challenge: &[u8],
        proof: &SignatureProof,
    ) -> VerificationOutcome {
        Self::check(claimed, challenge, proof).into()
    }
}

/// Wallets emit both the tagged (18) and untagged forms.
fn parse_sign1(bytes: &[u8]) -> Result<CoseSign1, FailureReason> {
    CoseSign1::from_slice(bytes)
        .or_else(|_| CoseSign1::from_tagged_slice(bytes))
        .map_err(|_| FailureReason::MalformedInput)
}

fn is_hashed(sign1: &CoseSign1) -> bool {
    sign1
        .unprotected
        .rest
        .iter()
        .any(|(label, value)| {
            matches!(label, Label::Text(t) if t == HASHED_HEADER) && *value == Value::Bool(true)
        })
}

fn address_header(sign1: &CoseSign1) -> Option<&[u8]> {
    sign1
        .protected
        .header
        .rest
        .iter()
        .find_map(|(label, value)| match (label, value) {
            (Label::Text(t), Value::Bytes(bytes)) if t == ADDRESS_HEADER => Some(bytes.as_slice()),
            _ => None,
        })
}

/// Public key from the protected `kid`, falling back to a supplied COSE_Key.
fn public_key(sign1: &CoseSign1, cose_key: Option<&[u8]>) -> Result<VerifyingKey, FailureReason> {
    let kid = &sign1.protected.header.key_id;
    let raw: Vec<u8> = if kid.len() == PUBLIC_KEY_LENGTH {
        kid.clone()
    } else {
        let encoded = cose_key.ok_or(FailureReason::MalformedInput)?;
        okp_public_key(encoded)?
    };

    let bytes: [u8; PUBLIC_KEY_LENGTH] = raw
        .as_slice()
        .try_into()
        .map_err(|_| FailureReason::MalformedInput)?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| FailureReason::MalformedInput)
}

fn okp_public_key(encoded: &[u8]) -> Result<Vec<u8>, FailureReason> {
    let key = CoseKey::from_slice(encoded).map_err(|_| FailureReason::MalformedInput)?;

    let mut x = None;
    for (label, value) in &key.params {
        match (label, value) {
            (Label::Int(OKP_CRV), Value::Integer(crv)) => {
                if i128::from(*crv) != iana::EllipticCurve::Ed25519 as i128 {
                    return Err(FailureReason::MalformedInput);
                }
            }
            (Label::Int(OKP_X), Value::Bytes(bytes)) => x = Some(bytes.clone()),
            _ => {}
        }
    }
    x.ok_or(FailureReason::MalformedInput)
}
