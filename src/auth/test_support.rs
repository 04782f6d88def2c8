// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deterministic test wallets for both schemes.

use alloy::primitives::{keccak256, Address};
use blake2::digest::consts::U28;
use blake2::{Blake2b, Digest};
use coset::cbor::value::Value;
use coset::{iana, CborSerializable, CoseKeyBuilder, CoseSign1Builder, HeaderBuilder};
use ed25519_dalek::Signer;

use super::address::tests::{base_address, enterprise_address};
use super::address::{Scheme, WalletAddress};
use super::verify::SignatureProof;

pub(crate) trait TestWallet {
    fn address(&self) -> WalletAddress;
    fn sign(&self, challenge: &[u8]) -> SignatureProof;
}

/// secp256k1 key producing 65-byte `r‖s‖v` signatures with `v` in {27, 28}.
pub(crate) struct EvmWallet(k256::ecdsa::SigningKey);

impl EvmWallet {
    pub(crate) fn new(seed: u8) -> Self {
        Self(k256::ecdsa::SigningKey::from_slice(&[seed; 32]).unwrap())
    }
}

impl TestWallet for EvmWallet {
    fn address(&self) -> WalletAddress {
        let point = self.0.verifying_key().to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        WalletAddress::from_evm(Address::from_slice(&hash[12..]))
    }

    fn sign(&self, challenge: &[u8]) -> SignatureProof {
        let digest = keccak256(challenge);
        let (sig, recid) = self.0.sign_prehash_recoverable(digest.as_slice()).unwrap();
        let mut signature = sig.to_bytes().to_vec();
        signature.push(recid.to_byte() + 27);
        SignatureProof {
            signature,
            key: None,
        }
    }
}

/// Ed25519 key producing CIP-30 style envelopes.
///
/// `new` binds the key to a mainnet enterprise address and puts it in the
/// protected `kid`. `base` binds it to a mainnet base address with a separate
/// stake key and ships the public key as a COSE_Key instead.
pub(crate) struct CardanoWallet {
    key: ed25519_dalek::SigningKey,
    stake: Option<[u8; 28]>,
}

impl CardanoWallet {
    pub(crate) fn new(seed: u8) -> Self {
        Self {
            key: ed25519_dalek::SigningKey::from_bytes(&[seed; 32]),
            stake: None,
        }
    }

    pub(crate) fn base(seed: u8, stake_seed: u8) -> Self {
        let stake = ed25519_dalek::SigningKey::from_bytes(&[stake_seed; 32]);
        Self {
            key: ed25519_dalek::SigningKey::from_bytes(&[seed; 32]),
            stake: Some(key_hash(stake.verifying_key().as_bytes())),
        }
    }

    fn cose_key(&self) -> Vec<u8> {
        CoseKeyBuilder::new_okp_key()
            .param(-1, Value::Integer((iana::EllipticCurve::Ed25519 as i64).into()))
            .param(-2, Value::Bytes(self.key.verifying_key().as_bytes().to_vec()))
            .build()
            .to_vec()
            .unwrap()
    }
}

fn key_hash(public_key: &[u8]) -> [u8; 28] {
    Blake2b::<U28>::digest(public_key).into()
}

impl TestWallet for CardanoWallet {
    fn address(&self) -> WalletAddress {
        let payment = key_hash(self.key.verifying_key().as_bytes());
        let raw = match &self.stake {
            Some(stake) => base_address(&payment, stake),
            None => enterprise_address(&payment, 1),
        };
        WalletAddress::parse(Scheme::Cardano, &raw).unwrap()
    }

    fn sign(&self, challenge: &[u8]) -> SignatureProof {
        let mut protected = HeaderBuilder::new()
            .algorithm(iana::Algorithm::EdDSA)
            .text_value("address".to_string(), Value::Bytes(self.address().as_bytes().to_vec()));
        if self.stake.is_none() {
            protected = protected.key_id(self.key.verifying_key().as_bytes().to_vec());
        }
        let signature = CoseSign1Builder::new()
            .protected(protected.build())
            .payload(challenge.to_vec())
            .create_signature(b"", |data| self.key.sign(data).to_bytes().to_vec())
            .build()
            .to_vec()
            .unwrap();
        SignatureProof {
            signature,
            key: self.stake.map(|_| self.cose_key()),
        }
    }
}
