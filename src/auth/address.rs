// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet addresses and signature schemes.
//!
//! Every address is parsed into a [`WalletAddress`] before it touches storage.
//! Equality is defined on the canonical encoding, never on the raw input:
//!
//! - `evm`: `0x` + 40 hex digits, case-insensitive, canonical form is lowercase.
//! - `cardano`: bech32 Shelley address. The HRP must agree with the header byte,
//!   and the canonical form is the lowercase bech32 re-encoding of the raw bytes.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Signature scheme, selected by the route that received the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// EIP-712 typed data signed with a recoverable secp256k1 signature.
    Evm,
    /// CIP-30 `signData`: COSE_Sign1 envelope with an Ed25519 signature.
    Cardano,
}

impl Scheme {
    pub const ALL: [Scheme; 2] = [Scheme::Evm, Scheme::Cardano];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Evm => "evm",
            Scheme::Cardano => "cardano",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" => Ok(Scheme::Evm),
            "cardano" => Ok(Scheme::Cardano),
            other => Err(AddressError::UnknownScheme(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("unknown signature scheme: {0}")]
    UnknownScheme(String),

    #[error("invalid EVM address: {0}")]
    InvalidEvm(String),

    #[error("invalid Cardano address: {0}")]
    InvalidCardano(String),
}

/// Shelley address kinds (high nibble of the header byte) that we accept.
///
/// Byron bootstrap addresses (kind 8) are base58 and never reach this code.
const KIND_BASE_MIN: u8 = 0;
const KIND_BASE_MAX: u8 = 3;
const KIND_POINTER_KEY: u8 = 4;
const KIND_POINTER_SCRIPT: u8 = 5;
const KIND_ENTERPRISE_KEY: u8 = 6;
const KIND_ENTERPRISE_SCRIPT: u8 = 7;
const KIND_REWARD_KEY: u8 = 14;
const KIND_REWARD_SCRIPT: u8 = 15;

/// Length of a Cardano credential hash (blake2b-224).
pub const CREDENTIAL_HASH_LEN: usize = 28;

const MAINNET_ID: u8 = 1;

/// A validated wallet address in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAddress {
    scheme: Scheme,
    canonical: String,
    bytes: Vec<u8>,
}

impl WalletAddress {
    /// Parse and canonicalize a user-supplied address for the given scheme.
    pub fn parse(scheme: Scheme, raw: &str) -> Result<Self, AddressError> {
        match scheme {
            Scheme::Evm => Self::parse_evm(raw),
            Scheme::Cardano => Self::parse_cardano(raw),
        }
    }

    /// Parse an address whose scheme is inferred from its shape.
    ///
    /// Only used for configuration values (the privileged address), never
    /// for protocol input where the route decides the scheme.
    pub fn parse_any(raw: &str) -> Result<Self, AddressError> {
        if raw.trim().starts_with("0x") || raw.trim().starts_with("0X") {
            Self::parse_evm(raw)
        } else {
            Self::parse_cardano(raw)
        }
    }

    fn parse_evm(raw: &str) -> Result<Self, AddressError> {
        let raw = raw.trim();
        let hex = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| AddressError::InvalidEvm("missing 0x prefix".to_string()))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidEvm(
                "expected 40 hexadecimal characters".to_string(),
            ));
        }

        let address = Address::from_str(hex).map_err(|e| AddressError::InvalidEvm(e.to_string()))?;
        Ok(Self::from_evm(address))
    }

    /// Build the canonical form of an EVM address.
    pub fn from_evm(address: Address) -> Self {
        Self {
            scheme: Scheme::Evm,
            canonical: format!("0x{}", alloy::hex::encode(address.as_slice())),
            bytes: address.as_slice().to_vec(),
        }
    }

    fn parse_cardano(raw: &str) -> Result<Self, AddressError> {
        // Shelley addresses use the original bech32 checksum only, never bech32m.
        let checked = CheckedHrpstring::new::<Bech32>(raw.trim())
            .map_err(|e| AddressError::InvalidCardano(e.to_string()))?;
        let hrp = checked.hrp();
        let data: Vec<u8> = checked.byte_iter().collect();

        let address = Self::from_cardano_bytes(&data)?;
        if hrp.to_lowercase() != address.expected_hrp() {
            return Err(AddressError::InvalidCardano(format!(
                "prefix '{}' does not match address header (expected '{}')",
                hrp.to_lowercase(),
                address.expected_hrp()
            )));
        }

        Ok(address)
    }

    /// Build a Cardano address from its raw header-prefixed bytes.
    pub fn from_cardano_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let header = *bytes
            .first()
            .ok_or_else(|| AddressError::InvalidCardano("empty address".to_string()))?;
        let kind = header >> 4;

        let length_ok = match kind {
            KIND_BASE_MIN..=KIND_BASE_MAX => bytes.len() == 1 + 2 * CREDENTIAL_HASH_LEN,
            // Pointer addresses carry three variable-length naturals after the credential.
            KIND_POINTER_KEY | KIND_POINTER_SCRIPT => bytes.len() > 1 + CREDENTIAL_HASH_LEN,
            KIND_ENTERPRISE_KEY | KIND_ENTERPRISE_SCRIPT | KIND_REWARD_KEY | KIND_REWARD_SCRIPT => {
                bytes.len() == 1 + CREDENTIAL_HASH_LEN
            }
            _ => {
                return Err(AddressError::InvalidCardano(format!(
                    "unsupported address kind {kind}"
                )))
            }
        };

        if !length_ok {
            return Err(AddressError::InvalidCardano(format!(
                "invalid length {} for address kind {kind}",
                bytes.len()
            )));
        }

        let hrp_str = cardano_hrp(header);
        let hrp = Hrp::parse(hrp_str).map_err(|e| AddressError::InvalidCardano(e.to_string()))?;
        let canonical = bech32::encode::<Bech32>(hrp, bytes)
            .map_err(|e| AddressError::InvalidCardano(e.to_string()))?;

        Ok(Self {
            scheme: Scheme::Cardano,
            canonical,
            bytes: bytes.to_vec(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Canonical string form; used as the directory key.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Raw address bytes (20-byte account for EVM, header-prefixed for Cardano).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The key-hash credential a signing key must hash to, if the address has one.
    ///
    /// Base, pointer and enterprise addresses bind the payment credential;
    /// reward addresses bind the stake credential. Script credentials (and
    /// EVM addresses) return `None`.
    pub fn key_credential(&self) -> Option<&[u8]> {
        if self.scheme != Scheme::Cardano {
            return None;
        }
        let kind = self.bytes[0] >> 4;
        let key_hash = match kind {
            // Bit 0 of the kind selects a script payment credential.
            0 | 2 | KIND_POINTER_KEY | KIND_ENTERPRISE_KEY | KIND_REWARD_KEY => true,
            _ => false,
        };
        key_hash.then(|| &self.bytes[1..1 + CREDENTIAL_HASH_LEN])
    }

    fn expected_hrp(&self) -> &'static str {
        cardano_hrp(self.bytes[0])
    }
}

fn cardano_hrp(header: u8) -> &'static str {
    let kind = header >> 4;
    let mainnet = header & 0x0f == MAINNET_ID;
    match (kind, mainnet) {
        (KIND_REWARD_KEY | KIND_REWARD_SCRIPT, true) => "stake",
        (KIND_REWARD_KEY | KIND_REWARD_SCRIPT, false) => "stake_test",
        (_, true) => "addr",
        (_, false) => "addr_test",
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}
