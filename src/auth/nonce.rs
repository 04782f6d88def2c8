// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge nonce and session token generation.

use alloy::primitives::U256;
use base64ct::{Base64UrlUnpadded, Encoding};
use k256::elliptic_curve::rand_core::{OsRng, RngCore};

/// Generate a fresh challenge nonce.
///
/// 256 bits from the OS CSPRNG, rendered as an unsigned decimal integer so
/// clients can treat it as an opaque big-integer string.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    U256::from_be_bytes(bytes).to_string()
}

/// Check that a stored nonce is a plain unsigned decimal integer.
pub fn is_valid_nonce(nonce: &str) -> bool {
    !nonce.is_empty()
        && nonce.bytes().all(|b| b.is_ascii_digit())
        && U256::from_str_radix(nonce, 10).is_ok()
}

/// Generate a random session token (32 bytes, base64url without padding).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}
