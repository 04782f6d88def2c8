// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Wallet-based challenge-response authentication.
//!
//! ## Auth Flow
//!
//! 1. Client sends its wallet address to `introduce`
//! 2. Server stores a fresh nonce for that address and returns the challenge
//! 3. Wallet signs the challenge:
//!    - `evm`: EIP-712 typed data, 65-byte recoverable secp256k1 signature
//!    - `cardano`: CIP-30 `signData`, COSE_Sign1 envelope over Ed25519
//! 4. Client sends the signature to `prove`
//! 5. Server rebuilds the challenge from the stored nonce, verifies, rotates the
//!    nonce and binds a session to the identity
//!
//! ## Security
//!
//! - The server never holds private keys or passwords
//! - Each nonce can authenticate at most once
//! - Failed proofs report a single generic error
//! - Session tokens are stored only as SHA-256 hashes

pub mod address;
pub mod challenge;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod nonce;
pub mod protocol;
pub mod roles;
pub mod session;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

pub use address::{Scheme, WalletAddress};
pub use claims::AuthenticatedIdentity;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use protocol::AuthProtocol;
pub use roles::Role;
pub use session::{InMemorySessionStore, SessionBinder, SessionStore};
