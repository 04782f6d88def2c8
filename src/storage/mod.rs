// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Directory
//!
//! Persistent mapping from canonical wallet address to identity record.
//! Each record carries the single outstanding challenge nonce for that address.
//!
//! Two backends implement [`IdentityDirectory`]:
//!
//! - [`InMemoryDirectory`]: process-local maps, used when no data directory is configured
//! - [`RedbDirectory`]: embedded redb database under `$DATA_DIR/identities.redb`
//!
//! ## Atomicity
//!
//! `issue_nonce` (create-or-rotate) and `consume_nonce` (compare-and-swap) are
//! each a single critical section / write transaction. Two concurrent
//! introductions of a new address produce exactly one record, and two concurrent
//! proofs over the same nonce can only succeed once.

pub mod memory;
pub mod redb_directory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::address::{Scheme, WalletAddress};

pub use memory::InMemoryDirectory;
pub use redb_directory::RedbDirectory;

/// Maximum display name length, in characters.
pub const DISPLAY_NAME_MAX_CHARS: usize = 64;

// =============================================================================
// Identity Record
// =============================================================================

/// One identity per canonical address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub scheme: Scheme,
    /// Canonical address. Never changes after creation.
    pub address: String,
    /// Current challenge nonce (decimal).
    pub nonce: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(address: &WalletAddress, nonce: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            scheme: address.scheme(),
            address: address.as_str().to_string(),
            nonce: nonce.to_string(),
            display_name: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("directory lock poisoned")]
    Poisoned,
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

// =============================================================================
// Directory Trait
// =============================================================================

pub trait IdentityDirectory: Send + Sync {
    fn find_by_address(&self, address: &WalletAddress) -> DirectoryResult<Option<Identity>>;

    fn find_by_id(&self, id: Uuid) -> DirectoryResult<Option<Identity>>;

    /// Create the identity with `nonce`, or replace the nonce of the existing one.
    fn issue_nonce(&self, address: &WalletAddress, nonce: &str) -> DirectoryResult<Identity>;

    /// Replace the nonce with `next` only if it still equals `expected`.
    ///
    /// Returns `None` when the nonce has already moved on.
    fn consume_nonce(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> DirectoryResult<Option<Identity>>;

    /// Set or clear the display name. The name must already be normalized.
    fn update_display_name(&self, id: Uuid, name: Option<String>) -> DirectoryResult<Identity>;

    /// All identities, oldest first.
    fn list(&self) -> DirectoryResult<Vec<Identity>>;
}

/// Trim and validate a user-supplied display name.
pub fn normalize_display_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    let chars = name.chars().count();
    if chars == 0 || chars > DISPLAY_NAME_MAX_CHARS || name.chars().any(char::is_control) {
        return None;
    }
    Some(name.to_string())
}

fn sort_oldest_first(identities: &mut [Identity]) {
    identities.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod conformance {
    //! Behaviour every backend must share.

    use super::*;
    use crate::auth::address::Scheme;

    pub(crate) const ALICE: &str = "0xa11ce000000000000000000000000000000a11ce";
    pub(crate) const BOB: &str = "0xb0b00000000000000000000000000000000000b0";

    fn evm(raw: &str) -> WalletAddress {
        WalletAddress::parse(Scheme::Evm, raw).unwrap()
    }

    pub(crate) fn issue_creates_then_rotates(dir: &dyn IdentityDirectory) {
        let alice = evm(ALICE);
        assert!(dir.find_by_address(&alice).unwrap().is_none());

        let first = dir.issue_nonce(&alice, "1").unwrap();
        assert_eq!(first.nonce, "1");
        assert_eq!(first.address, ALICE);

        // Mixed-case input resolves to the same record.
        let upper = evm(&ALICE.to_uppercase().replacen("0X", "0x", 1));
        let second = dir.issue_nonce(&upper, "2").unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.nonce, "2");
        assert_eq!(second.created_at, first.created_at);

        assert_eq!(dir.list().unwrap().len(), 1);
        assert_eq!(dir.find_by_id(first.id).unwrap().unwrap().nonce, "2");
    }

    pub(crate) fn consume_is_compare_and_swap(dir: &dyn IdentityDirectory) {
        let identity = dir.issue_nonce(&evm(ALICE), "10").unwrap();

        assert!(dir.consume_nonce(identity.id, "9", "11").unwrap().is_none());
        let rotated = dir.consume_nonce(identity.id, "10", "11").unwrap().unwrap();
        assert_eq!(rotated.nonce, "11");
        // Same expected nonce a second time loses.
        assert!(dir.consume_nonce(identity.id, "10", "12").unwrap().is_none());
        assert_eq!(dir.find_by_id(identity.id).unwrap().unwrap().nonce, "11");
    }

    pub(crate) fn display_name_and_listing(dir: &dyn IdentityDirectory) {
        let alice = dir.issue_nonce(&evm(ALICE), "1").unwrap();
        let bob = dir.issue_nonce(&evm(BOB), "2").unwrap();

        let renamed = dir
            .update_display_name(alice.id, Some("Alice".to_string()))
            .unwrap();
        assert_eq!(renamed.display_name.as_deref(), Some("Alice"));
        assert_eq!(renamed.address, alice.address);

        let cleared = dir.update_display_name(alice.id, None).unwrap();
        assert!(cleared.display_name.is_none());

        assert!(matches!(
            dir.update_display_name(Uuid::new_v4(), None),
            Err(DirectoryError::NotFound(_))
        ));

        let ids: Vec<Uuid> = dir.list().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&alice.id) && ids.contains(&bob.id));
    }

    #[test]
    fn display_name_rules() {
        assert_eq!(normalize_display_name("  Alice  ").as_deref(), Some("Alice"));
        assert!(normalize_display_name("   ").is_none());
        assert!(normalize_display_name("bad\nname").is_none());
        assert!(normalize_display_name(&"x".repeat(65)).is_none());
        assert!(normalize_display_name(&"é".repeat(64)).is_some());
    }
}
