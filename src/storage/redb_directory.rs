// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity directory backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `identities`: identity id → serialized [`Identity`] (JSON bytes)
//! - `address_index`: canonical address → identity id
//!
//! Every mutation runs in a single write transaction. redb serializes writers,
//! so the read-check-write sequences below are atomic.

use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use uuid::Uuid;

use super::{
    sort_oldest_first, DirectoryError, DirectoryResult, Identity, IdentityDirectory,
};
use crate::auth::address::WalletAddress;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: identity id → serialized Identity (JSON bytes).
const IDENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

/// Index: canonical address → identity id.
const ADDRESS_INDEX: TableDefinition<&str, &str> = TableDefinition::new("address_index");

/// File name under the data directory.
pub const DATABASE_FILE: &str = "identities.redb";

// =============================================================================
// RedbDirectory
// =============================================================================

pub struct RedbDirectory {
    db: Database,
}

impl RedbDirectory {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DirectoryResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(IDENTITIES)?;
            let _ = write_txn.open_table(ADDRESS_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open `identities.redb` inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> DirectoryResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }
}

fn load(txn: &WriteTransaction, id: &str) -> DirectoryResult<Option<Identity>> {
    let table = txn.open_table(IDENTITIES)?;
    let bytes = match table.get(id)? {
        Some(value) => value.value().to_vec(),
        None => return Ok(None),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn store(txn: &WriteTransaction, identity: &Identity) -> DirectoryResult<()> {
    let json = serde_json::to_vec(identity)?;
    let id = identity.id.to_string();
    let mut table = txn.open_table(IDENTITIES)?;
    table.insert(id.as_str(), json.as_slice())?;
    Ok(())
}

impl IdentityDirectory for RedbDirectory {
    fn find_by_address(&self, address: &WalletAddress) -> DirectoryResult<Option<Identity>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ADDRESS_INDEX)?;
        let id = match index.get(address.as_str())? {
            Some(v) => v.value().to_string(),
            None => return Ok(None),
        };

        let table = read_txn.open_table(IDENTITIES)?;
        match table.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn find_by_id(&self, id: Uuid) -> DirectoryResult<Option<Identity>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITIES)?;
        match table.get(id.to_string().as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn issue_nonce(&self, address: &WalletAddress, nonce: &str) -> DirectoryResult<Identity> {
        let write_txn = self.db.begin_write()?;

        let existing_id = {
            let index = write_txn.open_table(ADDRESS_INDEX)?;
            let id = index.get(address.as_str())?.map(|v| v.value().to_string());
            id
        };

        let identity = match existing_id {
            Some(id) => {
                let mut identity = load(&write_txn, &id)?
                    .ok_or_else(|| DirectoryError::NotFound(format!("identity {id}")))?;
                identity.nonce = nonce.to_string();
                identity.updated_at = Utc::now();
                store(&write_txn, &identity)?;
                identity
            }
            None => {
                let identity = Identity::new(address, nonce);
                store(&write_txn, &identity)?;
                let id = identity.id.to_string();
                let mut index = write_txn.open_table(ADDRESS_INDEX)?;
                index.insert(identity.address.as_str(), id.as_str())?;
                identity
            }
        };

        write_txn.commit()?;
        Ok(identity)
    }

    fn consume_nonce(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> DirectoryResult<Option<Identity>> {
        let write_txn = self.db.begin_write()?;

        let mut identity = match load(&write_txn, &id.to_string())? {
            Some(identity) if identity.nonce == expected => identity,
            // Dropping the transaction aborts it
            _ => return Ok(None),
        };
        identity.nonce = next.to_string();
        identity.updated_at = Utc::now();
        store(&write_txn, &identity)?;

        write_txn.commit()?;
        Ok(Some(identity))
    }

    fn update_display_name(&self, id: Uuid, name: Option<String>) -> DirectoryResult<Identity> {
        let write_txn = self.db.begin_write()?;

        let mut identity = load(&write_txn, &id.to_string())?
            .ok_or_else(|| DirectoryError::NotFound(format!("identity {id}")))?;
        identity.display_name = name;
        identity.updated_at = Utc::now();
        store(&write_txn, &identity)?;

        write_txn.commit()?;
        Ok(identity)
    }

    fn list(&self) -> DirectoryResult<Vec<Identity>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITIES)?;

        let mut all = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            all.push(serde_json::from_slice::<Identity>(value.value())?);
        }
        sort_oldest_first(&mut all);
        Ok(all)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::address::Scheme;
    use crate::storage::conformance;

    fn temp_db() -> (RedbDirectory, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = RedbDirectory::open_in(dir.path()).unwrap();
        (db, dir)
    }

    #[test]
    fn issue_creates_then_rotates() {
        let (db, _dir) = temp_db();
        conformance::issue_creates_then_rotates(&db);
    }

    #[test]
    fn consume_is_compare_and_swap() {
        let (db, _dir) = temp_db();
        conformance::consume_is_compare_and_swap(&db);
    }

    #[test]
    fn display_name_and_listing() {
        let (db, _dir) = temp_db();
        conformance::display_name_and_listing(&db);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let address = WalletAddress::parse(Scheme::Evm, conformance::ALICE).unwrap();

        let id = {
            let db = RedbDirectory::open_in(dir.path()).unwrap();
            db.issue_nonce(&address, "77").unwrap().id
        };

        let db = RedbDirectory::open_in(dir.path()).unwrap();
        let identity = db.find_by_address(&address).unwrap().unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.nonce, "77");
    }
}
