// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory identity directory.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use super::{
    sort_oldest_first, DirectoryError, DirectoryResult, Identity, IdentityDirectory,
};
use crate::auth::address::WalletAddress;

#[derive(Default)]
struct Inner {
    by_id: HashMap<Uuid, Identity>,
    /// canonical address → id
    by_address: HashMap<String, Uuid>,
}

/// Process-local directory. Records are lost on restart.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Inner>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityDirectory for InMemoryDirectory {
    fn find_by_address(&self, address: &WalletAddress) -> DirectoryResult<Option<Identity>> {
        let inner = self.inner.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(inner
            .by_address
            .get(address.as_str())
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    fn find_by_id(&self, id: Uuid) -> DirectoryResult<Option<Identity>> {
        let inner = self.inner.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(inner.by_id.get(&id).cloned())
    }

    fn issue_nonce(&self, address: &WalletAddress, nonce: &str) -> DirectoryResult<Identity> {
        let mut inner = self.inner.write().map_err(|_| DirectoryError::Poisoned)?;

        if let Some(id) = inner.by_address.get(address.as_str()).copied() {
            let identity = inner
                .by_id
                .get_mut(&id)
                .ok_or_else(|| DirectoryError::NotFound(format!("identity {id}")))?;
            identity.nonce = nonce.to_string();
            identity.updated_at = Utc::now();
            return Ok(identity.clone());
        }

        let identity = Identity::new(address, nonce);
        inner
            .by_address
            .insert(identity.address.clone(), identity.id);
        inner.by_id.insert(identity.id, identity.clone());
        Ok(identity)
    }

    fn consume_nonce(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> DirectoryResult<Option<Identity>> {
        let mut inner = self.inner.write().map_err(|_| DirectoryError::Poisoned)?;
        match inner.by_id.get_mut(&id) {
            Some(identity) if identity.nonce == expected => {
                identity.nonce = next.to_string();
                identity.updated_at = Utc::now();
                Ok(Some(identity.clone()))
            }
            _ => Ok(None),
        }
    }

    fn update_display_name(&self, id: Uuid, name: Option<String>) -> DirectoryResult<Identity> {
        let mut inner = self.inner.write().map_err(|_| DirectoryError::Poisoned)?;
        let identity = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| DirectoryError::NotFound(format!("identity {id}")))?;
        identity.display_name = name;
        identity.updated_at = Utc::now();
        Ok(identity.clone())
    }

    fn list(&self) -> DirectoryResult<Vec<Identity>> {
        let inner = self.inner.read().map_err(|_| DirectoryError::Poisoned)?;
        let mut all: Vec<Identity> = inner.by_id.values().cloned().collect();
        sort_oldest_first(&mut all);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::conformance;
    use std::sync::Arc;

    #[test]
    fn issue_creates_then_rotates() {
        conformance::issue_creates_then_rotates(&InMemoryDirectory::new());
    }

    #[test]
    fn consume_is_compare_and_swap() {
        conformance::consume_is_compare_and_swap(&InMemoryDirectory::new());
    }

    #[test]
    fn display_name_and_listing() {
        conformance::display_name_and_listing(&InMemoryDirectory::new());
    }

    #[test]
    fn concurrent_introductions_create_one_record() {
        let dir = Arc::new(InMemoryDirectory::new());
        let address = WalletAddress::parse(
            crate::auth::address::Scheme::Evm,
            conformance::ALICE,
        )
        .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dir = dir.clone();
                let address = address.clone();
                std::thread::spawn(move || dir.issue_nonce(&address, &i.to_string()).unwrap().id)
            })
            .collect();
        let ids: Vec<Uuid> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(dir.list().unwrap().len(), 1);
    }
}
