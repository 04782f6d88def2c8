// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use chrono::Duration;

use crate::auth::address::{Scheme, WalletAddress};
use crate::auth::challenge::ChallengeBuilder;
use crate::auth::{AuthProtocol, InMemorySessionStore, Role, SessionBinder};
use crate::config::{DEFAULT_SESSION_CAPACITY, DEFAULT_SESSION_TTL_SECS};
use crate::storage::{IdentityDirectory, InMemoryDirectory};

/// Authorization settings injected at startup.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Canonical privileged address. Matching identities get [`Role::Admin`].
    pub admin_address: Option<WalletAddress>,
}

impl AuthConfig {
    pub fn role_for(&self, canonical_address: &str) -> Role {
        Role::for_address(
            canonical_address,
            self.admin_address.as_ref().map(|a| a.as_str()),
        )
    }
}

#[derive(Clone)]
pub struct AppState {
    pub protocol: Arc<AuthProtocol>,
    pub directory: Arc<dyn IdentityDirectory>,
    pub sessions: Arc<SessionBinder>,
    pub auth_config: AuthConfig,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        builder: ChallengeBuilder,
        schemes: impl IntoIterator<Item = Scheme>,
        sessions: SessionBinder,
    ) -> Self {
        Self {
            protocol: Arc::new(AuthProtocol::new(directory.clone(), builder, schemes)),
            directory,
            sessions: Arc::new(sessions),
            auth_config: AuthConfig::default(),
        }
    }

    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = auth_config;
        self
    }
}

impl Default for AppState {
    /// In-memory directory and sessions, both schemes, built-in template.
    fn default() -> Self {
        let sessions = SessionBinder::new(
            Arc::new(InMemorySessionStore::new(DEFAULT_SESSION_CAPACITY)),
            Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            true,
        );
        Self::new(
            Arc::new(InMemoryDirectory::new()),
            ChallengeBuilder::default(),
            Scheme::ALL,
            sessions,
        )
    }
}
