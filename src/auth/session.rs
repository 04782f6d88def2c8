// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session binding.
//!
//! A successful proof is turned into an opaque session token. The only claim
//! a session holds is the identity it references.
//!
//! ## Tokens
//!
//! - 32 random bytes, base64url without padding
//! - Stored keyed by SHA-256(token) hex, so raw tokens never sit in memory
//! - Delivered as the `wallet_session` cookie; `Authorization: Bearer` also accepted
//!
//! Binding always issues a new token (regeneration). A token presented with
//! the proof request is destroyed first, so a pre-set token can never be
//! promoted into an authenticated one.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use alloy::hex;
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::nonce::generate_session_token;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "wallet_session";

// =============================================================================
// Records and Store
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub identity_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store lock poisoned")]
    Poisoned,
}

pub type SessionResult<T> = Result<T, SessionStoreError>;

/// Storage for session records, keyed by token hash.
pub trait SessionStore: Send + Sync {
    fn insert(&self, key: String, record: SessionRecord) -> SessionResult<()>;
    fn get(&self, key: &str) -> SessionResult<Option<SessionRecord>>;
    fn remove(&self, key: &str) -> SessionResult<Option<SessionRecord>>;
    /// Drop every record expired at `now`. Returns the number removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> SessionResult<usize>;
}

/// LRU-bounded in-memory session store.
///
/// When full, the least recently used session is evicted.
pub struct InMemorySessionStore {
    cache: Mutex<LruCache<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, key: String, record: SessionRecord) -> SessionResult<()> {
        let mut cache = self.cache.lock().map_err(|_| SessionStoreError::Poisoned)?;
        cache.put(key, record);
        Ok(())
    }

    fn get(&self, key: &str) -> SessionResult<Option<SessionRecord>> {
        let mut cache = self.cache.lock().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(cache.get(key).cloned())
    }

    fn remove(&self, key: &str) -> SessionResult<Option<SessionRecord>> {
        let mut cache = self.cache.lock().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(cache.pop(key))
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> SessionResult<usize> {
        let mut cache = self.cache.lock().map_err(|_| SessionStoreError::Poisoned)?;
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, record)| record.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        Ok(expired.len())
    }
}

// =============================================================================
// Binder
// =============================================================================

/// A freshly bound session. `token` is only ever handed to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub record: SessionRecord,
}

pub struct SessionBinder {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    cookie_secure: bool,
}

impl SessionBinder {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration, cookie_secure: bool) -> Self {
        Self {
            store,
            ttl,
            cookie_secure,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Bind a new session to `identity_id`, destroying `previous` if presented.
    pub fn bind(&self, identity_id: Uuid, previous: Option<&str>) -> SessionResult<IssuedSession> {
        if let Some(old) = previous {
            self.store.remove(&token_key(old))?;
        }

        let token = generate_session_token();
        let now = Utc::now();
        let record = SessionRecord {
            identity_id,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.store.insert(token_key(&token), record.clone())?;

        Ok(IssuedSession { token, record })
    }

    /// Look up a live session. Expired sessions are removed and reported as absent.
    pub fn resolve(&self, token: &str) -> SessionResult<Option<SessionRecord>> {
        let key = token_key(token);
        match self.store.get(&key)? {
            Some(record) if record.is_expired(Utc::now()) => {
                self.store.remove(&key)?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Destroy the session for `token`. Unknown tokens are ignored.
    pub fn clear(&self, token: &str) -> SessionResult<()> {
        self.store.remove(&token_key(token))?;
        Ok(())
    }

    pub fn purge_expired(&self) -> SessionResult<usize> {
        self.store.purge_expired(Utc::now())
    }

    /// `Set-Cookie` value delivering `token`.
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(token, self.ttl.num_seconds())
    }

    /// `Set-Cookie` value that makes the client drop its session cookie.
    pub fn expired_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Session token from `Authorization: Bearer`, falling back to the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn token_key(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
