// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Auth - Wallet Challenge-Response Authentication Service
//!
//! Users prove control of a wallet by signing a one-time challenge. The
//! server stores only addresses and nonces; it never sees a private key.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Challenge construction, signature verification, sessions
//! - `storage` - Identity directory (in-memory or redb)
//! - `session_sweeper` - Background purge of expired sessions

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod session_sweeper;
pub mod state;
pub mod storage;
