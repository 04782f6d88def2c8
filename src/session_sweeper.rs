// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Sweeper
//!
//! Background task that periodically drops expired sessions. Expired sessions
//! are already rejected on read; this only reclaims their memory.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::SessionBinder;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct SessionSweeper {
    sessions: Arc<SessionBinder>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<SessionBinder>) -> Self {
        Self {
            sessions,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Session sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }

            self.sweep();
        }
    }

    fn sweep(&self) {
        match self.sessions.purge_expired() {
            Ok(0) => {}
            Ok(count) => debug!(count, "Session sweeper: purged expired sessions"),
            Err(e) => warn!(error = %e, "Session sweeper: purge failed"),
        }
    }
}
