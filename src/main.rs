// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use chrono::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use relational_auth_server::{
    api::router,
    auth::{challenge::ChallengeBuilder, InMemorySessionStore, SessionBinder},
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    session_sweeper::SessionSweeper,
    state::{AppState, AuthConfig},
    storage::{IdentityDirectory, InMemoryDirectory, RedbDirectory},
};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);

    let directory: Arc<dyn IdentityDirectory> = match &config.data_dir {
        Some(dir) => match RedbDirectory::open_in(dir) {
            Ok(db) => {
                info!(data_dir = %dir.display(), "Identity directory opened");
                Arc::new(db)
            }
            Err(e) => {
                error!(data_dir = %dir.display(), error = %e, "Failed to open identity directory");
                std::process::exit(1);
            }
        },
        None => {
            warn!("DATA_DIR not set; identities are kept in memory only");
            Arc::new(InMemoryDirectory::new())
        }
    };

    let sessions = SessionBinder::new(
        Arc::new(InMemorySessionStore::new(config.session_capacity)),
        Duration::seconds(config.session_ttl_secs),
        config.session_cookie_secure,
    );
    if !config.session_cookie_secure {
        warn!("Session cookie is not marked Secure");
    }

    let builder = ChallengeBuilder::new(config.challenge_template.clone(), config.domain.clone());
    let state = AppState::new(directory, builder, config.schemes.clone(), sessions)
        .with_auth_config(AuthConfig {
            admin_address: config.admin_address.clone(),
        });

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(SessionSweeper::new(state.sessions.clone()).run(shutdown.clone()));

    let enabled: Vec<&str> = state.protocol.enabled_schemes().iter().map(|s| s.as_str()).collect();
    let app = router(state);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %addr, schemes = ?enabled, "Relational auth server listening (docs at /docs)");

    let signal = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received, draining connections...");
            signal.cancel();
        })
        .await;

    shutdown.cancel();
    let _ = sweeper.await;

    if let Err(e) = served {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
    info!("Server stopped cleanly");
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
