// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        challenge::{ChallengeMessage, ChallengeView, EnvelopeView, TypedDataView, TypedField},
        session::SESSION_COOKIE,
        Role, Scheme,
    },
    models::{
        DisconnectResponse, IdentityResponse, IntroduceRequest, IntroduceResponse,
        ListIdentitiesResponse, ProveRequest, ProveResponse, UpdateProfileRequest,
    },
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/{scheme}/introduce", post(auth::introduce))
        .route("/auth/{scheme}/prove", post(auth::prove))
        .route("/auth/disconnect", post(auth::disconnect))
        .route(
            "/me",
            get(users::get_current_identity).patch(users::update_current_identity),
        )
        .route("/admin/identities", get(admin::list_identities));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::introduce,
        auth::prove,
        auth::disconnect,
        users::get_current_identity,
        users::update_current_identity,
        admin::list_identities,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Scheme,
            Role,
            IntroduceRequest,
            IntroduceResponse,
            ProveRequest,
            ProveResponse,
            DisconnectResponse,
            IdentityResponse,
            UpdateProfileRequest,
            ListIdentitiesResponse,
            ChallengeView,
            TypedDataView,
            EnvelopeView,
            ChallengeMessage,
            TypedField,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SessionSecurity),
    tags(
        (name = "Auth", description = "Wallet challenge-response authentication"),
        (name = "Identity", description = "Current identity profile"),
        (name = "Admin", description = "Administrative views"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::challenge::{Challenge, ChallengeBuilder};
    use crate::auth::test_support::{CardanoWallet, EvmWallet, TestWallet};
    use crate::auth::{InMemorySessionStore, SessionBinder};
    use crate::state::AuthConfig;
    use crate::storage::InMemoryDirectory;
    use alloy::hex;
    use axum::body::to_bytes;
    use axum::http::{header, HeaderMap, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Value,
    }

    impl Reply {
        /// `name=value` pair from the Set-Cookie header.
        fn cookie(&self) -> String {
            let set_cookie = self.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
            set_cookie.split(';').next().unwrap().to_string()
        }
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, headers, body }
    }

    async fn introduce(app: &Router, scheme: Scheme, address: &str) -> Reply {
        let uri = format!("/v1/auth/{scheme}/introduce");
        send(app, "POST", &uri, None, Some(json!({ "address": address }))).await
    }

    /// Challenge bytes for an introduce response, rebuilt from what the client received.
    fn signing_bytes(scheme: Scheme, body: &Value) -> Vec<u8> {
        let challenge = &body["challenge"];
        match scheme {
            Scheme::Evm => {
                let message = &challenge["message"];
                let rebuilt = Challenge {
                    template: message["message"].as_str().unwrap().to_string(),
                    nonce: message["nonce"].as_str().unwrap().to_string(),
                };
                ChallengeBuilder::default().signing_bytes(&rebuilt, scheme)
            }
            Scheme::Cardano => challenge["payload"].as_str().unwrap().as_bytes().to_vec(),
        }
    }

    async fn prove(app: &Router, scheme: Scheme, wallet: &dyn TestWallet, bytes: &[u8]) -> Reply {
        let proof = wallet.sign(bytes);
        let uri = format!("/v1/auth/{scheme}/prove");
        let body = json!({
            "address": wallet.address().as_str(),
            "signature": hex::encode_prefixed(&proof.signature),
        });
        send(app, "POST", &uri, None, Some(body)).await
    }

    async fn login(app: &Router, scheme: Scheme, wallet: &dyn TestWallet) -> String {
        let intro = introduce(app, scheme, wallet.address().as_str()).await;
        assert_eq!(intro.status, StatusCode::OK);
        let reply = prove(app, scheme, wallet, &signing_bytes(scheme, &intro.body)).await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.cookie()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn evm_login_session_and_disconnect() {
        let app = router(AppState::default());
        let wallet = EvmWallet::new(21);
        let address = wallet.address();

        let intro = introduce(&app, Scheme::Evm, address.as_str()).await;
        assert_eq!(intro.status, StatusCode::OK);
        assert_eq!(intro.body["scheme"], "evm");
        assert_eq!(intro.body["challenge"]["primaryType"], "Challenge");
        let bytes = signing_bytes(Scheme::Evm, &intro.body);

        let reply = prove(&app, Scheme::Evm, &wallet, &bytes).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["session_established"], true);
        assert_eq!(reply.body["address"], address.as_str());
        assert_eq!(reply.body["role"], "member");
        let set_cookie = reply.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = reply.cookie();

        let me = send(&app, "GET", "/v1/me", Some(&cookie), None).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body["address"], address.as_str());
        assert!(me.body.get("nonce").is_none());

        // Same signature again: the nonce rotated on success.
        let replay = prove(&app, Scheme::Evm, &wallet, &bytes).await;
        assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
        assert_eq!(replay.body["error_code"], "verification_failed");

        let bye = send(&app, "POST", "/v1/auth/disconnect", Some(&cookie), None).await;
        assert_eq!(bye.status, StatusCode::OK);
        assert_eq!(bye.body["session_cleared"], true);
        let expired = bye.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(expired.contains("Max-Age=0"));

        let me = send(&app, "GET", "/v1/me", Some(&cookie), None).await;
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);

        // Idempotent
        let again = send(&app, "POST", "/v1/auth/disconnect", Some(&cookie), None).await;
        assert_eq!(again.status, StatusCode::OK);
        assert_eq!(again.body["session_cleared"], false);
    }

    #[tokio::test]
    async fn second_introduce_invalidates_first_signature() {
        let app = router(AppState::default());
        let wallet = EvmWallet::new(22);
        let address = wallet.address();

        let first = introduce(&app, Scheme::Evm, address.as_str()).await;
        let second = introduce(&app, Scheme::Evm, address.as_str()).await;
        let n1 = first.body["challenge"]["message"]["nonce"].as_str().unwrap().to_string();
        let n2 = second.body["challenge"]["message"]["nonce"].as_str().unwrap().to_string();
        assert_ne!(n1, n2);

        let stale_bytes = signing_bytes(Scheme::Evm, &first.body);
        let stale = prove(&app, Scheme::Evm, &wallet, &stale_bytes).await;
        assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

        let fresh_bytes = signing_bytes(Scheme::Evm, &second.body);
        let fresh = prove(&app, Scheme::Evm, &wallet, &fresh_bytes).await;
        assert_eq!(fresh.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn cardano_login() {
        let app = router(AppState::default());
        let wallet = CardanoWallet::new(23);

        let intro = introduce(&app, Scheme::Cardano, wallet.address().as_str()).await;
        assert_eq!(intro.status, StatusCode::OK);
        let payload = intro.body["challenge"]["payload"].as_str().unwrap();
        let nonce = intro.body["challenge"]["nonce"].as_str().unwrap();
        assert!(payload.ends_with(nonce));

        let cookie = login(&app, Scheme::Cardano, &wallet).await;
        let me = send(&app, "GET", "/v1/me", Some(&cookie), None).await;
        assert_eq!(me.body["scheme"], "cardano");
    }

    #[tokio::test]
    async fn error_statuses() {
        let app = router(AppState::default());

        let bad = introduce(&app, Scheme::Evm, "not an address").await;
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.body["error_code"], "invalid_address");

        let wallet = EvmWallet::new(24);
        let unknown = prove(&app, Scheme::Evm, &wallet, b"whatever").await;
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);
        assert_eq!(unknown.body["error_code"], "unknown_address");

        let body = json!({ "address": "x" });
        let scheme = send(&app, "POST", "/v1/auth/bitcoin/introduce", None, Some(body)).await;
        assert_eq!(scheme.status, StatusCode::NOT_FOUND);
        assert_eq!(scheme.body["error_code"], "scheme_unavailable");

        let me = send(&app, "GET", "/v1/me", None, None).await;
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);
        assert_eq!(me.body["error_code"], "unauthenticated");
    }

    #[tokio::test]
    async fn disabled_scheme_is_not_routed() {
        let state = AppState::new(
            Arc::new(InMemoryDirectory::new()),
            ChallengeBuilder::default(),
            [Scheme::Evm],
            SessionBinder::new(
                Arc::new(InMemorySessionStore::new(8)),
                chrono::Duration::hours(1),
                false,
            ),
        );
        let app = router(state);

        let wallet = CardanoWallet::new(25);
        let reply = introduce(&app, Scheme::Cardano, wallet.address().as_str()).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["error_code"], "scheme_unavailable");
    }

    #[tokio::test]
    async fn profile_update_and_admin_listing() {
        let admin_wallet = EvmWallet::new(26);
        let member_wallet = CardanoWallet::new(27);
        let state = AppState::default().with_auth_config(AuthConfig {
            admin_address: Some(admin_wallet.address()),
        });
        let app = router(state);

        let member = login(&app, Scheme::Cardano, &member_wallet).await;
        let admin = login(&app, Scheme::Evm, &admin_wallet).await;

        let body = json!({ "display_name": "  Ada  " });
        let renamed = send(&app, "PATCH", "/v1/me", Some(&member), Some(body)).await;
        assert_eq!(renamed.status, StatusCode::OK);
        assert_eq!(renamed.body["display_name"], "Ada");

        let body = json!({ "display_name": "\u{7}" });
        let invalid = send(&app, "PATCH", "/v1/me", Some(&member), Some(body)).await;
        assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);

        let forbidden = send(&app, "GET", "/v1/admin/identities", Some(&member), None).await;
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let listing = send(&app, "GET", "/v1/admin/identities", Some(&admin), None).await;
        assert_eq!(listing.status, StatusCode::OK);
        assert_eq!(listing.body["total"], 2);
        let roles: Vec<&str> = listing.body["identities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["role"].as_str().unwrap())
            .collect();
        assert!(roles.contains(&"admin") && roles.contains(&"member"));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = router(AppState::default());
        let reply = send(&app, "GET", "/health/live", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.headers.contains_key("x-request-id"));
    }
}
