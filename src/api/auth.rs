// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge-response endpoints.
//!
//! `{scheme}` selects the verifier. A proof is never checked against another
//! scheme's rules, whatever its bytes look like.

use alloy::hex;
use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
    Json,
};

use crate::auth::session::token_from_headers;
use crate::auth::verify::SignatureProof;
use crate::auth::AuthError;
use crate::models::{
    DisconnectResponse, IntroduceRequest, IntroduceResponse, ProveRequest, ProveResponse,
};
use crate::state::AppState;

/// Request a challenge for a wallet address.
///
/// Creates the identity on first contact. Any earlier unproven challenge for
/// the address stops being provable.
#[utoipa::path(
    post,
    path = "/v1/auth/{scheme}/introduce",
    tag = "Auth",
    params(("scheme" = String, Path, description = "Signature scheme: `evm` or `cardano`")),
    request_body = IntroduceRequest,
    responses(
        (status = 200, description = "Challenge issued", body = IntroduceResponse),
        (status = 400, description = "Malformed address"),
        (status = 404, description = "Scheme not available"),
        (status = 500, description = "Challenge template unavailable"),
    )
)]
pub async fn introduce(
    State(state): State<AppState>,
    Path(scheme): Path<String>,
    Json(request): Json<IntroduceRequest>,
) -> Result<Json<IntroduceResponse>, AuthError> {
    let scheme = state.protocol.scheme(&scheme)?;
    let intro = state.protocol.introduce(scheme, &request.address)?;
    Ok(Json(intro.into()))
}

/// Prove control of the address by signing the current challenge.
///
/// On success a new session is bound to the identity and delivered as the
/// `wallet_session` cookie. Any session presented with this request is
/// destroyed first.
#[utoipa::path(
    post,
    path = "/v1/auth/{scheme}/prove",
    tag = "Auth",
    params(("scheme" = String, Path, description = "Signature scheme: `evm` or `cardano`")),
    request_body = ProveRequest,
    responses(
        (status = 200, description = "Session established", body = ProveResponse),
        (status = 400, description = "Malformed address"),
        (status = 401, description = "Verification failed"),
        (status = 404, description = "Unknown address or scheme not available"),
    )
)]
pub async fn prove(
    State(state): State<AppState>,
    Path(scheme): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ProveRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let scheme = state.protocol.scheme(&scheme)?;

    // Undecodable hex fails verification as malformed input.
    let proof = SignatureProof {
        signature: hex::decode(request.signature.trim()).unwrap_or_default(),
        key: request
            .key
            .as_deref()
            .and_then(|key| hex::decode(key.trim()).ok()),
    };

    let identity = state
        .protocol
        .prove(scheme, &request.address, proof)
        .await?;

    let previous = token_from_headers(&headers);
    let session = state.sessions.bind(identity.id, previous.as_deref())?;

    let response = ProveResponse {
        session_established: true,
        identity_id: identity.id,
        role: state.auth_config.role_for(&identity.address),
        address: identity.address,
        expires_at: session.record.expires_at,
    };

    Ok((
        [(SET_COOKIE, state.sessions.session_cookie(&session.token))],
        Json(response),
    ))
}

/// End the current session.
///
/// Always answers with an expiring cookie, with or without a live session.
#[utoipa::path(
    post,
    path = "/v1/auth/disconnect",
    tag = "Auth",
    responses(
        (status = 200, description = "Session cleared", body = DisconnectResponse),
    )
)]
pub async fn disconnect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let session_cleared = match token_from_headers(&headers) {
        Some(token) => {
            let live = state.sessions.resolve(&token)?.is_some();
            state.sessions.clear(&token)?;
            live
        }
        None => false,
    };

    Ok((
        [(SET_COOKIE, state.sessions.expired_cookie())],
        Json(DisconnectResponse { session_cleared }),
    ))
}
