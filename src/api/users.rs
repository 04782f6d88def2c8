// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Current-identity endpoints.

use axum::{extract::State, Json};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{IdentityResponse, UpdateProfileRequest};
use crate::state::AppState;
use crate::storage::{normalize_display_name, DISPLAY_NAME_MAX_CHARS};

/// Get the identity bound to the current session.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Identity",
    security(("session" = [])),
    responses(
        (status = 200, description = "Identity information", body = IdentityResponse),
        (status = 401, description = "No valid session"),
    )
)]
pub async fn get_current_identity(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let identity = state
        .directory
        .find_by_id(caller.identity_id)?
        .ok_or_else(|| ApiError::not_found("Identity not found"))?;
    Ok(Json(IdentityResponse::new(identity, caller.role)))
}

/// Update profile fields of the current identity.
///
/// The address is immutable; only the display name can change.
#[utoipa::path(
    patch,
    path = "/v1/me",
    tag = "Identity",
    security(("session" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated identity", body = IdentityResponse),
        (status = 401, description = "No valid session"),
        (status = 422, description = "Invalid display name"),
    )
)]
pub async fn update_current_identity(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let display_name = match request.display_name.as_deref() {
        Some(raw) => Some(normalize_display_name(raw).ok_or_else(|| {
            ApiError::unprocessable(format!(
                "display_name must be 1-{DISPLAY_NAME_MAX_CHARS} characters \
                 without control characters"
            ))
        })?),
        None => None,
    };

    let identity = state
        .directory
        .update_display_name(caller.identity_id, display_name)?;
    Ok(Json(IdentityResponse::new(identity, caller.role)))
}
