// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin endpoints. All require the admin role.

use axum::{extract::State, Json};

use crate::auth::AdminOnly;
use crate::error::ApiError;
use crate::models::{IdentityResponse, ListIdentitiesResponse};
use crate::state::AppState;

/// List every identity, oldest first.
#[utoipa::path(
    get,
    path = "/v1/admin/identities",
    tag = "Admin",
    security(("session" = [])),
    responses(
        (status = 200, description = "All identities", body = ListIdentitiesResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn list_identities(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<ListIdentitiesResponse>, ApiError> {
    let identities: Vec<IdentityResponse> = state
        .directory
        .list()?
        .into_iter()
        .map(|identity| {
            let role = state.auth_config.role_for(&identity.address);
            IdentityResponse::new(identity, role)
        })
        .collect();

    tracing::info!(
        admin_id = %admin.identity_id,
        count = identities.len(),
        "admin listed identities"
    );

    Ok(Json(ListIdentitiesResponse {
        total: identities.len(),
        identities,
    }))
}
