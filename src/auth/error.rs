// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::session::SessionStoreError;
use crate::storage::DirectoryError;

/// Authentication error type.
///
/// Every signature check failure surfaces as [`AuthError::VerificationFailed`].
#[derive(Debug)]
pub enum AuthError {
    /// Address is malformed for the active scheme
    InvalidAddress(String),
    /// Prove called for an address that was never introduced
    UnknownAddress,
    /// Challenge template could not be read
    ChallengeUnavailable(String),
    /// Signature, payload or address check failed
    VerificationFailed,
    /// Scheme is unknown or not enabled on this deployment
    SchemeUnavailable(String),
    /// No valid session presented
    Unauthenticated,
    /// Session is valid but lacks the required role
    Forbidden,
    /// Session store failure
    SessionError(String),
    /// Identity directory failure
    Storage(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidAddress(_) => "invalid_address",
            AuthError::UnknownAddress => "unknown_address",
            AuthError::ChallengeUnavailable(_) => "challenge_unavailable",
            AuthError::VerificationFailed => "verification_failed",
            AuthError::SchemeUnavailable(_) => "scheme_unavailable",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden => "forbidden",
            AuthError::SessionError(_) => "session_error",
            AuthError::Storage(_) => "storage_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            AuthError::UnknownAddress | AuthError::SchemeUnavailable(_) => StatusCode::NOT_FOUND,
            AuthError::VerificationFailed | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::ChallengeUnavailable(_)
            | AuthError::SessionError(_)
            | AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidAddress(msg) => write!(f, "Invalid address: {msg}"),
            AuthError::UnknownAddress => {
                write!(f, "Unknown address; request a challenge first")
            }
            AuthError::ChallengeUnavailable(_) => write!(f, "Challenge is temporarily unavailable"),
            AuthError::VerificationFailed => write!(f, "Signature verification failed"),
            AuthError::SchemeUnavailable(scheme) => {
                write!(f, "Signature scheme '{scheme}' is not available")
            }
            AuthError::Unauthenticated => write!(f, "Authentication required"),
            AuthError::Forbidden => write!(f, "Insufficient permissions for this operation"),
            // Internal details stay in the logs
            AuthError::SessionError(_) => write!(f, "Session store error"),
            AuthError::Storage(_) => write!(f, "Internal storage error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<DirectoryError> for AuthError {
    fn from(e: DirectoryError) -> Self {
        AuthError::Storage(e.to_string())
    }
}

impl From<SessionStoreError> for AuthError {
    fn from(e: SessionStoreError) -> Self {
        AuthError::SessionError(e.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AuthError::ChallengeUnavailable(detail)
            | AuthError::SessionError(detail)
            | AuthError::Storage(detail) => {
                tracing::error!(error_code = self.error_code(), detail = %detail, "request failed");
            }
            _ => {}
        }
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn verification_failure_returns_401_without_detail() {
        let response = AuthError::VerificationFailed.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "verification_failed");
        assert_eq!(body["error"], "Signature verification failed");
    }

    #[tokio::test]
    async fn storage_error_is_opaque() {
        let response = AuthError::Storage("redb table error: secret path".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("secret path"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AuthError::InvalidAddress("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::UnknownAddress.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::ChallengeUnavailable("io".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
