//! Authentication and authorization failures.
//!
//! Every failure of the access gate is exactly one of two kinds:
//! `Unauthenticated` (401) or `Forbidden` (403). The reason attached to
//! `Unauthenticated` is for server-side diagnostics only and is never sent to
//! the client, with the exception of a missing credential.

use crate::api::common::ApiResponse;
use axum::{
    Json,
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Why a bearer token failed to authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnauthenticatedReason {
    #[error("no bearer token provided")]
    MissingCredential,
    #[error("token signature or structure is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token claims are malformed")]
    MalformedClaims,
    #[error("token subject does not match any user")]
    UnknownSubject,
    #[error("user lookup failed")]
    LookupFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(UnauthenticatedReason),
    #[error("forbidden")]
    Forbidden,
}

impl From<UnauthenticatedReason> for AuthError {
    fn from(reason: UnauthenticatedReason) -> Self {
        AuthError::Unauthenticated(reason)
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    /// The message shown to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential) => {
                "No Bearer token provided"
            }
            AuthError::Unauthenticated(_) => "Could not validate credentials",
            AuthError::Forbidden => "The user doesn't have enough privileges",
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated(_) => "unauthorized",
            AuthError::Forbidden => "forbidden",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(
            self.public_message(),
            self.error_type(),
            None,
        ));

        match self {
            AuthError::Unauthenticated(_) => (
                self.status_code(),
                [(WWW_AUTHENTICATE, "Bearer")],
                body,
            )
                .into_response(),
            AuthError::Forbidden => (self.status_code(), body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthenticated_reasons_share_one_message() {
        for reason in [
            UnauthenticatedReason::InvalidSignature,
            UnauthenticatedReason::Expired,
            UnauthenticatedReason::MalformedClaims,
            UnauthenticatedReason::UnknownSubject,
            UnauthenticatedReason::LookupFailed,
        ] {
            let response = AuthError::from(reason).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");

            let json = body_json(response).await;
            assert_eq!(json["message"], "Could not validate credentials");
            assert_eq!(json["success"], false);
            assert_eq!(json["error"]["error_type"], "unauthorized");
        }
    }

    #[tokio::test]
    async fn test_missing_credential_is_distinct() {
        let response =
            AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
        assert_eq!(body_json(response).await["message"], "No Bearer token provided");
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_403() {
        let response = AuthError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());

        let json = body_json(response).await;
        assert_eq!(json["message"], "The user doesn't have enough privileges");
        assert_eq!(json["error"]["error_type"], "forbidden");
    }
}
