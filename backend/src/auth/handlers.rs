//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for registration and login,
//! validate input, and delegate to [`AuthService`] for the business logic.

use crate::api::common::{ApiResponse, HttpError, service_error_to_http, validation_error_response};
use crate::app::AppState;
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::database::models::{CreateNewUser, User};
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use validator::Validate;

/// Handle user registration request
#[axum::debug_handler]
pub async fn register(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateNewUser>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), HttpError> {
    if let Err(errors) = payload.validate() {
        return Err(validation_error_response(errors));
    }

    let auth_service = AuthService::new(&state.pool, &state.jwt, state.hasher);

    match auth_service.register(payload).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(user, "User registered successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    let auth_service = AuthService::new(&state.pool, &state.jwt, state.hasher);

    match auth_service.login(payload).await {
        Ok(response) => Ok(Json(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request (client-side token invalidation)
#[axum::debug_handler]
pub async fn logout() -> Json<ApiResponse<()>> {
    // Tokens are stateless; the client discards them.
    Json(ApiResponse::success((), "Logged out successfully"))
}
