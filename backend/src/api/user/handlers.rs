//! Handler functions for user profile and management API endpoints.
//!
//! Every handler here sits behind either the authenticated or the admin
//! middleware, which leaves the resolved caller in the request as
//! [`CurrentUser`].

use crate::api::common::{
    ApiResponse, HttpError, PaginatedData, service_error_to_http, validation_error_response,
};
use crate::app::AppState;
use crate::auth::middleware::CurrentUser;
use crate::database::models::{ListUsersQuery, UpdateUser, User};
use crate::services::user_service::UserService;
use axum::extract::{Extension, Json, Path, Query};
use validator::Validate;

/// Lists users. Admin only.
#[axum::debug_handler]
pub async fn list_users(
    Extension(state): Extension<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<PaginatedData<User>>>, HttpError> {
    if let Err(errors) = query.validate() {
        return Err(validation_error_response(errors));
    }

    tracing::info!(
        "Listing users (skip={}, limit={}) for admin {}",
        query.skip(),
        query.limit(),
        admin.id
    );

    let user_service = UserService::new(&state.pool, state.hasher);
    let (items, total) = user_service
        .list_users(&query)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::ok(PaginatedData {
        items,
        total,
        skip: query.skip(),
        limit: query.limit(),
    })))
}

/// Returns the authenticated caller.
#[axum::debug_handler]
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(user))
}

/// Updates the caller's own email, name or phone.
#[axum::debug_handler]
pub async fn update_me(
    Extension(state): Extension<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<ApiResponse<User>>, HttpError> {
    if let Err(errors) = payload.validate() {
        return Err(validation_error_response(errors));
    }

    let user_service = UserService::new(&state.pool, state.hasher);
    let updated = user_service
        .update_user(user, payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        updated,
        "User updated successfully",
    )))
}

/// Retrieves a user by its ID.
#[axum::debug_handler]
pub async fn get_user_by_id(
    Extension(state): Extension<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<User>>, HttpError> {
    tracing::info!("Getting user by ID: {} for user: {}", id, caller.id);

    let user_service = UserService::new(&state.pool, state.hasher);
    let user = user_service
        .get_user_required(id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        user,
        "User retrieved successfully",
    )))
}

/// Deletes a user. Admin only.
#[axum::debug_handler]
pub async fn delete_user(
    Extension(state): Extension<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<User>>, HttpError> {
    let user_service = UserService::new(&state.pool, state.hasher);
    let user = user_service
        .delete_user(id)
        .await
        .map_err(service_error_to_http)?;

    tracing::info!("User {} deleted by admin {}", user.id, admin.id);
    Ok(Json(ApiResponse::success(user, "User deleted successfully")))
}
