//! Defines the HTTP routes for user profile and management.

use super::handlers::{delete_user, get_user_by_id, list_users, me, update_me};
use crate::auth::middleware::{require_admin, require_user};
use axum::{
    Router,
    handler::Handler,
    middleware,
    routing::get,
};

pub fn user_router() -> Router {
    Router::new()
        .route(
            "/users",
            get(list_users).route_layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/users/me",
            get(me)
                .put(update_me)
                .route_layer(middleware::from_fn(require_user)),
        )
        .route(
            "/users/{id}",
            get(get_user_by_id.layer(middleware::from_fn(require_user)))
                .delete(delete_user.layer(middleware::from_fn(require_admin))),
        )
}
