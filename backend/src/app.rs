//! Application state and router assembly.
//!
//! [`AppState`] carries the connection pool and the authentication components
//! built once from [`Config`]; [`router`] wires every route under the
//! configured API prefix and attaches the state as a request extension.

use crate::api::common::ApiResponse;
use crate::auth::guard::AccessGate;
use crate::auth::password::PasswordHasher;
use crate::auth::routes::auth_router;
use crate::api::user::routes::user_router;
use crate::config::Config;
use crate::repositories::user_repository::UserStore;
use crate::utils::jwt::JwtUtils;
use axum::{
    Extension, Router,
    http::HeaderValue,
    response::Json,
    routing::get,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Shared state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtUtils>,
    pub gate: Arc<AccessGate>,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let jwt = Arc::new(JwtUtils::new(&config.auth));
        let store = Arc::new(UserStore::new(pool.clone()));
        let gate = Arc::new(AccessGate::new(jwt.clone(), store));
        let hasher = PasswordHasher::new(config.auth.bcrypt_cost);

        AppState {
            pool,
            config: Arc::new(config),
            jwt,
            gate,
            hasher,
        }
    }
}

/// Assembles the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new().merge(auth_router()).merge(user_router());

    let prefix = state.config.api_prefix.trim_end_matches('/');
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler));

    app = if prefix.is_empty() {
        app.merge(api)
    } else {
        app.nest(prefix, api)
    };

    if let Some(cors) = cors_layer(&state.config.cors_origins) {
        app = app.layer(cors);
    }

    app.layer(Extension(state))
}

/// Serves the application until `shutdown` resolves, then drains open connections.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// CORS for the configured origins, or `None` when no origin is configured.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    if origins.iter().any(|origin| origin == "*") {
        return Some(layer.allow_origin(AllowOrigin::any()));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        layer
            .allow_origin(AllowOrigin::list(allowed))
            .allow_credentials(true),
    )
}

async fn root_handler(Extension(state): Extension<AppState>) -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        json!({
            "service": state.config.project_name,
            "version": env!("CARGO_PKG_VERSION"),
        }),
        format!("Welcome to {} API", state.config.project_name),
    ))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
