//! Core business logic for the authentication system.

use crate::auth::models::*;
use crate::auth::password::PasswordHasher;
use crate::database::models::{CreateNewUser, User};
use crate::errors::ServiceResult;
use crate::services::user_service::UserService;
use crate::utils::jwt::{Claims, JwtUtils};
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

/// Authentication service for handling registration, login and token generation
pub struct AuthService<'a> {
    jwt_utils: &'a JwtUtils,
    user_service: UserService<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance
    pub fn new(pool: &'a SqlitePool, jwt_utils: &'a JwtUtils, hasher: PasswordHasher) -> Self {
        AuthService {
            jwt_utils,
            user_service: UserService::new(pool, hasher),
        }
    }

    /// Register a new (non-admin) user
    pub async fn register(&self, request: CreateNewUser) -> ServiceResult<User> {
        let user = self.user_service.create_user(request).await?;
        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Authenticate user and generate access and refresh tokens
    pub async fn login(&self, login_request: LoginRequest) -> ServiceResult<LoginResponse> {
        login_request.validate()?;

        let user = self
            .user_service
            .authenticate_user(&login_request.email, &login_request.password)
            .await?;

        let access_token = self
            .jwt_utils
            .issue_access_token(Claims::for_subject(user.id), None)?;
        let refresh_token = self
            .jwt_utils
            .issue_refresh_token(Claims::for_subject(user.id))?;

        let expires_in = self.jwt_utils.access_token_ttl().num_seconds().max(0) as u64;

        info!(
            "User {} logged in, refresh token valid for {} days",
            user.id,
            self.jwt_utils.refresh_token_ttl().num_days()
        );

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in,
            user,
        })
    }
}
