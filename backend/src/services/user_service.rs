//! User business logic service.
//!
//! Handles all user-related business operations: registration, credential
//! checks and the profile/admin CRUD exposed by the users API.

use crate::auth::password::PasswordHasher;
use crate::database::models::{CreateNewUser, CreateUser, ListUsersQuery, UpdateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::{UserRepository, unique_violation};
use sqlx::SqlitePool;
use validator::Validate;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    hasher: PasswordHasher,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    /// * `hasher` - Password hasher used for new accounts and logins
    pub fn new(pool: &'a SqlitePool, hasher: PasswordHasher) -> Self {
        Self { pool, hasher }
    }

    /// Creates a new user with full validation.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation failures
    /// - An email or phone number that is already registered
    pub async fn create_user(&self, create_user: CreateNewUser) -> ServiceResult<User> {
        create_user.validate()?;

        let repo = UserRepository::new(self.pool);

        if repo.email_exists(&create_user.email, None).await? {
            return Err(ServiceError::already_exists("User", "email"));
        }

        if let Some(phone) = &create_user.phone {
            if repo.phone_exists(phone, None).await? {
                return Err(ServiceError::already_exists("User", "phone number"));
            }
        }

        let hashed_password = self.hasher.hash_password(&create_user.password)?;

        let data = CreateUser {
            email: create_user.email,
            name: create_user.name,
            phone: create_user.phone,
            hashed_password,
            admin: false,
        };

        // A concurrent registration can still win between the checks and the insert.
        let user = repo.create_user(data).await.map_err(write_error)?;
        Ok(user)
    }

    /// Checks an email/password pair.
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn authenticate_user(&self, email: &str, password: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);

        match repo.get_user_by_email(email).await? {
            Some(user) if self.hasher.verify_password(password, &user.hashed_password) => Ok(user),
            _ => Err(ServiceError::unauthorized("Invalid email or password")),
        }
    }

    /// Retrieves a user by ID with existence verification.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if user doesn't exist
    pub async fn get_user_required(&self, id: i64) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id.to_string()))?;
        Ok(user)
    }

    /// Lists users for the admin index.
    ///
    /// # Returns
    /// The requested page and the total number of users
    pub async fn list_users(&self, query: &ListUsersQuery) -> ServiceResult<(Vec<User>, u64)> {
        query.validate()?;

        let repo = UserRepository::new(self.pool);
        let users = repo.list_users(query.skip(), query.limit()).await?;
        let total = repo.count_users().await?;

        Ok((users, total))
    }

    /// Applies a profile update to `current`.
    ///
    /// # Errors
    /// Returns `ServiceError` for validation failures or when the new email or
    /// phone number belongs to another user
    pub async fn update_user(&self, current: User, update: UpdateUser) -> ServiceResult<User> {
        update.validate()?;

        let repo = UserRepository::new(self.pool);

        if let Some(email) = &update.email {
            if repo.email_exists(email, Some(current.id)).await? {
                return Err(ServiceError::already_exists("User", "email"));
            }
        }

        if let Some(phone) = &update.phone {
            if repo.phone_exists(phone, Some(current.id)).await? {
                return Err(ServiceError::already_exists("User", "phone number"));
            }
        }

        let mut user = current;
        update.apply_to(&mut user);

        let id = user.id;
        repo.update_user(&user)
            .await
            .map_err(write_error)?
            .ok_or_else(|| ServiceError::not_found("User", id.to_string()))
    }

    /// Deletes a user by id and returns the removed record.
    pub async fn delete_user(&self, id: i64) -> ServiceResult<User> {
        let user = self.get_user_required(id).await?;

        let repo = UserRepository::new(self.pool);
        if !repo.delete_user(id).await? {
            return Err(ServiceError::not_found("User", id.to_string()));
        }

        Ok(user)
    }
}

/// Maps a failed write, turning UNIQUE violations into `AlreadyExists`.
fn write_error(error: anyhow::Error) -> ServiceError {
    match unique_violation(&error) {
        Some(field) => ServiceError::already_exists("User", field),
        None => ServiceError::from(error),
    }
}
