//! Database repository for user management operations.
//!
//! Provides CRUD operations for system users, plus the SQLite-backed
//! [`PrincipalStore`] the access gate resolves token subjects through.

use crate::auth::guard::PrincipalStore;
use crate::database::models::{CreateUser, User};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const USER_COLUMNS: &str =
    "id, email, name, phone, hashed_password, admin, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// # Arguments
    /// * `user` - CreateUser DTO containing user details
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO users (email, name, phone, hashed_password, admin, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.email)
            .bind(user.name)
            .bind(user.phone)
            .bind(user.hashed_password)
            .bind(user.admin)
            .bind(now)
            .bind(now)
            .fetch_one(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their email.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Checks if an email already exists, optionally ignoring one user.
    pub async fn email_exists(&self, email: &str, exclude_user_id: Option<i64>) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
                .bind(email)
                .bind(exclude_user_id.unwrap_or(-1))
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Checks if a phone number already exists, optionally ignoring one user.
    pub async fn phone_exists(&self, phone: &str, exclude_user_id: Option<i64>) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE phone = ? AND id != ?")
                .bind(phone)
                .bind(exclude_user_id.unwrap_or(-1))
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Lists users ordered by id.
    ///
    /// # Arguments
    /// * `skip` - Number of rows to skip
    /// * `limit` - Maximum number of rows returned
    pub async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users ORDER BY id ASC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(skip)
            .fetch_all(self.pool)
            .await?;

        Ok(users)
    }

    /// Get total count of users
    pub async fn count_users(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }

    /// Persists the mutable profile fields of `user`.
    ///
    /// # Returns
    /// The stored row after the update, `None` if the user no longer exists
    pub async fn update_user(&self, user: &User) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users SET email = ?, name = ?, phone = ?, admin = ?, updated_at = ? \
             WHERE id = ? RETURNING {}",
            USER_COLUMNS
        );

        let updated = sqlx::query_as::<_, User>(&query)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.phone)
            .bind(user.admin)
            .bind(Utc::now())
            .bind(user.id)
            .fetch_optional(self.pool)
            .await?;

        Ok(updated)
    }

    /// Deletes a user by id.
    ///
    /// # Returns
    /// `true` if a row was removed
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Returns the unique column a failed insert or update collided with.
///
/// `None` when `error` is not a UNIQUE constraint violation.
pub fn unique_violation(error: &anyhow::Error) -> Option<&'static str> {
    match error.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
            if db_error.message().contains("users.phone") {
                Some("phone number")
            } else {
                Some("email")
            }
        }
        _ => None,
    }
}

/// Owned-pool principal lookup used by the access gate.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalStore for UserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        UserRepository::new(&self.pool).get_user_by_id(id).await
    }
}
