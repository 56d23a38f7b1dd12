//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Request DTOs carry `validator` rules and are checked by
//! the service layer before anything reaches the repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A registered user; the principal every access token resolves to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Never leaves the server.
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration payload received from the API.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNewUser {
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1-255 characters"
    ))]
    pub name: Option<String>,

    #[validate(length(
        min = 7,
        max = 20,
        message = "Phone must be between 7-20 characters"
    ))]
    pub phone: Option<String>,
}

/// Insert payload handed to the repository once the password is hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub hashed_password: String,
    pub admin: bool,
}

/// Partial update of the caller's own profile. Absent fields are left as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1-255 characters"
    ))]
    pub name: Option<String>,

    #[validate(length(
        min = 7,
        max = 20,
        message = "Phone must be between 7-20 characters"
    ))]
    pub phone: Option<String>,
}

impl UpdateUser {
    /// Applies every present field onto `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(name) = &self.name {
            user.name = Some(name.clone());
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
    }
}

/// Listing parameters for the admin user index.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListUsersQuery {
    #[validate(range(min = 0))]
    pub skip: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl ListUsersQuery {
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100)
    }
}
