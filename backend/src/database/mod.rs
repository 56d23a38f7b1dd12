//! Module for database connection setup and common utilities.
//!
//! This module is responsible for initializing the database connection pool,
//! applying the embedded migrations and optionally seeding development data.

use crate::auth::password::PasswordHasher;
use crate::config::Config;
use crate::database::models::CreateUser;
use crate::repositories::user_repository::UserRepository;
use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

pub mod models;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Initializes the database connection pool and runs pending migrations.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.database_url)
            .await?;

        let db = Database { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Database { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts the development accounts when the users table is empty.
    ///
    /// Returns the number of users created.
    pub async fn seed(&self, hasher: &PasswordHasher) -> Result<usize> {
        let repo = UserRepository::new(&self.pool);

        let existing = repo.count_users().await?;
        if existing > 0 {
            info!("Database already has {} users, skipping seed", existing);
            return Ok(0);
        }

        let seed_users = [
            ("admin@example.com", "Pam Riordan", "4808675309", "admin123", true),
            ("john@example.com", "john", "1234567890", "password123", false),
            ("jane@example.com", "jane", "0987654321", "password123", false),
            ("inactive@example.com", "inactive", "0000000000", "password123", false),
        ];

        for (email, name, phone, password, admin) in seed_users {
            let hashed_password = hasher.hash_password(password)?;

            repo.create_user(CreateUser {
                email: email.to_string(),
                name: Some(name.to_string()),
                phone: Some(phone.to_string()),
                hashed_password,
                admin,
            })
            .await?;
        }

        info!("Seeded database with {} users", seed_users.len());
        Ok(seed_users.len())
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_only_runs_on_empty_table() {
        let db = Database::in_memory().await.unwrap();
        let hasher = PasswordHasher::new(4);

        assert_eq!(db.seed(&hasher).await.unwrap(), 4);
        assert_eq!(db.seed(&hasher).await.unwrap(), 0);

        let repo = UserRepository::new(db.pool());
        let admin = repo
            .get_user_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.admin);
        assert!(hasher.verify_password("admin123", &admin.hashed_password));

        let inactive = repo
            .get_user_by_email("inactive@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(!inactive.admin);
        assert_eq!(inactive.phone.as_deref(), Some("0000000000"));
    }
}
