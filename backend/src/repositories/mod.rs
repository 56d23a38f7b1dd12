//! Data access layer.
//!
//! Each repository wraps the SQLite pool and owns the SQL for one table.

pub mod user_repository;
