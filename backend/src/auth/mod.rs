//! Authentication module for managing user credentials, tokens and access control.
//!
//! This module provides password hashing, the bearer-token access gate and role
//! guards, the middleware adapting them to axum, and the login/registration
//! endpoints.

pub mod errors;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod service;
