//! Collection of general utility functions and common traits.
//!
//! This module holds small, reusable pieces that do not belong to a single
//! domain module: the clock abstraction and JWT encoding/decoding.

pub mod clock;
pub mod jwt;
