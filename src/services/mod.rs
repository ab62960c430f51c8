//! External collaborators
//!
//! This module contains the authentication provider the session host signs
//! users in and out with.

pub mod auth;

// Re-export main types
pub use auth::{AuthProvider, LocalAuth, User};
