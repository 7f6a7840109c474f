//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format (registration only; login never reveals this).
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] beauty_shop_core::EmailError),

    /// Invalid credentials (wrong password, unknown email, or no password set).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The token names a user that no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Bearer token could not be issued or verified.
    #[error("token error: {0}")]
    Token(#[from] super::tokens::TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
