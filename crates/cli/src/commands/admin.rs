//! Administrator account commands.
//!
//! # Usage
//!
//! ```bash
//! SHOP_ADMIN_PASSWORD='...' bs-cli admin create -e admin@example.com -n "Admin Name"
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SHOP_ADMIN_PASSWORD` - Password for the new account

use beauty_shop_api::db::{RepositoryError, UserRepository, create_pool};
use beauty_shop_api::services::auth::{AuthError, hash_password, validate_password};
use beauty_shop_core::{Email, Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password rejected or could not be hashed.
    #[error("{0}")]
    Password(#[from] AuthError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("{0}")]
    Repository(RepositoryError),
}

/// Create a new administrator.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_user(email: &str, name: Option<&str>) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email.trim()).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let password = std::env::var("SHOP_ADMIN_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| AdminError::MissingEnvVar("SHOP_ADMIN_PASSWORD"))?;
    validate_password(password.expose_secret())?;
    let password_hash = hash_password(password.expose_secret())?;

    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("SHOP_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Creating admin user: {}", email);

    let user = UserRepository::new(&pool)
        .create(&email, name, &password_hash, Role::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}
