//! Database operations for the shop `PostgreSQL` database.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `users` - Accounts and their password hashes
//! - `categories` - Product categories (self-referencing hierarchy)
//! - `products` / `product_images` - Catalog
//! - `orders` / `order_items` - Placed orders and their line snapshots
//! - `settings` - Store configuration blobs (JSONB)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/`, embedded as
//! [`MIGRATOR`], and run via:
//! ```bash
//! cargo run -p beauty-shop-cli -- migrate
//! ```

pub mod categories;
pub mod customers;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// The transaction lost a deadlock or serialization race and may be
    /// retried from the start.
    #[error("transaction contention: {0}")]
    Contention(#[source] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        let contention = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .is_some_and(|code| code == DEADLOCK_DETECTED || code == SERIALIZATION_FAILURE);

        if contention {
            Self::Contention(err)
        } else {
            Self::Database(err)
        }
    }
}

impl RepositoryError {
    /// Map a unique violation to `Conflict(what)`, anything else as usual.
    pub(crate) fn unique_or(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(what.to_owned());
        }
        Self::from(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a non-negative `INTEGER` column to `u32`.
pub(crate) fn non_negative(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}
