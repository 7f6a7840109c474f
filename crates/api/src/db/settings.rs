//! Settings database operations.
//!
//! Settings are free-form JSON blobs addressed by key. The storefront reads
//! the `"store"` key for its name, currency, tax, and shipping rules.

use serde_json::Value as JsonValue;
use sqlx::PgExecutor;

use super::RepositoryError;

/// Key of the store configuration blob.
pub const STORE_SETTINGS_KEY: &str = "store";

/// Get a setting value.
///
/// Accepts a pool or an open transaction, so the checkout can read settings
/// inside its own transaction.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn get_setting<'e>(
    executor: impl PgExecutor<'e>,
    key: &str,
) -> Result<Option<JsonValue>, RepositoryError> {
    let value = sqlx::query_scalar("SELECT value FROM shop.settings WHERE key = $1")
        .bind(key)
        .fetch_optional(executor)
        .await?;

    Ok(value)
}

/// Insert or replace a setting value, returning what was stored.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn set_setting<'e>(
    executor: impl PgExecutor<'e>,
    key: &str,
    value: &JsonValue,
) -> Result<JsonValue, RepositoryError> {
    let stored = sqlx::query_scalar(
        r"
        INSERT INTO shop.settings (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
        RETURNING value
        ",
    )
    .bind(key)
    .bind(value)
    .fetch_one(executor)
    .await?;

    Ok(stored)
}
