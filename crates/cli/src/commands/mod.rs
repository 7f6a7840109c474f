//! CLI subcommands.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;

/// Database URL from `SHOP_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Option<SecretString> {
    std::env::var("SHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
