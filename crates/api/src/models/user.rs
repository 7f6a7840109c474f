//! User domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use beauty_shop_core::{Email, Role, UserId};

/// A shop account.
///
/// The password hash is never part of this type; it is only read by the
/// login path through [`crate::db::users::UserRepository::get_credentials`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
