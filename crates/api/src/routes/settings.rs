//! Public store settings.

use axum::{Json, extract::State};
use serde_json::Value;

use crate::db::settings::{STORE_SETTINGS_KEY, get_setting};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// The `"store"` settings blob.
pub async fn show(State(state): State<AppState>) -> Result<Json<Value>> {
    get_setting(state.pool(), STORE_SETTINGS_KEY)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Settings not found".to_owned()))
}
