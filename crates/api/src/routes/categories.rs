//! Category route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryDetail};
use crate::state::AppState;

/// All categories, ordered by name.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

/// A category with its parent and direct children.
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetail>> {
    CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_owned()))
}
