//! Category repository.
//!
//! Writes that set a parent lock every category row and validate the change
//! against the whole parent graph inside the same transaction, so two
//! concurrent re-parent operations cannot jointly create a cycle.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use beauty_shop_core::{CategoryId, CategoryTree, CategoryTreeError, slugify};

use super::RepositoryError;
use crate::models::{Category, CategoryDetail};

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, image, parent_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    description: Option<String>,
    image: Option<String>,
    parent_id: Option<CategoryId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            slug: r.slug,
            description: r.description,
            image: r.image,
            parent_id: r.parent_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Errors from category writes.
#[derive(Debug, Error)]
pub enum CategoryWriteError {
    /// The parent assignment would break the hierarchy.
    #[error(transparent)]
    Tree(#[from] CategoryTreeError),

    #[error("Category name is required")]
    MissingName,

    #[error("Category slug must contain letters or digits")]
    InvalidSlug,

    #[error("Category not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CategoryWriteError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// Fields for a new category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    /// Derived from `name` when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// Partial update of a category.
///
/// For the nullable fields, an absent key leaves the value unchanged and an
/// explicit `null` clears it (`parentId: null` detaches from the parent).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub parent_id: Option<Option<CategoryId>>,
}

/// Marks a key that appeared in the body, even as `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories ORDER BY name, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by slug with its parent and direct children.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<CategoryDetail>, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(category) = row.map(Category::from) else {
            return Ok(None);
        };

        let parent = match category.parent_id {
            Some(parent_id) => {
                let row: Option<CategoryRow> = sqlx::query_as(&format!(
                    "SELECT {CATEGORY_COLUMNS} FROM shop.categories WHERE id = $1"
                ))
                .bind(parent_id)
                .fetch_optional(self.pool)
                .await?;
                row.map(Category::from)
            }
            None => None,
        };

        let children: Vec<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories WHERE parent_id = $1 ORDER BY name, id"
        ))
        .bind(category.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(CategoryDetail {
            category,
            parent,
            children: children.into_iter().map(Category::from).collect(),
        }))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryWriteError::Tree` if the parent does not exist.
    /// Returns `RepositoryError::Conflict` (wrapped) if the slug is taken.
    pub async fn create(&self, new: &NewCategory) -> Result<Category, CategoryWriteError> {
        let name = normalize_name(&new.name)?;
        let slug = normalize_slug(new.slug.as_deref().unwrap_or(&name))?;

        let mut tx = self.pool.begin().await?;
        let tree = lock_tree(&mut tx).await?;
        // The id is assigned by the database; a fresh one stands in for it.
        tree.check_reparent(CategoryId::generate(), new.parent_id)?;

        let row: CategoryRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shop.categories (name, slug, description, image, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(&name)
        .bind(&slug)
        .bind(new.description.as_deref())
        .bind(new.image.as_deref())
        .bind(new.parent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_or(e, "category slug already exists"))?;

        tx.commit().await?;

        tracing::info!(category_id = %row.id, slug = %row.slug, "Category created");
        Ok(row.into())
    }

    /// Apply a partial update to a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryWriteError::NotFound` if the category does not exist.
    /// Returns `CategoryWriteError::Tree` if the new parent is the category
    /// itself, one of its descendants, or unknown.
    pub async fn update(
        &self,
        id: CategoryId,
        changes: &CategoryUpdate,
    ) -> Result<Category, CategoryWriteError> {
        let mut tx = self.pool.begin().await?;
        let tree = lock_tree(&mut tx).await?;

        let current: CategoryRow = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CategoryWriteError::NotFound)?;

        let parent_id = match changes.parent_id {
            Some(new_parent) => {
                tree.check_reparent(id, new_parent)?;
                new_parent
            }
            None => current.parent_id,
        };

        let name = match &changes.name {
            Some(name) => normalize_name(name)?,
            None => current.name,
        };
        let slug = match &changes.slug {
            Some(slug) => normalize_slug(slug)?,
            None => current.slug,
        };
        let description = changes.description.clone().unwrap_or(current.description);
        let image = changes.image.clone().unwrap_or(current.image);

        let row: CategoryRow = sqlx::query_as(&format!(
            r"
            UPDATE shop.categories
            SET name = $2, slug = $3, description = $4, image = $5, parent_id = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&name)
        .bind(&slug)
        .bind(description.as_deref())
        .bind(image.as_deref())
        .bind(parent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_or(e, "category slug already exists"))?;

        tx.commit().await?;

        tracing::info!(category_id = %id, "Category updated");
        Ok(row.into())
    }
}

/// Lock every category row and load the parent graph.
async fn lock_tree(conn: &mut PgConnection) -> Result<CategoryTree, RepositoryError> {
    let edges: Vec<(CategoryId, Option<CategoryId>)> =
        sqlx::query_as("SELECT id, parent_id FROM shop.categories ORDER BY id FOR UPDATE")
            .fetch_all(conn)
            .await?;

    Ok(CategoryTree::from_edges(edges))
}

fn normalize_name(name: &str) -> Result<String, CategoryWriteError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryWriteError::MissingName);
    }
    Ok(name.to_owned())
}

fn normalize_slug(raw: &str) -> Result<String, CategoryWriteError> {
    let slug = slugify(raw);
    if slug.is_empty() {
        return Err(CategoryWriteError::InvalidSlug);
    }
    Ok(slug)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: CategoryUpdate = serde_json::from_str(r#"{"name": "Lips"}"#).unwrap();
        assert_eq!(absent.parent_id, None);

        let detach: CategoryUpdate = serde_json::from_str(r#"{"parentId": null}"#).unwrap();
        assert_eq!(detach.parent_id, Some(None));

        let id = CategoryId::generate();
        let attach: CategoryUpdate =
            serde_json::from_str(&format!(r#"{{"parentId": "{id}"}}"#)).unwrap();
        assert_eq!(attach.parent_id, Some(Some(id)));
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("Face Masks").unwrap(), "face-masks");
        assert!(matches!(
            normalize_slug("!!!"),
            Err(CategoryWriteError::InvalidSlug)
        ));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Skincare ").unwrap(), "Skincare");
        assert!(matches!(
            normalize_name("   "),
            Err(CategoryWriteError::MissingName)
        ));
    }
}
