//! Product repository: catalog reads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use beauty_shop_core::{CategoryId, Cents, ProductId, ProductImageId};

use super::RepositoryError;
use crate::models::{PageParams, Product, ProductCategory, ProductImage};

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.slug, p.description, p.price, p.original_price,
           p.category_id, c.name AS category_name, c.slug AS category_slug,
           p.featured, p.in_stock, p.stock_quantity, p.sku,
           p.created_at, p.updated_at
    FROM shop.products p
    JOIN shop.categories c ON c.id = p.category_id
";

/// Shared by listing and counting. `$1` is the category slug, `$2` the featured flag.
const PRODUCT_FILTER: &str = r"
    WHERE ($1::text IS NULL OR c.slug = $1)
      AND ($2::bool IS NULL OR p.featured = $2)
";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    description: String,
    price: i64,
    original_price: Option<i64>,
    category_id: CategoryId,
    category_name: String,
    category_slug: String,
    featured: bool,
    in_stock: bool,
    stock_quantity: i32,
    sku: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: ProductImageId,
    url: String,
    alt: Option<String>,
    product_id: ProductId,
    is_main: bool,
}

impl ProductRow {
    fn into_product(self, images: Vec<ProductImage>) -> Product {
        Product {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            price: Cents::new(self.price),
            original_price: self.original_price.map(Cents::new),
            category_id: self.category_id,
            category: Some(ProductCategory {
                id: self.category_id,
                name: self.category_name,
                slug: self.category_slug,
            }),
            featured: self.featured,
            in_stock: self.in_stock,
            stock_quantity: self.stock_quantity,
            sku: self.sku,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Optional filters for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Only products in the category with this slug.
    pub category_slug: Option<String>,
    /// Only products whose `featured` flag matches.
    pub featured: Option<bool>,
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List one page of products, newest first, with the total match count.
    ///
    /// An unknown category slug simply matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: &PageParams,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM shop.products p \
             JOIN shop.categories c ON c.id = p.category_id {PRODUCT_FILTER}"
        ))
        .bind(filter.category_slug.as_deref())
        .bind(filter.featured)
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{PRODUCT_SELECT} {PRODUCT_FILTER} \
             ORDER BY p.created_at DESC, p.id LIMIT $3 OFFSET $4"
        ))
        .bind(filter.category_slug.as_deref())
        .bind(filter.featured)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let products = self.attach_images(rows).await?;
        Ok((products, total))
    }

    /// Get a single product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{PRODUCT_SELECT} WHERE p.slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_images(vec![row]).await?.into_iter().next())
    }

    async fn attach_images(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id.as_uuid()).collect();
        let images: Vec<ImageRow> = sqlx::query_as(
            r"
            SELECT id, url, alt, product_id, is_main
            FROM shop.product_images
            WHERE product_id = ANY($1)
            ORDER BY is_main DESC, created_at ASC, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_product: HashMap<ProductId, Vec<ProductImage>> = HashMap::new();
        for image in images {
            by_product
                .entry(image.product_id)
                .or_default()
                .push(ProductImage {
                    id: image.id,
                    url: image.url,
                    alt: image.alt,
                    product_id: image.product_id,
                    is_main: image.is_main,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let images = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(images)
            })
            .collect())
    }
}
