//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use beauty_shop_core::{CategoryId, Cents, ProductId, ProductImageId};

/// A catalog product with its images and category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Cents,
    pub original_price: Option<Cents>,
    pub category_id: CategoryId,
    pub category: Option<ProductCategory>,
    pub featured: bool,
    pub in_stock: bool,
    pub stock_quantity: i32,
    pub sku: Option<String>,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The category summary embedded in a product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product image. At most one per product is expected to be `is_main`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: ProductImageId,
    pub url: String,
    pub alt: Option<String>,
    pub product_id: ProductId,
    pub is_main: bool,
}
