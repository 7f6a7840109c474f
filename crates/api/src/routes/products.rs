//! Catalog product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::db::ProductRepository;
use crate::db::products::ProductFilter;
use crate::error::{AppError, Result};
use crate::models::{PageParams, Pagination, Product};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    /// `"true"` or `"false"`; anything else is ignored.
    pub featured: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ProductQuery {
    fn split(self) -> (ProductFilter, PageParams) {
        let featured = match self.featured.as_deref().map(str::trim) {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };
        let category_slug = self.category.filter(|c| !c.trim().is_empty());

        (
            ProductFilter {
                category_slug,
                featured,
            },
            PageParams {
                page: self.page,
                limit: self.limit,
            },
        )
    }
}

/// One page of products.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// List products, newest first.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let (filter, page) = query.split();
    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, &page)
        .await?;

    Ok(Json(ProductPage {
        products,
        pagination: Pagination::for_params(total, &page),
    }))
}

/// A single product by slug.
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}
