//! Administrative route handlers. Every handler requires an `ADMIN` token.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use beauty_shop_core::{CategoryId, OrderStatus, UserId};

use super::json_body;
use crate::db::categories::{CategoryUpdate, NewCategory};
use crate::db::customers::CustomerSort;
use crate::db::settings::{STORE_SETTINGS_KEY, set_setting};
use crate::db::{CategoryRepository, CustomerRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{
    Category, CustomerDetail, CustomerSummary, Order, PageParams, Pagination,
};
use crate::state::AppState;

/// Replace the `"store"` settings blob.
pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let value = json_body(payload)?;
    if !value.is_object() {
        return Err(AppError::BadRequest(
            "Settings must be a JSON object".to_owned(),
        ));
    }

    let stored = set_setting(state.pool(), STORE_SETTINGS_KEY, &value).await?;
    tracing::info!(admin_id = %admin.user_id, "Store settings updated");
    Ok(Json(stored))
}

/// Query parameters for the admin order listing.
#[derive(Debug, Default, Deserialize)]
pub struct AdminOrderQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// One page of orders.
#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}

/// All orders, newest first, optionally filtered by status.
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<AdminOrderQuery>,
) -> Result<Json<OrderPage>> {
    let status = parse_status(query.status.as_deref())?;
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let (orders, total) = OrderRepository::new(state.pool())
        .list_all(status, &page)
        .await?;

    Ok(Json(OrderPage {
        orders,
        pagination: Pagination::for_params(total, &page),
    }))
}

fn parse_status(raw: Option<&str>) -> Result<Option<OrderStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .to_ascii_uppercase()
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid order status: {s}"))),
    }
}

/// Query parameters for the customer listing.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    /// Substring of the name or email, case-insensitive.
    pub search: Option<String>,
    /// `field:direction`, e.g. `name:asc`.
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// One page of customers.
#[derive(Debug, Serialize)]
pub struct CustomerPage {
    pub customers: Vec<CustomerSummary>,
    pub pagination: Pagination,
}

/// Customer accounts with order statistics.
pub async fn list_customers(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<CustomerPage>> {
    let sort = CustomerSort::parse(query.sort.as_deref());
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let (customers, total) = CustomerRepository::new(state.pool())
        .list(query.search.as_deref(), sort, &page)
        .await?;

    Ok(Json(CustomerPage {
        customers,
        pagination: Pagination::for_params(total, &page),
    }))
}

/// One customer with their ten most recent orders.
pub async fn show_customer(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>> {
    let id: UserId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid customer ID: {id}")))?;

    CustomerRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Customer not found".to_owned()))
}

/// Create a category.
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    payload: std::result::Result<Json<NewCategory>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>)> {
    let new = json_body(payload)?;
    let category = CategoryRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Partially update a category.
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CategoryUpdate>, JsonRejection>,
) -> Result<Json<Category>> {
    let id: CategoryId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid category ID: {id}")))?;
    let changes = json_body(payload)?;

    let category = CategoryRepository::new(state.pool())
        .update(id, &changes)
        .await?;
    Ok(Json(category))
}
