//! Customer order route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use beauty_shop_core::OrderRequest;

use super::json_body;
use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::state::AppState;

/// The caller's orders, oldest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    // A signed token can outlive its account
    if UserRepository::new(state.pool())
        .get_by_id(identity.user_id)
        .await?
        .is_none()
    {
        return Err(AppError::Unauthorized("User not found".to_owned()));
    }

    let orders = OrderRepository::new(state.pool())
        .list_for_user(identity.user_id)
        .await?;
    Ok(Json(orders))
}

/// Place an order from a cart.
///
/// The account check happens inside the checkout transaction.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    payload: std::result::Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>)> {
    let request = json_body(payload)?;
    let order = state.orders().place_order(identity.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
