//! Order placement.
//!
//! A checkout validates the cart, then inside one transaction reads the
//! pricing settings, reserves stock line by line at the current catalog
//! price, computes totals, and inserts the order with its items. Any failure
//! before commit rolls every step back.

#[cfg(test)]
mod memory;
mod store;

pub use store::{CheckoutStore, CheckoutTx, PgCheckoutStore, PgCheckoutTx};

use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use beauty_shop_core::{
    OrderNumber, OrderRequest, OrderRequestError, OrderTotals, PricingError, PricingRules,
    ProductId, UserId, ValidatedOrder, pricing,
};

use crate::db::RepositoryError;
use crate::db::orders::{NewOrder, NewOrderItem, StockReservation};
use crate::models::Order;

/// Attempts at the whole transaction when the database reports contention.
const MAX_TRANSACTION_ATTEMPTS: u32 = 3;

/// Order numbers tried before giving up on an insert.
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The payload failed structural validation.
    #[error(transparent)]
    InvalidRequest(#[from] OrderRequestError),

    /// The token is valid but its account no longer exists.
    #[error("User not found")]
    AccountNotFound(UserId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Carries the product name.
    #[error("Product {0} is out of stock or has insufficient quantity")]
    OutOfStock(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("no free order number after {MAX_ORDER_NUMBER_ATTEMPTS} attempts")]
    OrderNumberExhausted,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Places orders against a [`CheckoutStore`].
pub struct OrderService<S> {
    store: S,
    next_number: fn() -> OrderNumber,
}

impl<S: CheckoutStore> OrderService<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            next_number: OrderNumber::generate,
        }
    }

    /// Validate and place an order for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidRequest` before any storage access if the
    /// payload is malformed, `AccountNotFound` if `user_id` has no account,
    /// `ProductNotFound` or `OutOfStock` for the first
    /// line that cannot be filled, and `Repository` for storage failures
    /// that survive the contention retries.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: OrderRequest,
    ) -> Result<Order, OrderError> {
        let order = request.validate()?;

        let mut attempt = 1;
        loop {
            match self.checkout(user_id, &order).await {
                Err(OrderError::Repository(RepositoryError::Contention(e)))
                    if attempt < MAX_TRANSACTION_ATTEMPTS =>
                {
                    tracing::warn!(attempt, error = %e, "Checkout contended, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn checkout(&self, user_id: UserId, order: &ValidatedOrder) -> Result<Order, OrderError> {
        let mut tx = self.store.begin().await?;

        if !tx.lock_account(user_id).await? {
            return Err(OrderError::AccountNotFound(user_id));
        }

        let settings = tx.store_settings().await?;
        let rules = pricing_rules(settings.as_ref());

        let mut items = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            match tx.reserve_stock(line.product_id, line.quantity).await? {
                StockReservation::Reserved(product) => items.push(NewOrderItem {
                    product_id: product.id,
                    name: product.name,
                    price: product.price,
                    quantity: line.quantity,
                    variant: line.variant.clone(),
                }),
                StockReservation::NotFound => {
                    return Err(OrderError::ProductNotFound(line.product_id));
                }
                StockReservation::Insufficient { name } => {
                    return Err(OrderError::OutOfStock(name));
                }
            }
        }

        let subtotal = pricing::subtotal(items.iter().map(|i| (i.price, i.quantity)))?;
        let totals = OrderTotals::compute(subtotal, &rules)?;

        let mut new_order = NewOrder {
            user_id,
            order_number: (self.next_number)(),
            totals,
            shipping_address: Value::Object(order.shipping_address.clone()),
            billing_address: order.billing_address.clone().map(Value::Object),
            payment_method: order.payment_method.clone(),
            notes: order.notes.clone(),
            items,
        };

        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            if let Some(placed) = tx.insert_order(&new_order).await? {
                tx.commit().await?;
                tracing::info!(
                    order_id = %placed.id,
                    order_number = %placed.order_number,
                    total = placed.total.minor_units(),
                    "Order placed"
                );
                return Ok(placed);
            }

            tracing::warn!(attempt, order_number = %new_order.order_number, "Order number taken");
            new_order.order_number = (self.next_number)();
        }

        Err(OrderError::OrderNumberExhausted)
    }
}

fn pricing_rules(store: Option<&Value>) -> PricingRules {
    match store {
        None => tracing::warn!("No store settings; using default pricing"),
        Some(value) => {
            let fallback = PricingRules::fallback_fields(value);
            if !fallback.is_empty() {
                tracing::warn!(fields = ?fallback, "Store settings incomplete; using defaults");
            }
        }
    }
    PricingRules::from_settings(store)
}
