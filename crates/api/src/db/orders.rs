//! Order repository and the checkout write primitives.
//!
//! Reads go through [`OrderRepository`]. The write path
//! ([`reserve_stock`], [`insert_order`]) takes a bare connection so the
//! checkout can run every step inside one transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use beauty_shop_core::{
    Cents, OrderId, OrderItemId, OrderNumber, OrderStatus, OrderTotals, PaymentStatus, ProductId,
    UserId,
};

use super::{RepositoryError, non_negative};
use crate::models::{Order, OrderItem, PageParams};

const ORDER_COLUMNS: &str = r"
    id, user_id, order_number, status, subtotal, tax, shipping, total,
    shipping_address, billing_address, payment_method, payment_status,
    notes, tracking_number, created_at, updated_at
";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, name, price, quantity, variant, created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    order_number: String,
    status: OrderStatus,
    subtotal: i64,
    tax: i64,
    shipping: i64,
    total: i64,
    shipping_address: Value,
    billing_address: Option<Value>,
    payment_method: String,
    payment_status: PaymentStatus,
    notes: Option<String>,
    tracking_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            order_number: OrderNumber::from_stored(self.order_number),
            status: self.status,
            items,
            subtotal: Cents::new(self.subtotal),
            tax: Cents::new(self.tax),
            shipping: Cents::new(self.shipping),
            total: Cents::new(self.total),
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            notes: self.notes,
            tracking_number: self.tracking_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    name: String,
    price: i64,
    quantity: i32,
    variant: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(r: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            order_id: r.order_id,
            product_id: r.product_id,
            name: r.name,
            price: Cents::new(r.price),
            quantity: non_negative(r.quantity, "order item quantity")?,
            variant: r.variant,
            created_at: r.created_at,
        })
    }
}

// =============================================================================
// Checkout write path
// =============================================================================

/// Catalog values captured when stock is reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Cents,
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockReservation {
    /// Stock was decremented; the snapshot holds the price to charge.
    Reserved(ProductSnapshot),
    /// No product has this id.
    NotFound,
    /// The product exists but is out of stock or has too few units.
    Insufficient { name: String },
}

/// A priced line ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Cents,
    pub quantity: u32,
    pub variant: Option<String>,
}

/// An order header plus its lines, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub totals: OrderTotals,
    pub shipping_address: Value,
    pub billing_address: Option<Value>,
    pub payment_method: String,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(sqlx::FromRow)]
struct ReservedRow {
    id: ProductId,
    name: String,
    price: i64,
}

/// Atomically take `quantity` units of a product.
///
/// The conditional `UPDATE` locks the row and re-checks the predicate against
/// the latest committed version, so concurrent checkouts cannot oversell.
/// `in_stock` is recomputed in the same statement.
///
/// # Errors
///
/// Returns `RepositoryError::Contention` on deadlock, `Database` otherwise.
pub async fn reserve_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: u32,
) -> Result<StockReservation, RepositoryError> {
    let quantity = i32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("quantity out of range: {quantity}")))?;

    let reserved: Option<ReservedRow> = sqlx::query_as(
        r"
        UPDATE shop.products
        SET stock_quantity = stock_quantity - $2,
            in_stock = (stock_quantity - $2) > 0,
            updated_at = NOW()
        WHERE id = $1 AND in_stock AND stock_quantity >= $2
        RETURNING id, name, price
        ",
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = reserved {
        return Ok(StockReservation::Reserved(ProductSnapshot {
            id: row.id,
            name: row.name,
            price: Cents::new(row.price),
        }));
    }

    let name: Option<String> = sqlx::query_scalar("SELECT name FROM shop.products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(name.map_or(StockReservation::NotFound, |name| {
        StockReservation::Insufficient { name }
    }))
}

/// Insert an order header and its items.
///
/// Returns `None` without writing anything when the order number is already
/// taken; the caller picks a new number and tries again within the same
/// transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrder,
) -> Result<Option<Order>, RepositoryError> {
    let header: Option<OrderRow> = sqlx::query_as(&format!(
        r"
        INSERT INTO shop.orders
            (user_id, order_number, status, subtotal, tax, shipping, total,
             shipping_address, billing_address, payment_method, payment_status, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (order_number) DO NOTHING
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order.user_id)
    .bind(order.order_number.as_str())
    .bind(OrderStatus::Pending)
    .bind(order.totals.subtotal.minor_units())
    .bind(order.totals.tax.minor_units())
    .bind(order.totals.shipping.minor_units())
    .bind(order.totals.total.minor_units())
    .bind(&order.shipping_address)
    .bind(order.billing_address.as_ref())
    .bind(&order.payment_method)
    .bind(PaymentStatus::Pending)
    .bind(order.notes.as_deref())
    .fetch_optional(&mut *conn)
    .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let mut items = Vec::with_capacity(order.items.len());
    for (position, item) in order.items.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| RepositoryError::DataCorruption("too many order items".to_owned()))?;
        let quantity = i32::try_from(item.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("quantity out of range: {}", item.quantity))
        })?;

        let row: OrderItemRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shop.order_items
                (order_id, product_id, name, price, quantity, variant, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(header.id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.price.minor_units())
        .bind(quantity)
        .bind(item.variant.as_deref())
        .bind(position)
        .fetch_one(&mut *conn)
        .await?;

        items.push(OrderItem::try_from(row)?);
    }

    Ok(Some(header.into_order(items)))
}

// =============================================================================
// Reads
// =============================================================================

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All orders placed by a user, oldest first, with their items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE user_id = $1 ORDER BY created_at ASC, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// A user's `limit` most recent orders, newest first, with their items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_recent_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM shop.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2
            "
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// One page of all orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: &PageParams,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.orders WHERE ($1::shop.order_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM shop.orders
            WHERE ($1::shop.order_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(status)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((self.attach_items(rows).await?, total))
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id.as_uuid()).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM shop.order_items WHERE order_id = ANY($1) ORDER BY position"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let item = OrderItem::try_from(row)?;
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }
}
