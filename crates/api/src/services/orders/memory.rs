//! In-memory checkout storage for workflow tests.
//!
//! A transaction holds the store lock for its whole lifetime and works on a
//! staged copy that replaces the shared data on commit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use beauty_shop_core::{
    Cents, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId,
};

use super::store::{CheckoutStore, CheckoutTx};
use crate::db::RepositoryError;
use crate::db::orders::{NewOrder, ProductSnapshot, StockReservation};
use crate::models::{Order, OrderItem};

#[derive(Debug, Clone)]
pub struct MemoryProduct {
    pub name: String,
    pub price: Cents,
    pub stock_quantity: u32,
    pub in_stock: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryData {
    users: HashSet<UserId>,
    products: HashMap<ProductId, MemoryProduct>,
    orders: Vec<Order>,
    taken_numbers: HashSet<String>,
    settings: Option<Value>,
    contention_failures: u32,
}

#[derive(Clone, Default)]
pub struct MemoryCheckoutStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryCheckoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_customer(&self) -> UserId {
        let id = UserId::generate();
        self.data.lock().await.users.insert(id);
        id
    }

    pub async fn add_product(&self, name: &str, price: i64, stock_quantity: u32) -> ProductId {
        let id = ProductId::generate();
        self.data.lock().await.products.insert(
            id,
            MemoryProduct {
                name: name.to_owned(),
                price: Cents::new(price),
                stock_quantity,
                in_stock: stock_quantity > 0,
            },
        );
        id
    }

    pub async fn product(&self, id: ProductId) -> Option<MemoryProduct> {
        self.data.lock().await.products.get(&id).cloned()
    }

    pub async fn set_settings(&self, value: Value) {
        self.data.lock().await.settings = Some(value);
    }

    pub async fn take_number(&self, number: &str) {
        self.data.lock().await.taken_numbers.insert(number.to_owned());
    }

    /// Make the next `count` stock reservations fail as if deadlocked.
    pub async fn fail_with_contention(&self, count: u32) {
        self.data.lock().await.contention_failures = count;
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.data.lock().await.orders.clone()
    }
}

impl CheckoutStore for MemoryCheckoutStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, RepositoryError> {
        let guard = Arc::clone(&self.data).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTx { guard, staged })
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryData>,
    staged: MemoryData,
}

impl CheckoutTx for MemoryTx {
    async fn lock_account(&mut self, user_id: UserId) -> Result<bool, RepositoryError> {
        Ok(self.staged.users.contains(&user_id))
    }

    async fn store_settings(&mut self) -> Result<Option<Value>, RepositoryError> {
        Ok(self.staged.settings.clone())
    }

    async fn reserve_stock(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<StockReservation, RepositoryError> {
        // Counted on the shared data so the failure budget survives rollback.
        if self.guard.contention_failures > 0 {
            self.guard.contention_failures -= 1;
            return Err(RepositoryError::Contention(sqlx::Error::Protocol(
                "deadlock detected".to_owned(),
            )));
        }

        let Some(product) = self.staged.products.get_mut(&product_id) else {
            return Ok(StockReservation::NotFound);
        };

        if !product.in_stock || product.stock_quantity < quantity {
            return Ok(StockReservation::Insufficient {
                name: product.name.clone(),
            });
        }

        product.stock_quantity -= quantity;
        product.in_stock = product.stock_quantity > 0;

        Ok(StockReservation::Reserved(ProductSnapshot {
            id: product_id,
            name: product.name.clone(),
            price: product.price,
        }))
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Option<Order>, RepositoryError> {
        if !self
            .staged
            .taken_numbers
            .insert(order.order_number.as_str().to_owned())
        {
            return Ok(None);
        }

        let now = Utc::now();
        let id = OrderId::generate();
        let items = order
            .items
            .iter()
            .map(|item| OrderItem {
                id: OrderItemId::generate(),
                order_id: id,
                product_id: item.product_id,
                name: item.name.clone(),
                price: item.price,
                quantity: item.quantity,
                variant: item.variant.clone(),
                created_at: now,
            })
            .collect();

        let placed = Order {
            id,
            user_id: Some(order.user_id),
            order_number: order.order_number.clone(),
            status: OrderStatus::Pending,
            items,
            subtotal: order.totals.subtotal,
            tax: order.totals.tax,
            shipping: order.totals.shipping,
            total: order.totals.total,
            shipping_address: order.shipping_address.clone(),
            billing_address: order.billing_address.clone(),
            payment_method: order.payment_method.clone(),
            payment_status: PaymentStatus::Pending,
            notes: order.notes.clone(),
            tracking_number: None,
            created_at: now,
            updated_at: now,
        };

        self.staged.orders.push(placed.clone());
        Ok(Some(placed))
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        let Self { mut guard, staged } = self;
        let contention_failures = guard.contention_failures;
        *guard = MemoryData {
            contention_failures,
            ..staged
        };
        Ok(())
    }
}
