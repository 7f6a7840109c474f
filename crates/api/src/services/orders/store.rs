//! Storage seam for the checkout transaction.
//!
//! [`OrderService`](super::OrderService) drives a checkout through
//! [`CheckoutTx`]. Dropping a transaction without calling
//! [`CheckoutTx::commit`] discards every write it made.

use std::future::Future;

use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use beauty_shop_core::{ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::{self, NewOrder, StockReservation};
use crate::db::settings::{self, STORE_SETTINGS_KEY};
use crate::db::users;
use crate::models::Order;

/// Opens checkout transactions.
pub trait CheckoutStore: Send + Sync {
    type Tx: CheckoutTx;

    /// Start a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, RepositoryError>> + Send;
}

/// The reads and writes one checkout performs, all in one transaction.
pub trait CheckoutTx: Send {
    /// Hold the customer's account for the rest of the transaction.
    /// Resolves to `false` if no such account exists.
    fn lock_account(
        &mut self,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// The `"store"` settings blob, if one exists.
    fn store_settings(
        &mut self,
    ) -> impl Future<Output = Result<Option<Value>, RepositoryError>> + Send;

    /// Take `quantity` units of a product if it has them.
    fn reserve_stock(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<StockReservation, RepositoryError>> + Send;

    /// Insert the order, or return `None` if its number is already taken.
    fn insert_order(
        &mut self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Make every write visible.
    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Checkout storage backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CheckoutStore for PgCheckoutStore {
    type Tx = PgCheckoutTx;

    async fn begin(&self) -> Result<PgCheckoutTx, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgCheckoutTx { tx })
    }
}

/// An open `PostgreSQL` checkout transaction. Rolls back on drop.
pub struct PgCheckoutTx {
    tx: Transaction<'static, Postgres>,
}

impl CheckoutTx for PgCheckoutTx {
    async fn lock_account(&mut self, user_id: UserId) -> Result<bool, RepositoryError> {
        users::lock_account(&mut *self.tx, user_id).await
    }

    async fn store_settings(&mut self) -> Result<Option<Value>, RepositoryError> {
        settings::get_setting(&mut *self.tx, STORE_SETTINGS_KEY).await
    }

    async fn reserve_stock(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<StockReservation, RepositoryError> {
        orders::reserve_stock(&mut *self.tx, product_id, quantity).await
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Option<Order>, RepositoryError> {
        orders::insert_order(&mut *self.tx, order).await
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
