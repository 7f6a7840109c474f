//! Beauty Shop Core - Shared domain types and rules.
//!
//! This crate provides the types and pure business rules used by the
//! Beauty Shop components:
//! - `api` - The JSON HTTP service (auth, catalog, orders, settings)
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything that decides *what* an order costs or whether a
//! request is acceptable lives here so it can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, roles and statuses
//! - [`pricing`] - Store pricing rules and order totals
//! - [`order_request`] - Validation of client-submitted carts
//! - [`category_tree`] - Acyclic category hierarchy checks and slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod category_tree;
pub mod order_request;
pub mod pricing;
pub mod types;

pub use category_tree::{CategoryTree, CategoryTreeError, slugify};
pub use order_request::{
    OrderLine, OrderRequest, OrderRequestError, OrderRequestLine, ValidatedOrder,
};
pub use pricing::{OrderTotals, PricingError, PricingRules};
pub use types::*;
