//! Domain models returned by repositories and serialized to clients.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. All of them serialize with camelCase field names.

pub mod category;
pub mod customer;
pub mod order;
pub mod pagination;
pub mod product;
pub mod user;

pub use category::{Category, CategoryDetail};
pub use customer::{CustomerDetail, CustomerSummary};
pub use order::{Order, OrderItem};
pub use pagination::{PageParams, Pagination};
pub use product::{Product, ProductCategory, ProductImage};
pub use user::User;
