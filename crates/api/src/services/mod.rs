//! Business logic services.
//!
//! - [`auth`] - Password login, registration, and bearer tokens
//! - [`orders`] - The checkout workflow

pub mod auth;
pub mod orders;
