//! Beauty Shop API library.
//!
//! The HTTP service as a library, so the binary, the CLI, and the tests can
//! share its configuration, repositories, and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
