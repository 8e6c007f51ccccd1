//! Storefront query playground.
//!
//! A catalog of short, independent demonstrations of the storefront
//! data-access layer, run against a seeded SQLite database. The binary in
//! `main.rs` wires these modules to a CLI; the integration tests drive them
//! directly.
//!
//! - [`models`] - the store and tags models
//! - [`schema`] - table creation and deterministic seed data
//! - [`demos`] - one function per query feature
//! - [`server`] - the landing-page HTTP surface

pub mod demos;
pub mod models;
pub mod schema;
pub mod server;
