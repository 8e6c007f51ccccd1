//! # storefront-core
//!
//! Core types for the storefront workspace: settings, logging setup, and the
//! shared error type. This crate has no database dependencies and provides the
//! foundation for the ORM and backend crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Application settings with TOML loading
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;

// Re-export the most commonly used types at the crate root.
pub use error::{StoreError, StoreResult};
pub use settings::{DatabaseSettings, Settings};
