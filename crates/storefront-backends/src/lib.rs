//! # storefront-backends
//!
//! Database backend implementations for the storefront data-access layer.
//!
//! Supported backends:
//! - SQLite via `rusqlite` (feature `sqlite`, on by default)
//! - PostgreSQL via `tokio-postgres` + `deadpool-postgres` (feature `postgres`)
//!
//! Both backends implement the [`DatabaseBackend`](base::DatabaseBackend)
//! trait and the ORM's [`DbExecutor`](storefront_orm::DbExecutor) trait, so a
//! `QuerySet` runs against either unchanged.

pub mod base;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use base::{DatabaseBackend, DatabaseConfig, Transaction};

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
