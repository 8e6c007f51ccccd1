//! Base database backend trait and common types.
//!
//! This module defines the [`DatabaseBackend`] trait that all backend
//! implementations satisfy, along with the [`Transaction`] wrapper and the
//! [`DatabaseConfig`] connection configuration.

use storefront_core::StoreError;
use storefront_orm::query::compiler::{BackendKind, SqlCompiler};
use storefront_orm::value::Value;
use storefront_orm::Row;

/// A database transaction wrapper.
///
/// Transactions are obtained from [`DatabaseBackend::begin_transaction`] and
/// must be explicitly committed or rolled back.
pub struct Transaction {
    /// Whether this transaction has been committed.
    pub committed: bool,
    /// An opaque handle to the backend-specific transaction state.
    _inner: Box<dyn std::any::Any + Send>,
}

impl Transaction {
    /// Creates a new transaction wrapper.
    pub fn new(inner: Box<dyn std::any::Any + Send>) -> Self {
        Self {
            committed: false,
            _inner: inner,
        }
    }

    /// Marks this transaction as committed.
    pub fn set_committed(&mut self) {
        self.committed = true;
    }
}

/// The core trait for database backends.
///
/// Each database engine implements this trait to provide a uniform interface
/// for executing SQL, managing transactions, and obtaining a SQL compiler
/// configured for the backend's dialect.
///
/// All methods are async because database operations are I/O-bound. Backends
/// with synchronous drivers (like `rusqlite`) wrap operations in
/// `spawn_blocking` to maintain the async interface.
#[async_trait::async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Returns the vendor name (e.g. "sqlite", "postgresql").
    fn vendor(&self) -> &str;

    /// Returns the backend dialect for the SQL compiler.
    fn backend_kind(&self) -> BackendKind;

    /// Executes a SQL statement that does not return rows.
    ///
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, StoreError>;

    /// Executes a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError>;

    /// Executes a SQL query and returns exactly one row.
    ///
    /// Returns [`StoreError::DoesNotExist`] if no rows are returned, or
    /// [`StoreError::MultipleObjectsReturned`] if more than one row is
    /// returned.
    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Row, StoreError>;

    /// Begins a new database transaction.
    async fn begin_transaction(&self) -> Result<Transaction, StoreError>;

    /// Commits the current transaction.
    async fn commit(&self) -> Result<(), StoreError>;

    /// Rolls back the current transaction.
    async fn rollback(&self) -> Result<(), StoreError>;

    /// Returns a SQL compiler configured for this backend's dialect.
    fn compiler(&self) -> SqlCompiler;
}

/// Configuration for connecting to a database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// The backend dialect.
    pub backend: BackendKind,
    /// The database name or file path.
    pub name: String,
    /// The database host (for network-based backends).
    pub host: Option<String>,
    /// The database port.
    pub port: Option<u16>,
    /// The database user.
    pub user: Option<String>,
    /// The database password.
    pub password: Option<String>,
}

impl DatabaseConfig {
    /// Creates a configuration for an in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            name: ":memory:".to_string(),
            host: None,
            port: None,
            user: None,
            password: None,
        }
    }

    /// Creates a configuration for a SQLite file database.
    pub fn sqlite_file(path: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Sqlite,
            name: path.into(),
            host: None,
            port: None,
            user: None,
            password: None,
        }
    }

    /// Creates a configuration for a PostgreSQL database.
    pub fn postgres(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            backend: BackendKind::Postgres,
            name: name.into(),
            host: Some(host.into()),
            port: Some(port),
            user: Some(user.into()),
            password: Some(password.into()),
        }
    }
}
