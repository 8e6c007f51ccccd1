//! Transaction support.
//!
//! This module provides transaction management: atomic blocks, savepoints for
//! nested atomic blocks, and `on_commit` callbacks.
//!
//! # Architecture
//!
//! Transactions are managed through the [`TransactionManager`], which wraps a
//! [`DbExecutor`] and tracks nesting depth. The [`atomic()`] function is the
//! primary entry point: it accepts a closure, commits if the closure returns
//! `Ok`, and rolls back if it returns `Err`. Nested calls to `begin` create
//! savepoints rather than nested transactions.

use crate::executor::DbExecutor;
use crate::query::compiler::{BackendKind, Row};
use crate::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use storefront_core::{StoreError, StoreResult};
use tokio::sync::Mutex;

/// Counter for generating unique savepoint names.
static SAVEPOINT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// State of a savepoint within a transaction.
#[derive(Debug, Clone)]
pub struct Savepoint {
    /// The unique name of this savepoint.
    pub name: String,
    /// Whether this savepoint has been released.
    pub released: bool,
    /// Whether this savepoint has been rolled back.
    pub rolled_back: bool,
}

impl Savepoint {
    /// Creates a new savepoint with an auto-generated unique name.
    pub fn new() -> Self {
        let id = SAVEPOINT_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            name: format!("sp_{id}"),
            released: false,
            rolled_back: false,
        }
    }

    /// Creates a new savepoint with a custom name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            released: false,
            rolled_back: false,
        }
    }
}

impl Default for Savepoint {
    fn default() -> Self {
        Self::new()
    }
}

/// A list of callbacks to be executed after a transaction commits.
type OnCommitCallbacks = Vec<Box<dyn FnOnce() + Send + 'static>>;

/// Manages transaction state for a database connection.
///
/// `TransactionManager` wraps a `DbExecutor` and tracks the current
/// transaction nesting depth, savepoints, and `on_commit` callbacks. It also
/// implements `DbExecutor` itself so querysets and CRUD functions run inside
/// the transaction unchanged.
pub struct TransactionManager<'a> {
    /// The underlying database executor.
    db: &'a dyn DbExecutor,
    /// Current nesting depth (0 = no transaction, 1 = outermost, 2+ = savepoint).
    depth: Arc<Mutex<u32>>,
    /// Stack of active savepoints (for nested atomic blocks).
    savepoints: Arc<Mutex<Vec<Savepoint>>>,
    /// Callbacks registered to run after the outermost transaction commits.
    on_commit_callbacks: Arc<Mutex<OnCommitCallbacks>>,
}

impl<'a> TransactionManager<'a> {
    /// Creates a new transaction manager for the given executor.
    pub fn new(db: &'a dyn DbExecutor) -> Self {
        Self {
            db,
            depth: Arc::new(Mutex::new(0)),
            savepoints: Arc::new(Mutex::new(Vec::new())),
            on_commit_callbacks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the current transaction nesting depth.
    pub async fn depth(&self) -> u32 {
        *self.depth.lock().await
    }

    /// Begins a new transaction, or creates a savepoint if already in one.
    ///
    /// Called automatically by [`atomic()`]; only call directly when managing
    /// nesting by hand.
    pub async fn begin(&self) -> StoreResult<()> {
        let mut depth = self.depth.lock().await;
        if *depth == 0 {
            self.db.execute_sql("BEGIN", &[]).await?;
        } else {
            let sp = Savepoint::new();
            let sql = format!("SAVEPOINT {}", sp.name);
            self.db.execute_sql(&sql, &[]).await?;
            self.savepoints.lock().await.push(sp);
        }
        *depth += 1;
        Ok(())
    }

    /// Commits the current transaction, or releases the current savepoint.
    pub async fn commit(&self) -> StoreResult<()> {
        let mut depth = self.depth.lock().await;
        if *depth == 0 {
            return Err(StoreError::DatabaseError(
                "Cannot commit: not in a transaction".to_string(),
            ));
        }

        if *depth == 1 {
            self.db.execute_sql("COMMIT", &[]).await?;
            *depth = 0;

            let callbacks: OnCommitCallbacks = {
                let mut cbs = self.on_commit_callbacks.lock().await;
                std::mem::take(&mut *cbs)
            };
            for cb in callbacks {
                cb();
            }
        } else {
            let mut savepoints = self.savepoints.lock().await;
            if let Some(mut sp) = savepoints.pop() {
                let sql = format!("RELEASE SAVEPOINT {}", sp.name);
                self.db.execute_sql(&sql, &[]).await?;
                sp.released = true;
            }
            *depth -= 1;
        }

        Ok(())
    }

    /// Rolls back the current transaction or savepoint.
    pub async fn rollback(&self) -> StoreResult<()> {
        let mut depth = self.depth.lock().await;
        if *depth == 0 {
            return Err(StoreError::DatabaseError(
                "Cannot rollback: not in a transaction".to_string(),
            ));
        }

        if *depth == 1 {
            self.db.execute_sql("ROLLBACK", &[]).await?;
            *depth = 0;
            // Callbacks never run for a rolled-back transaction.
            self.on_commit_callbacks.lock().await.clear();
        } else {
            let mut savepoints = self.savepoints.lock().await;
            if let Some(mut sp) = savepoints.pop() {
                let sql = format!("ROLLBACK TO SAVEPOINT {}", sp.name);
                self.db.execute_sql(&sql, &[]).await?;
                sp.rolled_back = true;
            }
            *depth -= 1;
        }

        Ok(())
    }

    /// Registers a callback to run after the outermost transaction commits.
    ///
    /// If no transaction is active, the callback runs immediately. If the
    /// transaction rolls back, the callback is discarded.
    pub async fn on_commit<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let depth = self.depth.lock().await;
        if *depth == 0 {
            drop(depth);
            callback();
        } else {
            self.on_commit_callbacks
                .lock()
                .await
                .push(Box::new(callback));
        }
    }

    /// Returns the number of pending `on_commit` callbacks.
    pub async fn pending_callbacks(&self) -> usize {
        self.on_commit_callbacks.lock().await.len()
    }
}

#[async_trait::async_trait]
impl DbExecutor for TransactionManager<'_> {
    fn backend_kind(&self) -> BackendKind {
        self.db.backend_kind()
    }

    async fn execute_sql(&self, sql: &str, params: &[Value]) -> StoreResult<u64> {
        self.db.execute_sql(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> StoreResult<Vec<Row>> {
        self.db.query(sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> StoreResult<Row> {
        self.db.query_one(sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> StoreResult<Value> {
        self.db.insert_returning_id(sql, params).await
    }
}

/// Executes a closure within a database transaction.
///
/// If the closure returns `Ok`, the transaction is committed. If it returns
/// `Err`, the transaction is rolled back and the error propagates. Nested
/// `begin` calls on the passed manager create savepoints.
///
/// # Examples
///
/// ```ignore
/// let order_id = atomic(&db, |txn| async move {
///     let order_id = order_qs.create_exec(txn.as_ref()).await?;
///     item_qs.create_exec(txn.as_ref()).await?; // a failure here rolls back the order too
///     Ok(order_id)
/// })
/// .await?;
/// ```
pub async fn atomic<'a, F, Fut, T>(db: &'a dyn DbExecutor, f: F) -> StoreResult<T>
where
    F: FnOnce(Arc<TransactionManager<'a>>) -> Fut,
    Fut: std::future::Future<Output = StoreResult<T>>,
{
    let txn = Arc::new(TransactionManager::new(db));
    txn.begin().await?;

    match f(Arc::clone(&txn)).await {
        Ok(result) => {
            txn.commit().await?;
            Ok(result)
        }
        Err(e) => {
            // Attempt to rollback; if rollback fails, return the original error.
            let _ = txn.rollback().await;
            Err(e)
        }
    }
}
