//! Database executor trait and model CRUD operations.
//!
//! This module defines the [`DbExecutor`] trait that provides the minimal
//! async interface required by [`QuerySet`](crate::query::queryset::QuerySet)
//! execution methods, plus free functions for save/create/delete/refresh
//! operations on model instances.
//!
//! The `DbExecutor` trait is implemented by backend types (`SqliteBackend`,
//! `PostgresBackend`) in the `storefront-backends` crate, and by
//! [`TransactionManager`](crate::transactions::TransactionManager) so that
//! queries compose with transactions.

use crate::model::Model;
use crate::query::compiler::{BackendKind, Query, Row, SqlCompiler, WhereNode};
use crate::query::lookups::Lookup;
use crate::value::Value;
use storefront_core::{StoreError, StoreResult};

/// Minimal async database executor trait.
///
/// This is the bridge between the query layer and the concrete database
/// backends. `QuerySet` execution methods and model CRUD functions accept
/// `&dyn DbExecutor`.
#[async_trait::async_trait]
pub trait DbExecutor: Send + Sync {
    /// Returns the backend dialect for SQL compilation.
    fn backend_kind(&self) -> BackendKind;

    /// Runs a SQL statement that does not return rows.
    /// Returns the number of rows affected.
    async fn execute_sql(&self, sql: &str, params: &[Value]) -> StoreResult<u64>;

    /// Runs a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> StoreResult<Vec<Row>>;

    /// Runs a SQL query and returns exactly one row.
    /// Returns `DoesNotExist` if no rows, `MultipleObjectsReturned` if more
    /// than one.
    async fn query_one(&self, sql: &str, params: &[Value]) -> StoreResult<Row>;

    /// Executes an INSERT and returns the newly generated row ID.
    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> StoreResult<Value>;
}

// ── Model CRUD free functions ──────────────────────────────────────────

/// Saves a model instance to the database.
///
/// If the primary key is set, performs an UPDATE of all non-pk fields. If the
/// primary key is unset, performs an INSERT and backfills the PK from the
/// generated value.
pub async fn save_model<M: Model>(model: &mut M, db: &dyn DbExecutor) -> StoreResult<()> {
    let compiler = SqlCompiler::new(db.backend_kind());

    if let Some(pk_value) = model.pk() {
        let fields: Vec<(&'static str, Value)> = model.non_pk_field_values();
        if fields.is_empty() {
            return Ok(());
        }
        let where_clause = WhereNode::Condition {
            column: M::pk_field_name().to_string(),
            lookup: Lookup::Exact(pk_value),
        };
        let (sql, params) = compiler.compile_update(M::table_name(), &fields, &where_clause);
        db.execute_sql(&sql, &params).await?;
    } else {
        let fields: Vec<(&'static str, Value)> = model.non_pk_field_values();
        let (sql, params) = compiler.compile_insert(M::table_name(), &fields);
        let pk = db.insert_returning_id(&sql, &params).await?;
        model.set_pk(pk);
    }

    Ok(())
}

/// Creates a new model row via INSERT, regardless of whether the PK is set.
/// Backfills the PK from the generated value.
pub async fn create_model<M: Model>(model: &mut M, db: &dyn DbExecutor) -> StoreResult<()> {
    let compiler = SqlCompiler::new(db.backend_kind());
    let fields: Vec<(&'static str, Value)> = model.non_pk_field_values();
    let (sql, params) = compiler.compile_insert(M::table_name(), &fields);
    let pk = db.insert_returning_id(&sql, &params).await?;
    model.set_pk(pk);
    Ok(())
}

/// Deletes a model row. The model's PK must be set.
///
/// Returns the number of rows affected.
pub async fn delete_model<M: Model>(model: &M, db: &dyn DbExecutor) -> StoreResult<u64> {
    let pk_value = model.pk().ok_or_else(|| {
        StoreError::DatabaseError("Cannot delete a model without a primary key".to_string())
    })?;
    let compiler = SqlCompiler::new(db.backend_kind());
    let where_clause = WhereNode::Condition {
        column: M::pk_field_name().to_string(),
        lookup: Lookup::Exact(pk_value),
    };
    let (sql, params) = compiler.compile_delete(M::table_name(), &where_clause);
    db.execute_sql(&sql, &params).await
}

/// Refreshes a model instance with the latest values from the database.
///
/// The model's PK must be set and the row must still exist.
pub async fn refresh_model<M: Model>(model: &mut M, db: &dyn DbExecutor) -> StoreResult<()> {
    let pk_value = model.pk().ok_or_else(|| {
        StoreError::DatabaseError("Cannot refresh a model without a primary key".to_string())
    })?;
    let compiler = SqlCompiler::new(db.backend_kind());

    let mut query = Query::new(M::table_name());
    query.where_clause = Some(WhereNode::Condition {
        column: M::pk_field_name().to_string(),
        lookup: Lookup::Exact(pk_value),
    });
    query.limit = Some(1);

    let (sql, params) = compiler.compile_select(&query);
    let row = db.query_one(&sql, &params).await?;
    *model = M::from_row(&row)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDef, FieldType};
    use crate::model::ModelMeta;
    use std::sync::LazyLock;
    use tokio::sync::Mutex;

    // DbExecutor must stay object-safe; QuerySet takes &dyn DbExecutor.
    fn _assert_object_safe(_: &dyn DbExecutor) {}

    struct Collection {
        id: i64,
        title: String,
        featured_product_id: Option<i64>,
    }

    impl Model for Collection {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
                app_label: "store",
                model_name: "collection",
                db_table: "store_collection",
                ordering: vec![],
                fields: vec![
                    FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                    FieldDef::new("title", FieldType::CharField).max_length(255),
                ],
            });
            &META
        }

        fn pk(&self) -> Option<Value> {
            (self.id != 0).then_some(Value::Int(self.id))
        }

        fn set_pk(&mut self, value: Value) {
            if let Value::Int(id) = value {
                self.id = id;
            }
        }

        fn field_values(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", Value::Int(self.id)),
                ("title", Value::String(self.title.clone())),
                ("featured_product_id", Value::from(self.featured_product_id)),
            ]
        }

        fn from_row(row: &Row) -> Result<Self, StoreError> {
            Ok(Self {
                id: row.get("id")?,
                title: row.get("title")?,
                featured_product_id: row.get("featured_product_id")?,
            })
        }
    }

    /// A mock executor that records statements and returns canned rows.
    struct MockDb {
        statements: Mutex<Vec<(String, Vec<Value>)>>,
        rows: Vec<Row>,
    }

    impl MockDb {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                statements: Mutex::new(Vec::new()),
                rows,
            }
        }

        async fn statements(&self) -> Vec<(String, Vec<Value>)> {
            self.statements.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl DbExecutor for MockDb {
        fn backend_kind(&self) -> BackendKind {
            BackendKind::Sqlite
        }

        async fn execute_sql(&self, sql: &str, params: &[Value]) -> StoreResult<u64> {
            self.statements
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        async fn query(&self, sql: &str, params: &[Value]) -> StoreResult<Vec<Row>> {
            self.statements
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            Ok(self.rows.clone())
        }

        async fn query_one(&self, sql: &str, params: &[Value]) -> StoreResult<Row> {
            self.statements
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            self.rows
                .first()
                .cloned()
                .ok_or_else(|| StoreError::DoesNotExist("no rows".to_string()))
        }

        async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> StoreResult<Value> {
            self.statements
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            Ok(Value::Int(42))
        }
    }

    #[tokio::test]
    async fn test_save_inserts_when_pk_unset() {
        let db = MockDb::new(vec![]);
        let mut c = Collection {
            id: 0,
            title: "Beverages".into(),
            featured_product_id: None,
        };
        save_model(&mut c, &db).await.unwrap();
        // PK backfilled from the insert.
        assert_eq!(c.id, 42);

        let stmts = db.statements().await;
        assert!(stmts[0].0.starts_with("INSERT INTO \"store_collection\""));
    }

    #[tokio::test]
    async fn test_save_updates_when_pk_set() {
        let db = MockDb::new(vec![]);
        let mut c = Collection {
            id: 11,
            title: "Beverages".into(),
            featured_product_id: None,
        };
        save_model(&mut c, &db).await.unwrap();

        let stmts = db.statements().await;
        assert!(stmts[0].0.starts_with("UPDATE \"store_collection\" SET"));
        assert!(stmts[0].0.ends_with("WHERE \"id\" = ?"));
        // Params: title, featured_product_id (NULL), then the pk.
        assert_eq!(stmts[0].1.last(), Some(&Value::Int(11)));
    }

    #[tokio::test]
    async fn test_delete_model() {
        let db = MockDb::new(vec![]);
        let c = Collection {
            id: 11,
            title: "Beverages".into(),
            featured_product_id: None,
        };
        let affected = delete_model(&c, &db).await.unwrap();
        assert_eq!(affected, 1);

        let stmts = db.statements().await;
        assert_eq!(
            stmts[0].0,
            "DELETE FROM \"store_collection\" WHERE \"id\" = ?"
        );
    }

    #[tokio::test]
    async fn test_delete_model_without_pk_errors() {
        let db = MockDb::new(vec![]);
        let c = Collection {
            id: 0,
            title: "Beverages".into(),
            featured_product_id: None,
        };
        assert!(delete_model(&c, &db).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_model() {
        let row = Row::new(
            vec![
                "id".to_string(),
                "title".to_string(),
                "featured_product_id".to_string(),
            ],
            vec![
                Value::Int(11),
                Value::String("Renamed".to_string()),
                Value::Null,
            ],
        );
        let db = MockDb::new(vec![row]);
        let mut c = Collection {
            id: 11,
            title: "Beverages".into(),
            featured_product_id: Some(3),
        };
        refresh_model(&mut c, &db).await.unwrap();
        assert_eq!(c.title, "Renamed");
        assert_eq!(c.featured_product_id, None);
    }

    #[tokio::test]
    async fn test_create_model_always_inserts() {
        let db = MockDb::new(vec![]);
        let mut c = Collection {
            id: 7,
            title: "Snacks".into(),
            featured_product_id: None,
        };
        create_model(&mut c, &db).await.unwrap();
        assert_eq!(c.id, 42);

        let stmts = db.statements().await;
        assert!(stmts[0].0.starts_with("INSERT INTO"));
    }
}
