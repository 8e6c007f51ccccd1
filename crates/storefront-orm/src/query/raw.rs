//! Raw SQL support: cursors and model-mapped raw queries.
//!
//! [`Cursor`] is the low-level escape hatch for executing hand-written SQL
//! statements and invoking stored procedures, bypassing the query builder.
//! [`RawQuerySet`] executes a raw SELECT and maps the results to model
//! instances.
//!
//! All raw SQL goes through parameterized placeholders to prevent SQL
//! injection.

use crate::executor::DbExecutor;
use crate::model::Model;
use crate::query::compiler::{BackendKind, Row};
use crate::value::Value;
use std::marker::PhantomData;
use storefront_core::{StoreError, StoreResult};

/// A low-level cursor for executing raw SQL against an executor.
///
/// Equivalent to taking a raw connection handle: statements are passed
/// through verbatim with their parameters.
pub struct Cursor<'a> {
    db: &'a dyn DbExecutor,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor over the given executor.
    pub fn new(db: &'a dyn DbExecutor) -> Self {
        Self { db }
    }

    /// Executes a statement that does not return rows (INSERT, UPDATE,
    /// DELETE, DDL). Returns the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> StoreResult<u64> {
        validate_raw_sql(sql)?;
        self.db.execute_sql(sql, params).await
    }

    /// Executes a query and returns all result rows.
    pub async fn fetch_all(&self, sql: &str, params: &[Value]) -> StoreResult<Vec<Row>> {
        validate_raw_sql(sql)?;
        self.db.query(sql, params).await
    }

    /// Executes a query and returns the first row, or `None`.
    pub async fn fetch_one(&self, sql: &str, params: &[Value]) -> StoreResult<Option<Row>> {
        validate_raw_sql(sql)?;
        let rows = self.db.query(sql, params).await?;
        Ok(rows.into_iter().next())
    }

    /// Invokes a stored procedure and returns its result rows.
    ///
    /// On PostgreSQL this compiles to `SELECT * FROM "name"($1, ...)`.
    /// SQLite has no stored procedures; the call reports an
    /// `OperationalError` there.
    pub async fn call_procedure(&self, name: &str, params: &[Value]) -> StoreResult<Vec<Row>> {
        if name.contains('"') || name.contains(';') {
            return Err(StoreError::SuspiciousOperation(format!(
                "Invalid procedure name: {name}"
            )));
        }
        match self.db.backend_kind() {
            BackendKind::Sqlite => Err(StoreError::OperationalError(
                "SQLite does not support stored procedures".to_string(),
            )),
            BackendKind::Postgres => {
                let placeholders: Vec<String> =
                    (1..=params.len()).map(|i| format!("${i}")).collect();
                let sql = format!("SELECT * FROM \"{name}\"({})", placeholders.join(", "));
                self.db.query(&sql, params).await
            }
        }
    }
}

/// A raw SQL query that returns model instances.
///
/// Executes a raw SELECT and maps each row to a model via `M::from_row()`.
/// The query MUST use parameterized placeholders (`?` for SQLite, `$1` for
/// PostgreSQL).
pub struct RawQuerySet<M: Model> {
    /// The raw SQL query string.
    sql: String,
    /// Parameterized query values.
    params: Vec<Value>,
    /// Optional column-to-field mapping overrides.
    translations: Vec<(String, String)>,
    _phantom: PhantomData<M>,
}

impl<M: Model> RawQuerySet<M> {
    /// Creates a new raw query set.
    ///
    /// The SQL should be a SELECT returning columns matching the model's
    /// fields.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            translations: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Adds column-to-field name translations.
    ///
    /// Use this when the raw SQL column names don't match the model field
    /// names. Each pair is (sql_column_name, model_field_name).
    #[must_use]
    pub fn translate(mut self, translations: Vec<(String, String)>) -> Self {
        self.translations = translations;
        self
    }

    /// Returns the SQL query string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the query parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Executes the raw query and returns model instances.
    pub async fn execute(&self, db: &dyn DbExecutor) -> StoreResult<Vec<M>> {
        validate_raw_sql(&self.sql)?;
        let rows = db.query(&self.sql, &self.params).await?;

        if self.translations.is_empty() {
            rows.iter().map(M::from_row).collect()
        } else {
            rows.iter()
                .map(|row| {
                    let translated = self.translate_row(row);
                    M::from_row(&translated)
                })
                .collect()
        }
    }

    /// Executes the raw query and returns the first model instance, or `None`.
    pub async fn first(&self, db: &dyn DbExecutor) -> StoreResult<Option<M>> {
        let mut results = self.execute(db).await?;
        if results.is_empty() {
            Ok(None)
        } else {
            Ok(Some(results.remove(0)))
        }
    }

    /// Applies column name translations to a row.
    fn translate_row(&self, row: &Row) -> Row {
        let columns: Vec<String> = row
            .columns()
            .iter()
            .map(|col| {
                self.translations
                    .iter()
                    .find(|(from, _)| from == col)
                    .map_or_else(|| col.clone(), |(_, to)| to.clone())
            })
            .collect();

        let values: Vec<Value> = (0..row.len())
            .map(|i| row.get_by_index::<Value>(i).unwrap_or(Value::Null))
            .collect();

        Row::new(columns, values)
    }
}

/// Best-effort check that a raw SQL string uses parameterized queries rather
/// than string interpolation for values.
///
/// This is a heuristic, not a SQL parser; it rejects only patterns that
/// strongly suggest statement splicing.
pub fn validate_raw_sql(sql: &str) -> StoreResult<()> {
    let lower = sql.to_lowercase();
    if lower.contains("'; ") || lower.contains("\"; ") {
        return Err(StoreError::SuspiciousOperation(
            "Raw SQL contains patterns that may indicate SQL injection. \
             Use parameterized queries instead of string interpolation."
                .to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDef, FieldType};
    use crate::model::ModelMeta;
    use std::sync::LazyLock;
    use tokio::sync::Mutex;

    struct Product {
        id: i64,
        title: String,
    }

    impl Model for Product {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
                app_label: "store",
                model_name: "product",
                db_table: "store_product",
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
            ]
        }

        fn from_row(row: &Row) -> Result<Self, StoreError> {
            Ok(Self {
                id: row.get("id")?,
                title: row.get("title")?,
            })
        }
    }

    /// Mock database that returns predefined rows and records calls.
    struct MockDb {
        backend: BackendKind,
        rows: Vec<Row>,
        executed: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl MockDb {
        fn new(backend: BackendKind, rows: Vec<Row>) -> Self {
            Self {
                backend,
                rows,
                executed: Mutex::new(Vec::new()),
            }
        }

        async fn executed(&self) -> Vec<(String, Vec<Value>)> {
            self.executed.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl DbExecutor for MockDb {
        fn backend_kind(&self) -> BackendKind {
            self.backend
        }

        async fn execute_sql(&self, sql: &str, params: &[Value]) -> StoreResult<u64> {
            self.executed
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        async fn query(&self, sql: &str, params: &[Value]) -> StoreResult<Vec<Row>> {
            self.executed
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            Ok(self.rows.clone())
        }

        async fn query_one(&self, sql: &str, params: &[Value]) -> StoreResult<Row> {
            self.executed
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            self.rows
                .first()
                .cloned()
                .ok_or_else(|| StoreError::DoesNotExist("no rows".to_string()))
        }

        async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> StoreResult<Value> {
            self.executed
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            Ok(Value::Int(1))
        }
    }

    fn product_rows() -> Vec<Row> {
        vec![
            Row::new(
                vec!["id".to_string(), "title".to_string()],
                vec![Value::Int(1), Value::String("Coffee".to_string())],
            ),
            Row::new(
                vec!["id".to_string(), "title".to_string()],
                vec![Value::Int(2), Value::String("Tea".to_string())],
            ),
        ]
    }

    #[tokio::test]
    async fn test_cursor_fetch_all() {
        let db = MockDb::new(BackendKind::Sqlite, product_rows());
        let cursor = Cursor::new(&db);

        let rows = cursor
            .fetch_all("SELECT * FROM store_product", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get::<String>("title").unwrap(), "Coffee");

        let executed = db.executed().await;
        assert_eq!(executed[0].0, "SELECT * FROM store_product");
    }

    #[tokio::test]
    async fn test_cursor_fetch_one() {
        let db = MockDb::new(BackendKind::Sqlite, product_rows());
        let cursor = Cursor::new(&db);
        let row = cursor
            .fetch_one("SELECT * FROM store_product LIMIT 1", &[])
            .await
            .unwrap();
        assert!(row.is_some());

        let db = MockDb::new(BackendKind::Sqlite, vec![]);
        let cursor = Cursor::new(&db);
        let row = cursor
            .fetch_one("SELECT * FROM store_product LIMIT 1", &[])
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_cursor_execute_parameterized() {
        let db = MockDb::new(BackendKind::Sqlite, vec![]);
        let cursor = Cursor::new(&db);
        let affected = cursor
            .execute(
                "UPDATE store_product SET title = ? WHERE id = ?",
                &[Value::from("Renamed"), Value::from(1)],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let executed = db.executed().await;
        assert_eq!(executed[0].1.len(), 2);
    }

    #[tokio::test]
    async fn test_call_procedure_postgres() {
        let db = MockDb::new(BackendKind::Postgres, product_rows());
        let cursor = Cursor::new(&db);
        let rows = cursor
            .call_procedure("get_customers", &[Value::from(1), Value::from(2)])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        let executed = db.executed().await;
        assert_eq!(executed[0].0, "SELECT * FROM \"get_customers\"($1, $2)");
        assert_eq!(executed[0].1, vec![Value::Int(1), Value::Int(2)]);
    }

    #[tokio::test]
    async fn test_call_procedure_sqlite_unsupported() {
        let db = MockDb::new(BackendKind::Sqlite, vec![]);
        let cursor = Cursor::new(&db);
        let result = cursor.call_procedure("get_customers", &[]).await;
        assert!(matches!(result, Err(StoreError::OperationalError(_))));
    }

    #[tokio::test]
    async fn test_call_procedure_rejects_bad_name() {
        let db = MockDb::new(BackendKind::Postgres, vec![]);
        let cursor = Cursor::new(&db);
        let result = cursor.call_procedure("get\"; DROP TABLE x", &[]).await;
        assert!(matches!(result, Err(StoreError::SuspiciousOperation(_))));
    }

    #[tokio::test]
    async fn test_raw_query_set_execute() {
        let db = MockDb::new(BackendKind::Sqlite, product_rows());
        let raw = RawQuerySet::<Product>::new(
            "SELECT * FROM store_product WHERE title LIKE ?",
            vec![Value::String("%e%".to_string())],
        );

        let results = raw.execute(&db).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 1);
        assert_eq!(results[0].title, "Coffee");

        let executed = db.executed().await;
        assert_eq!(executed[0].1, vec![Value::String("%e%".to_string())]);
    }

    #[tokio::test]
    async fn test_raw_query_set_first() {
        let db = MockDb::new(BackendKind::Sqlite, product_rows());
        let raw = RawQuerySet::<Product>::new("SELECT * FROM store_product", vec![]);
        let first = raw.first(&db).await.unwrap();
        assert_eq!(first.unwrap().title, "Coffee");

        let db = MockDb::new(BackendKind::Sqlite, vec![]);
        let raw = RawQuerySet::<Product>::new("SELECT * FROM store_product", vec![]);
        assert!(raw.first(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_raw_query_set_translations() {
        let rows = vec![Row::new(
            vec!["product_id".to_string(), "product_title".to_string()],
            vec![Value::Int(3), Value::String("Mug".to_string())],
        )];
        let db = MockDb::new(BackendKind::Sqlite, rows);

        let raw = RawQuerySet::<Product>::new(
            "SELECT product_id, product_title FROM product_summary",
            vec![],
        )
        .translate(vec![
            ("product_id".to_string(), "id".to_string()),
            ("product_title".to_string(), "title".to_string()),
        ]);

        let results = raw.execute(&db).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 3);
        assert_eq!(results[0].title, "Mug");
    }

    #[test]
    fn test_raw_query_set_accessors() {
        let raw = RawQuerySet::<Product>::new(
            "SELECT * FROM store_product WHERE id = ?",
            vec![Value::Int(1)],
        );
        assert_eq!(raw.sql(), "SELECT * FROM store_product WHERE id = ?");
        assert_eq!(raw.params(), &[Value::Int(1)]);
    }

    #[test]
    fn test_validate_raw_sql() {
        assert!(validate_raw_sql("SELECT * FROM store_product WHERE id = ?").is_ok());
        assert!(validate_raw_sql("INSERT INTO tags_tag (label) VALUES ($1)").is_ok());
        assert!(
            validate_raw_sql("SELECT * FROM users WHERE name = ''; DROP TABLE users").is_err()
        );
    }
}
