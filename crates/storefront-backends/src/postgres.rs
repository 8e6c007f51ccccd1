//! PostgreSQL database backend using `tokio-postgres` and `deadpool-postgres`.
//!
//! This module provides the [`PostgresBackend`] which implements the
//! [`DatabaseBackend`](crate::base::DatabaseBackend) trait using connection
//! pooling via `deadpool-postgres`.

use crate::base::{DatabaseBackend, DatabaseConfig, Transaction};
use storefront_core::StoreError;
use storefront_orm::query::compiler::{classify_database_error, BackendKind, SqlCompiler};
use storefront_orm::value::Value;
use storefront_orm::Row;

/// A PostgreSQL database backend.
///
/// Uses `deadpool-postgres` for connection pooling and `tokio-postgres` for
/// query execution.
pub struct PostgresBackend {
    pool: deadpool_postgres::Pool,
}

impl PostgresBackend {
    /// Creates a new `PostgresBackend` from a `deadpool-postgres` pool.
    pub const fn new(pool: deadpool_postgres::Pool) -> Self {
        Self { pool }
    }

    /// Creates a new backend from a [`DatabaseConfig`].
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut pg_config = deadpool_postgres::Config::new();
        pg_config.dbname = Some(config.name.clone());
        pg_config.host = config.host.clone();
        pg_config.port = config.port;
        pg_config.user = config.user.clone();
        pg_config.password = config.password.clone();

        let pool = pg_config
            .create_pool(
                Some(deadpool_postgres::Runtime::Tokio1),
                tokio_postgres::NoTls,
            )
            .map_err(|e| StoreError::OperationalError(format!("Failed to create pool: {e}")))?;

        Ok(Self { pool })
    }

    /// Converts ORM `Value` types to `tokio-postgres` parameter boxes.
    fn value_to_sql_params(
        params: &[Value],
    ) -> Vec<Box<dyn tokio_postgres::types::ToSql + Sync + Send>> {
        params
            .iter()
            .map(|v| -> Box<dyn tokio_postgres::types::ToSql + Sync + Send> {
                match v {
                    Value::Null => Box::new(Option::<String>::None),
                    Value::Bool(b) => Box::new(*b),
                    Value::Int(i) => Box::new(*i),
                    Value::Float(f) => Box::new(*f),
                    Value::String(s) => Box::new(s.clone()),
                    Value::Bytes(b) => Box::new(b.clone()),
                    Value::Date(d) => Box::new(*d),
                    Value::DateTime(dt) => Box::new(*dt),
                    Value::List(_) => {
                        // Lists only appear in IN clauses, which the compiler
                        // flattens into individual placeholders.
                        Box::new(Option::<String>::None)
                    }
                }
            })
            .collect()
    }

    /// Converts a `tokio_postgres::Row` to our generic `Row`.
    fn convert_row(pg_row: &tokio_postgres::Row) -> Row {
        let columns: Vec<String> = pg_row
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let values: Vec<Value> = pg_row
            .columns()
            .iter()
            .enumerate()
            .map(|(i, col)| {
                use tokio_postgres::types::Type;
                match *col.type_() {
                    Type::BOOL => pg_row
                        .try_get::<_, Option<bool>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Bool),
                    Type::INT2 => pg_row
                        .try_get::<_, Option<i16>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, |v| Value::Int(i64::from(v))),
                    Type::INT4 => pg_row
                        .try_get::<_, Option<i32>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, |v| Value::Int(i64::from(v))),
                    Type::INT8 => pg_row
                        .try_get::<_, Option<i64>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Int),
                    Type::FLOAT4 => pg_row
                        .try_get::<_, Option<f32>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, |v| Value::Float(f64::from(v))),
                    Type::FLOAT8 => pg_row
                        .try_get::<_, Option<f64>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Float),
                    Type::TEXT | Type::VARCHAR | Type::CHAR | Type::NAME | Type::NUMERIC => {
                        pg_row
                            .try_get::<_, Option<String>>(i)
                            .ok()
                            .flatten()
                            .map_or(Value::Null, Value::String)
                    }
                    Type::BYTEA => pg_row
                        .try_get::<_, Option<Vec<u8>>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Bytes),
                    Type::DATE => pg_row
                        .try_get::<_, Option<chrono::NaiveDate>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::Date),
                    Type::TIMESTAMP => pg_row
                        .try_get::<_, Option<chrono::NaiveDateTime>>(i)
                        .ok()
                        .flatten()
                        .map_or(Value::Null, Value::DateTime),
                    _ => {
                        // Fall back to string representation for other types.
                        pg_row
                            .try_get::<_, Option<String>>(i)
                            .ok()
                            .flatten()
                            .map_or(Value::Null, Value::String)
                    }
                }
            })
            .collect();

        Row::new(columns, values)
    }
}

#[async_trait::async_trait]
impl DatabaseBackend for PostgresBackend {
    fn vendor(&self) -> &str {
        "postgresql"
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, StoreError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::OperationalError(format!("Pool error: {e}")))?;

        let sql_params = Self::value_to_sql_params(params);
        let param_refs: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = sql_params
            .iter()
            .map(|p| p.as_ref() as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect();

        client
            .execute(sql, &param_refs)
            .await
            .map_err(|e| classify_database_error(e.to_string()))
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::OperationalError(format!("Pool error: {e}")))?;

        let sql_params = Self::value_to_sql_params(params);
        let param_refs: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = sql_params
            .iter()
            .map(|p| p.as_ref() as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect();

        let rows = client
            .query(sql, &param_refs)
            .await
            .map_err(|e| classify_database_error(e.to_string()))?;

        Ok(rows.iter().map(Self::convert_row).collect())
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Row, StoreError> {
        let rows = DatabaseBackend::query(self, sql, params).await?;
        match rows.len() {
            0 => Err(StoreError::DoesNotExist("No rows returned".to_string())),
            1 => Ok(rows.into_iter().next().unwrap()),
            n => Err(StoreError::MultipleObjectsReturned(format!(
                "Expected 1 row, got {n}"
            ))),
        }
    }

    async fn begin_transaction(&self) -> Result<Transaction, StoreError> {
        DatabaseBackend::execute(self, "BEGIN", &[]).await?;
        Ok(Transaction::new(Box::new(())))
    }

    async fn commit(&self) -> Result<(), StoreError> {
        DatabaseBackend::execute(self, "COMMIT", &[]).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        DatabaseBackend::execute(self, "ROLLBACK", &[]).await?;
        Ok(())
    }

    fn compiler(&self) -> SqlCompiler {
        SqlCompiler::new(BackendKind::Postgres)
    }
}

#[async_trait::async_trait]
impl storefront_orm::DbExecutor for PostgresBackend {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn execute_sql(&self, sql: &str, params: &[Value]) -> Result<u64, StoreError> {
        DatabaseBackend::execute(self, sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        DatabaseBackend::query(self, sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Row, StoreError> {
        DatabaseBackend::query_one(self, sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> Result<Value, StoreError> {
        // PostgreSQL supports RETURNING; append it to the INSERT.
        let sql_returning = format!("{sql} RETURNING id");
        let rows = DatabaseBackend::query(self, &sql_returning, params).await?;
        rows.into_iter().next().map_or_else(
            || {
                Err(StoreError::DatabaseError(
                    "INSERT RETURNING returned no rows".to_string(),
                ))
            },
            |row| row.get::<Value>("id"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_sql_params_basic() {
        let params = vec![
            Value::Bool(true),
            Value::Int(42),
            Value::Float(1.25),
            Value::String("hello".to_string()),
            Value::Null,
        ];
        let sql_params = PostgresBackend::value_to_sql_params(&params);
        assert_eq!(sql_params.len(), 5);
    }

    #[test]
    fn test_value_to_sql_params_chrono() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dt = date.and_hms_opt(12, 0, 0).unwrap();
        let sql_params =
            PostgresBackend::value_to_sql_params(&[Value::Date(date), Value::DateTime(dt)]);
        assert_eq!(sql_params.len(), 2);
    }

    #[test]
    fn test_compiler_dialect() {
        let compiler = SqlCompiler::new(BackendKind::Postgres);
        let (sql, _) = compiler.compile_insert("store_tag", &[("label", Value::from("sale"))]);
        assert!(sql.contains("$1"));
    }

    #[test]
    fn test_config_backend_kind() {
        let cfg = DatabaseConfig::postgres("storefront", "localhost", 5432, "store", "secret");
        assert_eq!(cfg.backend, BackendKind::Postgres);
    }
}
