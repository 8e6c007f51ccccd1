//! DDL generation from model metadata.
//!
//! Builds `CREATE TABLE` statements for a [`ModelMeta`] in the target
//! backend's dialect. Many-to-many fields produce no column; their through
//! tables are modeled separately and generate their own DDL.

use crate::fields::FieldType;
use crate::model::ModelMeta;
use crate::query::compiler::BackendKind;
use crate::value::Value;

/// Renders a default value as a SQL literal for a column DEFAULT clause.
fn default_literal(value: &Value, backend: BackendKind) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => match backend {
            BackendKind::Sqlite => if *b { "1" } else { "0" }.to_string(),
            BackendKind::Postgres => if *b { "TRUE" } else { "FALSE" }.to_string(),
        },
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// Generates the `CREATE TABLE IF NOT EXISTS` statement for a model.
pub fn create_table_sql(meta: &ModelMeta, backend: BackendKind) -> String {
    let mut columns: Vec<String> = Vec::new();

    for field in &meta.fields {
        let Some(col_type) = field.column_type(backend) else {
            continue; // many-to-many: no column of its own
        };

        let mut clause = format!("\"{}\" {col_type}", field.name);

        if field.primary_key {
            match (&field.field_type, backend) {
                (FieldType::AutoField | FieldType::BigAutoField, BackendKind::Sqlite) => {
                    clause.push_str(" PRIMARY KEY AUTOINCREMENT");
                }
                _ => clause.push_str(" PRIMARY KEY"),
            }
        } else if field.null {
            clause.push_str(" NULL");
        } else {
            clause.push_str(" NOT NULL");
        }

        if field.unique && !field.primary_key {
            clause.push_str(" UNIQUE");
        }

        if let Some(ref default) = field.default {
            clause.push_str(&format!(" DEFAULT {}", default_literal(default, backend)));
        }

        if let FieldType::ForeignKey { to, on_delete, .. } = &field.field_type {
            clause.push_str(&format!(" REFERENCES \"{to}\" (\"id\") {}", on_delete.sql_clause()));
        }

        columns.push(clause);
    }

    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        meta.db_table,
        columns.join(", ")
    )
}

/// Generates `CREATE INDEX` statements for the model's indexed fields.
pub fn create_index_sql(meta: &ModelMeta) -> Vec<String> {
    meta.fields
        .iter()
        .filter(|f| f.db_index && !f.primary_key)
        .map(|f| {
            format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{}_{}\" ON \"{}\" (\"{}\")",
                meta.db_table, f.name, meta.db_table, f.name
            )
        })
        .collect()
}

/// Generates the `DROP TABLE IF EXISTS` statement for a model.
pub fn drop_table_sql(meta: &ModelMeta) -> String {
    format!("DROP TABLE IF EXISTS \"{}\"", meta.db_table)
}
