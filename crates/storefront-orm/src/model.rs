//! Model trait and metadata.
//!
//! The [`Model`] trait is the core abstraction that all storefront models
//! implement. It provides access to metadata, field values, and construction
//! from database rows. [`ModelMeta`] captures the table name, default
//! ordering, and field definitions that drive DDL generation.

use crate::fields::FieldDef;
use crate::query::compiler::OrderBy;
use crate::value::Value;
use storefront_core::StoreError;

pub use crate::query::compiler::Row;

/// The core trait for all database models.
///
/// Any struct that represents a database table implements this trait by hand;
/// the implementations are mechanical and keep the field list next to the
/// struct definition.
///
/// # Examples
///
/// ```
/// use storefront_orm::fields::{FieldDef, FieldType};
/// use storefront_orm::model::{Model, ModelMeta, Row};
/// use storefront_orm::value::Value;
/// use storefront_core::StoreError;
///
/// struct Tag {
///     id: i64,
///     label: String,
/// }
///
/// impl Model for Tag {
///     fn meta() -> &'static ModelMeta {
///         use std::sync::LazyLock;
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
///             app_label: "tags",
///             model_name: "tag",
///             db_table: "tags_tag",
///             ordering: vec![],
///             fields: vec![
///                 FieldDef::new("id", FieldType::BigAutoField).primary_key(),
///                 FieldDef::new("label", FieldType::CharField).max_length(255),
///             ],
///         });
///         &META
///     }
///
///     fn pk(&self) -> Option<Value> {
///         (self.id != 0).then_some(Value::Int(self.id))
///     }
///     fn set_pk(&mut self, value: Value) {
///         if let Value::Int(id) = value { self.id = id; }
///     }
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", Value::Int(self.id)), ("label", Value::String(self.label.clone()))]
///     }
///     fn from_row(row: &Row) -> Result<Self, StoreError> {
///         Ok(Self { id: row.get("id")?, label: row.get("label")? })
///     }
/// }
/// ```
pub trait Model: Send + Sync + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the database table name.
    fn table_name() -> &'static str {
        Self::meta().db_table
    }

    /// Returns the application label this model belongs to.
    fn app_label() -> &'static str {
        Self::meta().app_label
    }

    /// Returns the primary key value, or `None` if the instance is unsaved.
    fn pk(&self) -> Option<Value>;

    /// Sets the primary key value on this instance (used after INSERT).
    fn set_pk(&mut self, value: Value);

    /// Returns the name of the primary key field.
    fn pk_field_name() -> &'static str {
        "id"
    }

    /// Returns all field name-value pairs for this instance.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Returns field name-value pairs excluding the primary key.
    /// Used for INSERT operations where the PK is auto-generated.
    fn non_pk_field_values(&self) -> Vec<(&'static str, Value)> {
        let pk_name = Self::pk_field_name();
        self.field_values()
            .into_iter()
            .filter(|(name, _)| *name != pk_name)
            .collect()
    }

    /// Constructs a model instance from a database row.
    fn from_row(row: &Row) -> Result<Self, StoreError>
    where
        Self: Sized;
}

/// Metadata about a model: table identity, default ordering, and fields.
#[derive(Debug)]
pub struct ModelMeta {
    /// The application label (e.g. "store", "tags").
    pub app_label: &'static str,
    /// The model name in lowercase (e.g. "product").
    pub model_name: &'static str,
    /// The database table name (e.g. "store_product").
    pub db_table: &'static str,
    /// Default ordering for queries.
    pub ordering: Vec<OrderBy>,
    /// Field definitions for this model.
    pub fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// Returns the field definition with the given name, if any.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the primary key field definition.
    pub fn pk_field(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.primary_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldType;
    use std::sync::LazyLock;

    struct Widget {
        id: i64,
        name: String,
    }

    impl Model for Widget {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
                app_label: "store",
                model_name: "widget",
                db_table: "store_widget",
                ordering: vec![OrderBy::asc("name")],
                fields: vec![
                    FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                    FieldDef::new("name", FieldType::CharField).max_length(100),
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
                ("name", Value::String(self.name.clone())),
            ]
        }

        fn from_row(row: &Row) -> Result<Self, StoreError> {
            Ok(Self {
                id: row.get("id")?,
                name: row.get("name")?,
            })
        }
    }

    #[test]
    fn test_model_meta() {
        let meta = Widget::meta();
        assert_eq!(meta.app_label, "store");
        assert_eq!(meta.db_table, "store_widget");
        assert_eq!(meta.fields.len(), 2);
        assert_eq!(Widget::table_name(), "store_widget");
        assert_eq!(Widget::app_label(), "store");
    }

    #[test]
    fn test_meta_field_lookup() {
        let meta = Widget::meta();
        assert!(meta.field("name").is_some());
        assert!(meta.field("missing").is_none());
        assert_eq!(meta.pk_field().unwrap().name, "id");
    }

    #[test]
    fn test_pk_none_when_unsaved() {
        let w = Widget {
            id: 0,
            name: "bolt".into(),
        };
        assert!(w.pk().is_none());

        let w = Widget {
            id: 7,
            name: "bolt".into(),
        };
        assert_eq!(w.pk(), Some(Value::Int(7)));
    }

    #[test]
    fn test_non_pk_field_values() {
        let w = Widget {
            id: 3,
            name: "nut".into(),
        };
        let values = w.non_pk_field_values();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].0, "name");
    }

    #[test]
    fn test_from_row() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::Int(42), Value::String("gear".to_string())],
        );
        let w = Widget::from_row(&row).unwrap();
        assert_eq!(w.id, 42);
        assert_eq!(w.name, "gear");
    }

    #[test]
    fn test_set_pk() {
        let mut w = Widget {
            id: 0,
            name: "cam".into(),
        };
        w.set_pk(Value::Int(99));
        assert_eq!(w.id, 99);
    }
}
