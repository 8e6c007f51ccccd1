//! Field type definitions for the data-access layer.
//!
//! Each [`FieldType`] variant corresponds to a column type the storefront
//! schema uses, and [`FieldDef`] captures the metadata about a single model
//! field. Field definitions drive DDL generation in [`schema`](crate::schema).

use crate::query::compiler::BackendKind;
use crate::value::Value;

/// The type of a model field, determining its SQL column type.
///
/// Relational fields (`ForeignKey`, `ManyToManyField`) carry additional
/// metadata about the relationship. Many-to-many fields produce no column of
/// their own; the through table is modeled separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Auto-incrementing 32-bit integer primary key.
    AutoField,
    /// Auto-incrementing 64-bit integer primary key.
    BigAutoField,
    /// Variable-length string with a max length.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// 32-bit signed integer.
    IntegerField,
    /// 64-bit signed integer.
    BigIntegerField,
    /// Fixed-precision decimal number.
    DecimalField {
        /// Maximum total digits.
        max_digits: u32,
        /// Digits after the decimal point.
        decimal_places: u32,
    },
    /// Boolean (true/false).
    BooleanField,
    /// Date without time.
    DateField,
    /// Date and time.
    DateTimeField,
    /// Email address (a `CharField` as far as the database is concerned).
    EmailField,
    /// Many-to-one relationship. `to` names the referenced table.
    ForeignKey {
        /// The referenced table name (e.g. "store_collection").
        to: String,
        /// Behavior when the referenced row is deleted.
        on_delete: OnDelete,
        /// The name used for the reverse relation.
        related_name: Option<String>,
    },
    /// Many-to-many relationship (via an intermediate table).
    ManyToManyField {
        /// The target table name.
        to: String,
        /// The intermediate ("through") table name.
        through: String,
    },
}

/// Behavior when a referenced row is deleted (ON DELETE action).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Delete all related rows (CASCADE).
    Cascade,
    /// Prevent deletion if related rows exist (RESTRICT).
    Protect,
    /// Set the foreign key to NULL.
    SetNull,
}

impl OnDelete {
    /// Returns the SQL clause for this delete action.
    pub const fn sql_clause(&self) -> &'static str {
        match self {
            Self::Cascade => "ON DELETE CASCADE",
            Self::Protect => "ON DELETE RESTRICT",
            Self::SetNull => "ON DELETE SET NULL",
        }
    }
}

/// Complete definition of a model field.
///
/// Constructed with the builder methods when implementing
/// [`Model`](crate::model::Model) for a type.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The field name (also the column name).
    pub name: &'static str,
    /// The type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed in the database.
    pub null: bool,
    /// Whether a UNIQUE constraint is applied.
    pub unique: bool,
    /// Whether a database index should be created.
    pub db_index: bool,
    /// Maximum character length (for `CharField` and similar).
    pub max_length: Option<usize>,
    /// Default value for new rows.
    pub default: Option<Value>,
}

impl FieldDef {
    /// Creates a new `FieldDef` with sensible defaults.
    ///
    /// Only the field name and type are required. All other attributes take
    /// their default values (non-null, no index, no unique constraint).
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            primary_key: false,
            null: false,
            unique: false,
            db_index: false,
            max_length: None,
            default: None,
        }
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values in the database.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Sets the maximum character length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Marks this field as having a UNIQUE constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks this field as having a database index.
    #[must_use]
    pub const fn db_index(mut self) -> Self {
        self.db_index = true;
        self
    }

    /// Sets the default value for this field.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns `true` if this field represents a relational field.
    pub const fn is_relation(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::ForeignKey { .. } | FieldType::ManyToManyField { .. }
        )
    }

    /// Returns the SQL column type for this field on the given backend, or
    /// `None` for fields that produce no column (many-to-many).
    pub fn column_type(&self, backend: BackendKind) -> Option<String> {
        let ty = match (&self.field_type, backend) {
            (FieldType::AutoField, BackendKind::Postgres) => "SERIAL".to_string(),
            (FieldType::BigAutoField, BackendKind::Postgres) => "BIGSERIAL".to_string(),
            // SQLite auto-increments INTEGER PRIMARY KEY rowid aliases.
            (FieldType::AutoField | FieldType::BigAutoField, BackendKind::Sqlite) => {
                "INTEGER".to_string()
            }
            (FieldType::CharField | FieldType::EmailField, _) => self
                .max_length
                .map_or_else(|| "VARCHAR".to_string(), |n| format!("VARCHAR({n})")),
            (FieldType::TextField, _) => "TEXT".to_string(),
            (FieldType::IntegerField, _) => "INTEGER".to_string(),
            (FieldType::BigIntegerField, _) => "BIGINT".to_string(),
            (
                FieldType::DecimalField {
                    max_digits,
                    decimal_places,
                },
                _,
            ) => format!("NUMERIC({max_digits}, {decimal_places})"),
            (FieldType::BooleanField, _) => "BOOLEAN".to_string(),
            (FieldType::DateField, _) => "DATE".to_string(),
            (FieldType::DateTimeField, BackendKind::Postgres) => "TIMESTAMP".to_string(),
            (FieldType::DateTimeField, BackendKind::Sqlite) => "DATETIME".to_string(),
            (FieldType::ForeignKey { .. }, _) => "INTEGER".to_string(),
            (FieldType::ManyToManyField { .. }, _) => return None,
        };
        Some(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_new_defaults() {
        let f = FieldDef::new("first_name", FieldType::CharField);
        assert_eq!(f.name, "first_name");
        assert!(!f.primary_key);
        assert!(!f.null);
        assert!(!f.unique);
        assert!(!f.db_index);
        assert!(f.max_length.is_none());
        assert!(f.default.is_none());
    }

    #[test]
    fn test_field_def_builder() {
        let f = FieldDef::new("email", FieldType::EmailField)
            .unique()
            .db_index()
            .max_length(254);
        assert!(f.unique);
        assert!(f.db_index);
        assert_eq!(f.max_length, Some(254));
    }

    #[test]
    fn test_field_def_default_value() {
        let f = FieldDef::new("inventory", FieldType::IntegerField).default(0);
        assert_eq!(f.default, Some(Value::Int(0)));
    }

    #[test]
    fn test_is_relation() {
        let fk = FieldDef::new(
            "collection_id",
            FieldType::ForeignKey {
                to: "store_collection".into(),
                on_delete: OnDelete::Protect,
                related_name: Some("products".into()),
            },
        );
        assert!(fk.is_relation());
        assert!(!FieldDef::new("title", FieldType::CharField).is_relation());
    }

    #[test]
    fn test_column_types_sqlite() {
        let id = FieldDef::new("id", FieldType::BigAutoField).primary_key();
        assert_eq!(id.column_type(BackendKind::Sqlite).unwrap(), "INTEGER");

        let title = FieldDef::new("title", FieldType::CharField).max_length(255);
        assert_eq!(
            title.column_type(BackendKind::Sqlite).unwrap(),
            "VARCHAR(255)"
        );

        let price = FieldDef::new(
            "unit_price",
            FieldType::DecimalField {
                max_digits: 6,
                decimal_places: 2,
            },
        );
        assert_eq!(
            price.column_type(BackendKind::Sqlite).unwrap(),
            "NUMERIC(6, 2)"
        );
    }

    #[test]
    fn test_column_types_postgres() {
        let id = FieldDef::new("id", FieldType::BigAutoField).primary_key();
        assert_eq!(id.column_type(BackendKind::Postgres).unwrap(), "BIGSERIAL");

        let placed = FieldDef::new("placed_at", FieldType::DateTimeField);
        assert_eq!(
            placed.column_type(BackendKind::Postgres).unwrap(),
            "TIMESTAMP"
        );
    }

    #[test]
    fn test_many_to_many_has_no_column() {
        let m2m = FieldDef::new(
            "promotions",
            FieldType::ManyToManyField {
                to: "store_promotion".into(),
                through: "store_product_promotions".into(),
            },
        );
        assert!(m2m.column_type(BackendKind::Sqlite).is_none());
    }

    #[test]
    fn test_on_delete_sql() {
        assert_eq!(OnDelete::Cascade.sql_clause(), "ON DELETE CASCADE");
        assert_eq!(OnDelete::Protect.sql_clause(), "ON DELETE RESTRICT");
        assert_eq!(OnDelete::SetNull.sql_clause(), "ON DELETE SET NULL");
    }
}
