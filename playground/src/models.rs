//! Storefront models.
//!
//! Two apps share the database: `store` (collections, products, promotions,
//! customers, orders) and `tags` (labels attached to arbitrary rows by table
//! name and object id).

use std::sync::LazyLock;

use storefront_core::StoreError;
use storefront_orm::fields::{FieldDef, FieldType, OnDelete};
use storefront_orm::model::{Model, ModelMeta, Row};
use storefront_orm::query::compiler::OrderBy;
use storefront_orm::query::lookups::{Lookup, Q};
use storefront_orm::query::{Manager, QuerySet, SelectRelatedField};
use storefront_orm::value::Value;

/// A product collection (e.g. "Beverages").
#[derive(Debug, Clone)]
pub struct Collection {
    /// Primary key.
    pub id: i64,
    /// The collection title.
    pub title: String,
    /// Optional spotlight product for the collection.
    pub featured_product_id: Option<i64>,
}

impl Collection {
    /// Returns the manager for collection queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }

    /// Creates a new unsaved collection.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            featured_product_id: None,
        }
    }
}

impl Model for Collection {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "store",
            model_name: "collection",
            db_table: "store_collection",
            ordering: vec![OrderBy::asc("title")],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new("title", FieldType::CharField).max_length(255),
                FieldDef::new(
                    "featured_product_id",
                    FieldType::ForeignKey {
                        to: "store_product".into(),
                        on_delete: OnDelete::SetNull,
                        related_name: None,
                    },
                )
                .nullable(),
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

/// A product for sale.
#[derive(Debug, Clone)]
pub struct Product {
    /// Primary key.
    pub id: i64,
    /// The product title.
    pub title: String,
    /// URL-friendly identifier.
    pub slug: String,
    /// Free-form description.
    pub description: String,
    /// The unit price.
    pub unit_price: f64,
    /// Units currently in stock.
    pub inventory: i64,
    /// When the row was last written.
    pub last_update: chrono::NaiveDateTime,
    /// The collection this product belongs to.
    pub collection_id: i64,
}

impl Product {
    /// Returns the manager for product queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }

    /// Relation metadata for eagerly joining the product's collection.
    pub fn collection_relation() -> SelectRelatedField {
        SelectRelatedField {
            field_name: "collection".to_string(),
            related_table: "store_collection".to_string(),
            fk_column: "collection_id".to_string(),
            related_column: "id".to_string(),
            alias: "collection".to_string(),
        }
    }
}

impl Model for Product {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "store",
            model_name: "product",
            db_table: "store_product",
            ordering: vec![OrderBy::asc("title")],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new("title", FieldType::CharField).max_length(255),
                FieldDef::new("slug", FieldType::CharField).max_length(255),
                FieldDef::new("description", FieldType::TextField),
                FieldDef::new(
                    "unit_price",
                    FieldType::DecimalField {
                        max_digits: 6,
                        decimal_places: 2,
                    },
                ),
                FieldDef::new("inventory", FieldType::IntegerField),
                FieldDef::new("last_update", FieldType::DateTimeField),
                FieldDef::new(
                    "collection_id",
                    FieldType::ForeignKey {
                        to: "store_collection".into(),
                        on_delete: OnDelete::Protect,
                        related_name: Some("products".into()),
                    },
                ),
                FieldDef::new(
                    "promotions",
                    FieldType::ManyToManyField {
                        to: "store_promotion".into(),
                        through: "store_product_promotions".into(),
                    },
                ),
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
            ("slug", Value::String(self.slug.clone())),
            ("description", Value::String(self.description.clone())),
            ("unit_price", Value::Float(self.unit_price)),
            ("inventory", Value::Int(self.inventory)),
            ("last_update", Value::DateTime(self.last_update)),
            ("collection_id", Value::Int(self.collection_id)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            description: row.get("description")?,
            unit_price: row.get("unit_price")?,
            inventory: row.get("inventory")?,
            last_update: row.get("last_update")?,
            collection_id: row.get("collection_id")?,
        })
    }
}

/// A discount applied to products.
#[derive(Debug, Clone)]
pub struct Promotion {
    /// Primary key.
    pub id: i64,
    /// What the promotion offers.
    pub description: String,
    /// Discount fraction (0.2 = 20% off).
    pub discount: f64,
}

impl Promotion {
    /// Returns the manager for promotion queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }
}

impl Model for Promotion {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "store",
            model_name: "promotion",
            db_table: "store_promotion",
            ordering: vec![],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new("description", FieldType::CharField).max_length(255),
                FieldDef::new(
                    "discount",
                    FieldType::DecimalField {
                        max_digits: 4,
                        decimal_places: 2,
                    },
                ),
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
            ("description", Value::String(self.description.clone())),
            ("discount", Value::Float(self.discount)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get("id")?,
            description: row.get("description")?,
            discount: row.get("discount")?,
        })
    }
}

/// Through table linking products to promotions.
#[derive(Debug, Clone)]
pub struct ProductPromotion {
    /// Primary key.
    pub id: i64,
    /// The promoted product.
    pub product_id: i64,
    /// The promotion applied.
    pub promotion_id: i64,
}

impl ProductPromotion {
    /// Returns the manager for through-table queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }
}

impl Model for ProductPromotion {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "store",
            model_name: "productpromotion",
            db_table: "store_product_promotions",
            ordering: vec![],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new(
                    "product_id",
                    FieldType::ForeignKey {
                        to: "store_product".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: None,
                    },
                ),
                FieldDef::new(
                    "promotion_id",
                    FieldType::ForeignKey {
                        to: "store_promotion".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: None,
                    },
                ),
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
            ("product_id", Value::Int(self.product_id)),
            ("promotion_id", Value::Int(self.promotion_id)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get("id")?,
            product_id: row.get("product_id")?,
            promotion_id: row.get("promotion_id")?,
        })
    }
}

/// A store customer.
#[derive(Debug, Clone)]
pub struct Customer {
    /// Primary key.
    pub id: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email, unique per customer.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional date of birth.
    pub birth_date: Option<chrono::NaiveDate>,
    /// Membership tier code.
    pub membership: String,
}

impl Customer {
    /// Bronze membership tier.
    pub const MEMBERSHIP_BRONZE: &'static str = "B";
    /// Silver membership tier.
    pub const MEMBERSHIP_SILVER: &'static str = "S";
    /// Gold membership tier.
    pub const MEMBERSHIP_GOLD: &'static str = "G";

    /// Returns the manager for customer queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }
}

impl Model for Customer {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "store",
            model_name: "customer",
            db_table: "store_customer",
            ordering: vec![OrderBy::asc("last_name"), OrderBy::asc("first_name")],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new("first_name", FieldType::CharField).max_length(255),
                FieldDef::new("last_name", FieldType::CharField).max_length(255),
                FieldDef::new("email", FieldType::EmailField)
                    .max_length(254)
                    .unique(),
                FieldDef::new("phone", FieldType::CharField)
                    .max_length(255)
                    .nullable(),
                FieldDef::new("birth_date", FieldType::DateField).nullable(),
                FieldDef::new("membership", FieldType::CharField)
                    .max_length(1)
                    .default(Self::MEMBERSHIP_BRONZE),
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
            ("first_name", Value::String(self.first_name.clone())),
            ("last_name", Value::String(self.last_name.clone())),
            ("email", Value::String(self.email.clone())),
            ("phone", Value::from(self.phone.clone())),
            ("birth_date", Value::from(self.birth_date)),
            ("membership", Value::String(self.membership.clone())),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get("id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            birth_date: row.get("birth_date")?,
            membership: row.get("membership")?,
        })
    }
}

/// A customer order.
#[derive(Debug, Clone)]
pub struct Order {
    /// Primary key.
    pub id: i64,
    /// When the order was placed.
    pub placed_at: chrono::NaiveDateTime,
    /// Payment status code.
    pub payment_status: String,
    /// The customer who placed the order.
    pub customer_id: i64,
}

impl Order {
    /// Payment has not been captured yet.
    pub const PAYMENT_PENDING: &'static str = "P";
    /// Payment completed.
    pub const PAYMENT_COMPLETE: &'static str = "C";
    /// Payment failed.
    pub const PAYMENT_FAILED: &'static str = "F";

    /// Returns the manager for order queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }

    /// Relation metadata for eagerly joining the order's customer.
    pub fn customer_relation() -> SelectRelatedField {
        SelectRelatedField {
            field_name: "customer".to_string(),
            related_table: "store_customer".to_string(),
            fk_column: "customer_id".to_string(),
            related_column: "id".to_string(),
            alias: "customer".to_string(),
        }
    }
}

impl Model for Order {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "store",
            model_name: "order",
            db_table: "store_order",
            ordering: vec![OrderBy::desc("placed_at")],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new("placed_at", FieldType::DateTimeField),
                FieldDef::new("payment_status", FieldType::CharField)
                    .max_length(1)
                    .default(Self::PAYMENT_PENDING),
                FieldDef::new(
                    "customer_id",
                    FieldType::ForeignKey {
                        to: "store_customer".into(),
                        on_delete: OnDelete::Protect,
                        related_name: Some("orders".into()),
                    },
                ),
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
            ("placed_at", Value::DateTime(self.placed_at)),
            ("payment_status", Value::String(self.payment_status.clone())),
            ("customer_id", Value::Int(self.customer_id)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get("id")?,
            placed_at: row.get("placed_at")?,
            payment_status: row.get("payment_status")?,
            customer_id: row.get("customer_id")?,
        })
    }
}

/// A line item on an order.
#[derive(Debug, Clone)]
pub struct OrderItem {
    /// Primary key.
    pub id: i64,
    /// The parent order.
    pub order_id: i64,
    /// The ordered product.
    pub product_id: i64,
    /// Number of units.
    pub quantity: i64,
    /// The unit price at the time of the order.
    pub unit_price: f64,
}

impl OrderItem {
    /// Returns the manager for order item queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }
}

impl Model for OrderItem {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "store",
            model_name: "orderitem",
            db_table: "store_orderitem",
            ordering: vec![],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new(
                    "order_id",
                    FieldType::ForeignKey {
                        to: "store_order".into(),
                        on_delete: OnDelete::Protect,
                        related_name: Some("items".into()),
                    },
                ),
                FieldDef::new(
                    "product_id",
                    FieldType::ForeignKey {
                        to: "store_product".into(),
                        on_delete: OnDelete::Protect,
                        related_name: Some("orderitems".into()),
                    },
                ),
                FieldDef::new("quantity", FieldType::IntegerField),
                FieldDef::new(
                    "unit_price",
                    FieldType::DecimalField {
                        max_digits: 6,
                        decimal_places: 2,
                    },
                ),
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
            ("order_id", Value::Int(self.order_id)),
            ("product_id", Value::Int(self.product_id)),
            ("quantity", Value::Int(self.quantity)),
            ("unit_price", Value::Float(self.unit_price)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get("id")?,
            order_id: row.get("order_id")?,
            product_id: row.get("product_id")?,
            quantity: row.get("quantity")?,
            unit_price: row.get("unit_price")?,
        })
    }
}

/// A label that can be attached to any row.
#[derive(Debug, Clone)]
pub struct Tag {
    /// Primary key.
    pub id: i64,
    /// The tag text.
    pub label: String,
}

impl Tag {
    /// Returns the manager for tag queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }
}

impl Model for Tag {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "tags",
            model_name: "tag",
            db_table: "tags_tag",
            ordering: vec![OrderBy::asc("label")],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new("label", FieldType::CharField).max_length(255),
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
            ("label", Value::String(self.label.clone())),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get("id")?,
            label: row.get("label")?,
        })
    }
}

/// Attaches a [`Tag`] to an arbitrary row, identified by table name and
/// object id.
#[derive(Debug, Clone)]
pub struct TaggedItem {
    /// Primary key.
    pub id: i64,
    /// The attached tag.
    pub tag_id: i64,
    /// The table of the tagged row.
    pub object_table: String,
    /// The id of the tagged row.
    pub object_id: i64,
}

impl TaggedItem {
    /// Returns the manager for tagged-item queries.
    pub fn objects() -> Manager<Self> {
        Manager::new()
    }

    /// Returns a queryset of the tag assignments for one row of any table,
    /// with the tag itself joined so its label is selectable as `tag__label`.
    pub fn tags_for(table: &str, object_id: i64) -> QuerySet<Self> {
        Self::objects()
            .filter(
                Q::filter("object_table", Lookup::Exact(Value::from(table)))
                    & Q::filter("object_id", Lookup::Exact(Value::from(object_id))),
            )
            .select_related_with(vec![SelectRelatedField {
                field_name: "tag".to_string(),
                related_table: "tags_tag".to_string(),
                fk_column: "tag_id".to_string(),
                related_column: "id".to_string(),
                alias: "tag".to_string(),
            }])
    }
}

impl Model for TaggedItem {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
            app_label: "tags",
            model_name: "taggeditem",
            db_table: "tags_taggeditem",
            ordering: vec![],
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                FieldDef::new(
                    "tag_id",
                    FieldType::ForeignKey {
                        to: "tags_tag".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: None,
                    },
                ),
                FieldDef::new("object_table", FieldType::CharField)
                    .max_length(255)
                    .db_index(),
                FieldDef::new("object_id", FieldType::BigIntegerField).db_index(),
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
            ("tag_id", Value::Int(self.tag_id)),
            ("object_table", Value::String(self.object_table.clone())),
            ("object_id", Value::Int(self.object_id)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get("id")?,
            tag_id: row.get("tag_id")?,
            object_table: row.get("object_table")?,
            object_id: row.get("object_id")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_orm::query::compiler::BackendKind;

    #[test]
    fn test_table_names() {
        assert_eq!(Collection::table_name(), "store_collection");
        assert_eq!(Product::table_name(), "store_product");
        assert_eq!(Promotion::table_name(), "store_promotion");
        assert_eq!(ProductPromotion::table_name(), "store_product_promotions");
        assert_eq!(Customer::table_name(), "store_customer");
        assert_eq!(Order::table_name(), "store_order");
        assert_eq!(OrderItem::table_name(), "store_orderitem");
        assert_eq!(Tag::table_name(), "tags_tag");
        assert_eq!(TaggedItem::table_name(), "tags_taggeditem");
    }

    #[test]
    fn test_app_labels() {
        assert_eq!(Product::app_label(), "store");
        assert_eq!(Tag::app_label(), "tags");
    }

    #[test]
    fn test_product_meta_fields() {
        let meta = Product::meta();
        assert_eq!(meta.fields.len(), 9);
        assert!(meta.field("promotions").unwrap().is_relation());
        assert_eq!(meta.pk_field().unwrap().name, "id");
    }

    #[test]
    fn test_product_from_row() {
        let row = Row::new(
            vec![
                "id".to_string(),
                "title".to_string(),
                "slug".to_string(),
                "description".to_string(),
                "unit_price".to_string(),
                "inventory".to_string(),
                "last_update".to_string(),
                "collection_id".to_string(),
            ],
            vec![
                Value::Int(1),
                Value::String("Colombian Coffee".to_string()),
                Value::String("colombian-coffee".to_string()),
                Value::String("Medium roast".to_string()),
                Value::Float(12.5),
                Value::Int(30),
                Value::String("2024-06-01 08:00:00".to_string()),
                Value::Int(2),
            ],
        );
        let product = Product::from_row(&row).unwrap();
        assert_eq!(product.id, 1);
        assert_eq!(product.title, "Colombian Coffee");
        assert_eq!(product.collection_id, 2);
    }

    #[test]
    fn test_customer_membership_constants() {
        assert_eq!(Customer::MEMBERSHIP_BRONZE, "B");
        assert_eq!(Customer::MEMBERSHIP_SILVER, "S");
        assert_eq!(Customer::MEMBERSHIP_GOLD, "G");
        let default = Customer::meta().field("membership").unwrap();
        assert_eq!(default.default, Some(Value::String("B".to_string())));
    }

    #[test]
    fn test_order_status_constants() {
        assert_eq!(Order::PAYMENT_PENDING, "P");
        assert_eq!(Order::PAYMENT_COMPLETE, "C");
        assert_eq!(Order::PAYMENT_FAILED, "F");
    }

    #[test]
    fn test_collection_pk_handling() {
        let mut c = Collection::new("Beverages");
        assert!(c.pk().is_none());
        c.set_pk(Value::Int(5));
        assert_eq!(c.pk(), Some(Value::Int(5)));
    }

    #[test]
    fn test_customer_nullable_fields_from_row() {
        let row = Row::new(
            vec![
                "id".to_string(),
                "first_name".to_string(),
                "last_name".to_string(),
                "email".to_string(),
                "phone".to_string(),
                "birth_date".to_string(),
                "membership".to_string(),
            ],
            vec![
                Value::Int(1),
                Value::String("Ada".to_string()),
                Value::String("Moreno".to_string()),
                Value::String("ada@example.com".to_string()),
                Value::Null,
                Value::Null,
                Value::String("G".to_string()),
            ],
        );
        let c = Customer::from_row(&row).unwrap();
        assert_eq!(c.phone, None);
        assert_eq!(c.birth_date, None);
        assert_eq!(c.membership, "G");
    }

    #[test]
    fn test_tags_for_query_shape() {
        let qs = TaggedItem::tags_for("store_product", 1);
        let (sql, params) = qs.to_sql(BackendKind::Sqlite);
        assert!(sql.contains("LEFT JOIN \"tags_tag\" AS \"tag\""));
        assert!(sql.contains("\"tags_taggeditem\".\"object_table\" = ?"));
        assert!(sql.contains("\"tags_taggeditem\".\"object_id\" = ?"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_schema_generation_for_all_models() {
        use storefront_orm::schema::create_table_sql;
        for meta in [
            Collection::meta(),
            Product::meta(),
            Promotion::meta(),
            ProductPromotion::meta(),
            Customer::meta(),
            Order::meta(),
            OrderItem::meta(),
            Tag::meta(),
            TaggedItem::meta(),
        ] {
            let sql = create_table_sql(meta, BackendKind::Sqlite);
            assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS"));
            assert!(sql.contains(meta.db_table));
        }
    }
}
