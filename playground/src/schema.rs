//! Schema creation and seed data for the storefront database.
//!
//! The tables are generated from each model's metadata, so the DDL stays in
//! step with the model definitions. The seed data is deterministic: every
//! demonstration and test relies on the exact rows inserted here.

use storefront_core::StoreResult;
use storefront_orm::model::Model;
use storefront_orm::query::compiler::{SqlCompiler, WhereNode};
use storefront_orm::query::lookups::Lookup;
use storefront_orm::schema::{create_index_sql, create_table_sql};
use storefront_orm::value::Value;
use storefront_orm::DbExecutor;

use crate::models::{
    Collection, Customer, Order, OrderItem, Product, ProductPromotion, Promotion, Tag, TaggedItem,
};

/// Creates every storefront table and index.
///
/// Tables are created before any rows are inserted, so the circular
/// collection/product foreign keys resolve by the time they are enforced.
pub async fn apply_schema(db: &dyn DbExecutor) -> StoreResult<()> {
    let metas = [
        Collection::meta(),
        Product::meta(),
        Promotion::meta(),
        ProductPromotion::meta(),
        Customer::meta(),
        Order::meta(),
        OrderItem::meta(),
        Tag::meta(),
        TaggedItem::meta(),
    ];

    for meta in metas {
        let sql = create_table_sql(meta, db.backend_kind());
        db.execute_sql(&sql, &[]).await?;
        for index_sql in create_index_sql(meta) {
            db.execute_sql(&index_sql, &[]).await?;
        }
    }

    tracing::debug!("schema applied ({} tables)", metas.len());
    Ok(())
}

async fn insert(db: &dyn DbExecutor, table: &str, fields: &[(&str, Value)]) -> StoreResult<()> {
    let (sql, params) = SqlCompiler::new(db.backend_kind()).compile_insert(table, fields);
    db.execute_sql(&sql, &params).await?;
    Ok(())
}

fn dt(s: &str) -> Value {
    Value::DateTime(
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .expect("seed datetimes are well-formed"),
    )
}

fn date(s: &str) -> Value {
    Value::Date(s.parse().expect("seed dates are well-formed"))
}

/// Inserts the deterministic sample data set.
///
/// Eight products across five collections, four customers, five orders with
/// seven line items, two promotions, and three tags.
pub async fn seed(db: &dyn DbExecutor) -> StoreResult<()> {
    // Collections
    for (id, title) in [
        (1, "Bakery"),
        (2, "Beverages"),
        (3, "Cleaning"),
        (4, "Dairy"),
        (5, "Toys"),
    ] {
        insert(
            db,
            "store_collection",
            &[
                ("id", Value::from(id)),
                ("title", Value::from(title)),
                ("featured_product_id", Value::Null),
            ],
        )
        .await?;
    }

    // Products: (id, title, slug, price, inventory, collection)
    let products: [(i64, &str, &str, f64, i64, i64); 8] = [
        (1, "Colombian Coffee", "colombian-coffee", 12.50, 30, 2),
        (2, "Decaf Coffee Beans", "decaf-coffee-beans", 18.00, 8, 2),
        (3, "Green Tea", "green-tea", 4.50, 120, 2),
        (4, "Sourdough Loaf", "sourdough-loaf", 6.00, 6, 1),
        (5, "Dish Soap", "dish-soap", 3.75, 80, 3),
        (6, "Laundry Powder", "laundry-powder", 14.00, 14, 3),
        (7, "Cheddar Block", "cheddar-block", 9.25, 45, 4),
        (8, "Wooden Train", "wooden-train", 24.00, 3, 5),
    ];
    for (id, title, slug, price, inventory, collection) in products {
        insert(
            db,
            "store_product",
            &[
                ("id", Value::from(id)),
                ("title", Value::from(title)),
                ("slug", Value::from(slug)),
                ("description", Value::from(format!("{title} from the sample catalog"))),
                ("unit_price", Value::from(price)),
                ("inventory", Value::from(inventory)),
                ("last_update", dt("2024-06-01 08:00:00")),
                ("collection_id", Value::from(collection)),
            ],
        )
        .await?;
    }

    // Feature the Colombian Coffee on the Beverages collection.
    let (sql, params) = SqlCompiler::new(db.backend_kind()).compile_update(
        "store_collection",
        &[("featured_product_id", Value::from(1))],
        &WhereNode::Condition {
            column: "id".to_string(),
            lookup: Lookup::Exact(Value::from(2)),
        },
    );
    db.execute_sql(&sql, &params).await?;

    // Promotions and the products they apply to.
    for (id, description, discount) in [(1, "Summer sale", 0.2), (2, "Clearance", 0.5)] {
        insert(
            db,
            "store_promotion",
            &[
                ("id", Value::from(id)),
                ("description", Value::from(description)),
                ("discount", Value::from(discount)),
            ],
        )
        .await?;
    }
    for (id, product, promotion) in [(1, 1, 1), (2, 3, 1), (3, 8, 2)] {
        insert(
            db,
            "store_product_promotions",
            &[
                ("id", Value::from(id)),
                ("product_id", Value::from(product)),
                ("promotion_id", Value::from(promotion)),
            ],
        )
        .await?;
    }

    // Customers
    let customers: [(i64, &str, &str, &str, Option<&str>, Option<&str>, &str); 4] = [
        (1, "Ada", "Moreno", "ada@example.com", Some("555-0101"), Some("1990-03-14"), "G"),
        (2, "Bruno", "Keller", "bruno@example.com", Some("555-0102"), Some("1985-11-02"), "B"),
        (3, "Chie", "Tanaka", "chie@example.com", Some("555-0103"), None, "S"),
        (4, "Dev", "Patel", "dev@example.com", None, Some("1998-07-21"), "B"),
    ];
    for (id, first, last, email, phone, birth, membership) in customers {
        insert(
            db,
            "store_customer",
            &[
                ("id", Value::from(id)),
                ("first_name", Value::from(first)),
                ("last_name", Value::from(last)),
                ("email", Value::from(email)),
                ("phone", phone.map_or(Value::Null, Value::from)),
                ("birth_date", birth.map_or(Value::Null, date)),
                ("membership", Value::from(membership)),
            ],
        )
        .await?;
    }

    // Orders: (id, placed_at, status, customer)
    let orders: [(i64, &str, &str, i64); 5] = [
        (1, "2024-05-01 10:00:00", "C", 1),
        (2, "2024-05-03 09:30:00", "C", 1),
        (3, "2024-05-10 14:00:00", "P", 2),
        (4, "2024-06-02 16:45:00", "C", 3),
        (5, "2024-06-20 11:15:00", "F", 1),
    ];
    for (id, placed_at, status, customer) in orders {
        insert(
            db,
            "store_order",
            &[
                ("id", Value::from(id)),
                ("placed_at", dt(placed_at)),
                ("payment_status", Value::from(status)),
                ("customer_id", Value::from(customer)),
            ],
        )
        .await?;
    }

    // Order items: (id, order, product, quantity, unit_price)
    let items: [(i64, i64, i64, i64, f64); 7] = [
        (1, 1, 1, 2, 12.50),
        (2, 1, 4, 1, 6.00),
        (3, 2, 3, 3, 4.50),
        (4, 3, 1, 1, 12.50),
        (5, 3, 7, 2, 9.25),
        (6, 4, 8, 1, 24.00),
        (7, 5, 5, 4, 3.75),
    ];
    for (id, order, product, quantity, unit_price) in items {
        insert(
            db,
            "store_orderitem",
            &[
                ("id", Value::from(id)),
                ("order_id", Value::from(order)),
                ("product_id", Value::from(product)),
                ("quantity", Value::from(quantity)),
                ("unit_price", Value::from(unit_price)),
            ],
        )
        .await?;
    }

    // Tags
    for (id, label) in [(1, "organic"), (2, "fair-trade"), (3, "fragile")] {
        insert(
            db,
            "tags_tag",
            &[("id", Value::from(id)), ("label", Value::from(label))],
        )
        .await?;
    }
    for (id, tag, object_id) in [(1, 1, 1), (2, 2, 1), (3, 3, 8)] {
        insert(
            db,
            "tags_taggeditem",
            &[
                ("id", Value::from(id)),
                ("tag_id", Value::from(tag)),
                ("object_table", Value::from("store_product")),
                ("object_id", Value::from(object_id)),
            ],
        )
        .await?;
    }

    tracing::info!("seed data loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_backends::SqliteBackend;

    #[tokio::test]
    async fn test_schema_and_seed_apply_cleanly() {
        let db = SqliteBackend::memory().unwrap();
        apply_schema(&db).await.unwrap();
        seed(&db).await.unwrap();

        let row = db
            .query_one("SELECT COUNT(*) AS n FROM store_product", &[])
            .await
            .unwrap();
        assert_eq!(row.get::<i64>("n").unwrap(), 8);

        let row = db
            .query_one("SELECT COUNT(*) AS n FROM store_order", &[])
            .await
            .unwrap();
        assert_eq!(row.get::<i64>("n").unwrap(), 5);
    }

    #[tokio::test]
    async fn test_seed_foreign_keys_are_valid() {
        let db = SqliteBackend::memory().unwrap();
        apply_schema(&db).await.unwrap();
        seed(&db).await.unwrap();

        // Every order item must reference an existing order and product.
        let rows = db
            .query(
                "SELECT COUNT(*) AS n FROM store_orderitem oi \
                 LEFT JOIN store_order o ON oi.order_id = o.id \
                 LEFT JOIN store_product p ON oi.product_id = p.id \
                 WHERE o.id IS NULL OR p.id IS NULL",
                &[],
            )
            .await
            .unwrap();
        assert_eq!(rows[0].get::<i64>("n").unwrap(), 0);
    }
}
