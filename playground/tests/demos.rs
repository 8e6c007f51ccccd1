//! End-to-end coverage of every demonstration against a freshly seeded
//! in-memory database.
//!
//! The expectations are pinned to the deterministic seed data: if the seed
//! changes, these numbers change with it.

use storefront_backends::SqliteBackend;
use storefront_playground::{demos, schema};

async fn seeded_db() -> SqliteBackend {
    let db = SqliteBackend::memory().expect("in-memory database opens");
    schema::apply_schema(&db).await.expect("schema applies");
    schema::seed(&db).await.expect("seed inserts");
    db
}

#[tokio::test]
async fn basic_queries_count_and_existence() {
    let db = seeded_db().await;
    let (count, exists) = demos::basic_queries(&db).await.unwrap();
    assert_eq!(count, 8);
    assert!(exists);
}

#[tokio::test]
async fn filter_queries_match_seed() {
    let db = seeded_db().await;
    let (coffee, cheap_low_stock) = demos::filter_queries(&db).await.unwrap();
    assert_eq!(coffee, vec!["Colombian Coffee", "Decaf Coffee Beans"]);
    assert_eq!(cheap_low_stock, vec!["Decaf Coffee Beans", "Sourdough Loaf"]);
}

#[tokio::test]
async fn complex_filters_combinators() {
    let db = seeded_db().await;
    let (either, low_stock_expensive, balanced) = demos::complex_filters(&db).await.unwrap();

    // Every seeded product is either low on stock or under 20.
    assert_eq!(either.len(), 8);
    assert_eq!(either[0], "Cheddar Block");

    // Only the Wooden Train is scarce AND not cheap.
    assert_eq!(low_stock_expensive, vec!["Wooden Train"]);

    // Rows whose inventory equals their unit price.
    assert_eq!(balanced, vec!["Laundry Powder", "Sourdough Loaf"]);
}

#[tokio::test]
async fn ordering_queries_cheapest_and_extremes() {
    let db = seeded_db().await;
    let (cheapest, earliest, latest) = demos::ordering_queries(&db).await.unwrap();
    assert_eq!(cheapest.as_deref(), Some("Dish Soap"));
    assert_eq!(earliest.as_deref(), Some("Dish Soap"));
    assert_eq!(latest.as_deref(), Some("Wooden Train"));
}

#[tokio::test]
async fn projection_includes_collection_title() {
    let db = seeded_db().await;
    let tuples = demos::projection_queries(&db).await.unwrap();
    assert_eq!(tuples.len(), 8);
    assert_eq!(tuples[0], (1, "Colombian Coffee".into(), "Beverages".into()));
    assert_eq!(tuples[3], (4, "Sourdough Loaf".into(), "Bakery".into()));
}

#[tokio::test]
async fn subquery_finds_ordered_products() {
    let db = seeded_db().await;
    let titles = demos::subquery_example(&db).await.unwrap();
    assert_eq!(
        titles,
        vec![
            "Cheddar Block",
            "Colombian Coffee",
            "Dish Soap",
            "Green Tea",
            "Sourdough Loaf",
            "Wooden Train",
        ]
    );
}

#[tokio::test]
async fn query_optimization_recent_orders() {
    let db = seeded_db().await;
    let recent = demos::query_optimization(&db).await.unwrap();
    assert_eq!(
        recent,
        vec![
            (5, "Moreno".into(), 1),
            (4, "Tanaka".into(), 1),
            (3, "Keller".into(), 2),
            (2, "Moreno".into(), 1),
            (1, "Moreno".into(), 2),
        ]
    );
}

#[tokio::test]
async fn aggregation_overall_and_filtered() {
    let db = seeded_db().await;
    let (overall, cleaning) = demos::aggregation_queries(&db).await.unwrap();

    assert_eq!(overall.count, 8);
    assert!((overall.min_price - 3.75).abs() < 1e-9);
    assert!((overall.max_price - 24.0).abs() < 1e-9);
    assert!((overall.avg_price - 11.5).abs() < 1e-9);
    assert_eq!(overall.total_inventory, 306);

    assert_eq!(cleaning.count, 2);
    assert!((cleaning.min_price - 3.75).abs() < 1e-9);
    assert!((cleaning.max_price - 14.0).abs() < 1e-9);
    assert!((cleaning.avg_price - 8.875).abs() < 1e-9);
    assert_eq!(cleaning.total_inventory, 94);
}

#[tokio::test]
async fn annotation_full_names_and_order_counts() {
    let db = seeded_db().await;
    let (full_names, orders_per_customer) = demos::annotation_examples(&db).await.unwrap();

    assert_eq!(
        full_names,
        vec!["Bruno Keller", "Ada Moreno", "Dev Patel", "Chie Tanaka"]
    );
    assert_eq!(
        orders_per_customer,
        vec![
            ("Ada".into(), 3),
            ("Bruno".into(), 1),
            ("Chie".into(), 1),
            ("Dev".into(), 0),
        ]
    );
}

#[tokio::test]
async fn expression_discounted_prices() {
    let db = seeded_db().await;
    let discounted = demos::expression_examples(&db).await.unwrap();
    assert_eq!(discounted.len(), 8);

    let (title, price) = &discounted[0];
    assert_eq!(title, "Colombian Coffee");
    assert!((price - 10.0).abs() < 1e-9);

    let (title, price) = &discounted[7];
    assert_eq!(title, "Wooden Train");
    assert!((price - 19.2).abs() < 1e-9);
}

#[tokio::test]
async fn tagged_items_for_product() {
    let db = seeded_db().await;
    let labels = demos::tagged_items_example(&db).await.unwrap();
    assert_eq!(labels, vec!["fair-trade", "organic"]);
}

#[tokio::test]
async fn data_access_first_and_all() {
    let db = seeded_db().await;
    let (first, total) = demos::data_access_examples(&db).await.unwrap();
    assert_eq!(first.as_deref(), Some("Colombian Coffee"));
    assert_eq!(total, 8);
}

#[tokio::test]
async fn update_examples_clear_featured_product() {
    let db = seeded_db().await;
    let (featured_after_save, bulk_affected) = demos::update_examples(&db).await.unwrap();
    assert_eq!(featured_after_save, None);
    assert_eq!(bulk_affected, 1);
}

#[tokio::test]
async fn delete_examples_instance_and_bulk() {
    let db = seeded_db().await;
    let (single, bulk) = demos::delete_examples(&db).await.unwrap();
    assert_eq!(single, 1);
    assert_eq!(bulk, 2);
}

#[tokio::test]
async fn transaction_rolls_back_failed_order() {
    let db = seeded_db().await;
    let (before, after) = demos::transaction_example(&db).await.unwrap();
    assert_eq!(before, 5);
    // The failed item insert takes the order down with it.
    assert_eq!(after, before);
}

#[tokio::test]
async fn raw_sql_cursor_and_procedure() {
    let db = seeded_db().await;
    let (row_count, proc_error) = demos::raw_sql_example(&db).await.unwrap();
    assert_eq!(row_count, 8);
    // SQLite has no stored procedures; the cursor reports that.
    let error = proc_error.expect("procedure call is unsupported on SQLite");
    assert!(error.contains("stored procedures"));
}

#[tokio::test]
async fn run_all_completes() {
    let db = seeded_db().await;
    demos::run_all(&db).await.unwrap();
}
