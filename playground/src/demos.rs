//! One self-contained demonstration per query feature.
//!
//! Each function builds one kind of query against the seeded storefront
//! database, logs what it found, and returns the result so the integration
//! tests can assert on it. The functions are independent: none depends on
//! another's output, and apart from the mutation demos none changes any data.

use storefront_core::{StoreError, StoreResult};
use storefront_orm::query::compiler::{Join, JoinKind, OrderBy, PrefetchRelatedField};
use storefront_orm::query::expressions::{concat, AggregateFunc, Expression, OutputType};
use storefront_orm::query::lookups::{Lookup, Q};
use storefront_orm::transactions::atomic;
use storefront_orm::value::Value;
use storefront_orm::{save_model, Cursor, DbExecutor, Model};

use crate::models::{Collection, Customer, Order, OrderItem, Product, TaggedItem};

/// Aggregate statistics over a set of products.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductStats {
    /// Number of products.
    pub count: i64,
    /// Smallest unit price.
    pub min_price: f64,
    /// Largest unit price.
    pub max_price: f64,
    /// Average unit price.
    pub avg_price: f64,
    /// Sum of inventory across products.
    pub total_inventory: i64,
}

/// Basic queries: fetch everything, iterate, and probe for existence by pk.
pub async fn basic_queries(db: &dyn DbExecutor) -> StoreResult<(usize, bool)> {
    let products = Product::objects().all().fetch_all(db).await?;
    for product in &products {
        tracing::info!(title = %product.title, price = product.unit_price, "product");
    }

    let exists = Product::objects()
        .filter(Q::filter("id", Lookup::Exact(Value::from(1))))
        .exists(db)
        .await?;

    tracing::info!(count = products.len(), pk_1_exists = exists, "basic queries");
    Ok((products.len(), exists))
}

/// Simple filters: substring search and chained numeric conditions.
pub async fn filter_queries(db: &dyn DbExecutor) -> StoreResult<(Vec<String>, Vec<String>)> {
    // Products whose title contains "coffee", case-insensitively.
    let coffee = Product::objects()
        .filter(Q::filter("title", Lookup::IContains("coffee".to_string())))
        .order_by(vec![OrderBy::asc("title")])
        .fetch_all(db)
        .await?;

    // Chained filters AND together: inventory < 10 and unit price < 20.
    let cheap_low_stock = Product::objects()
        .filter(Q::filter("inventory", Lookup::Lt(Value::from(10))))
        .filter(Q::filter("unit_price", Lookup::Lt(Value::from(20))))
        .order_by(vec![OrderBy::asc("title")])
        .fetch_all(db)
        .await?;

    let coffee: Vec<String> = coffee.into_iter().map(|p| p.title).collect();
    let cheap_low_stock: Vec<String> = cheap_low_stock.into_iter().map(|p| p.title).collect();
    tracing::info!(?coffee, ?cheap_low_stock, "filter queries");
    Ok((coffee, cheap_low_stock))
}

/// Logical combinators: OR, AND NOT, and comparing two columns of a row.
pub async fn complex_filters(
    db: &dyn DbExecutor,
) -> StoreResult<(Vec<String>, Vec<String>, Vec<String>)> {
    // inventory < 10 OR unit_price < 20
    let either = Product::objects()
        .filter(
            Q::filter("inventory", Lookup::Lt(Value::from(10)))
                | Q::filter("unit_price", Lookup::Lt(Value::from(20))),
        )
        .order_by(vec![OrderBy::asc("title")])
        .fetch_all(db)
        .await?;

    // inventory < 10 AND NOT(unit_price < 20)
    let low_stock_expensive = Product::objects()
        .filter(
            Q::filter("inventory", Lookup::Lt(Value::from(10)))
                & !Q::filter("unit_price", Lookup::Lt(Value::from(20))),
        )
        .order_by(vec![OrderBy::asc("title")])
        .fetch_all(db)
        .await?;

    // inventory equal to the unit price of the same row.
    let balanced = Product::objects()
        .filter(Q::filter(
            "inventory",
            Lookup::ExactField("unit_price".to_string()),
        ))
        .order_by(vec![OrderBy::asc("title")])
        .fetch_all(db)
        .await?;

    let either: Vec<String> = either.into_iter().map(|p| p.title).collect();
    let low_stock_expensive: Vec<String> =
        low_stock_expensive.into_iter().map(|p| p.title).collect();
    let balanced: Vec<String> = balanced.into_iter().map(|p| p.title).collect();
    tracing::info!(?either, ?low_stock_expensive, ?balanced, "complex filters");
    Ok((either, low_stock_expensive, balanced))
}

/// Ordering: explicit sort plus the earliest/latest shortcuts.
pub async fn ordering_queries(
    db: &dyn DbExecutor,
) -> StoreResult<(Option<String>, Option<String>, Option<String>)> {
    // The cheapest product via an explicit sort.
    let cheapest = Product::objects()
        .all()
        .order_by(vec![OrderBy::asc("unit_price")])
        .first(db)
        .await?;

    // The same row via the earliest shortcut, and its opposite.
    let earliest = Product::objects().all().earliest(db, "unit_price").await?;
    let latest = Product::objects().all().latest(db, "unit_price").await?;

    let cheapest = cheapest.map(|p| p.title);
    let earliest = earliest.map(|p| p.title);
    let latest = latest.map(|p| p.title);
    tracing::info!(?cheapest, ?earliest, ?latest, "ordering queries");
    Ok((cheapest, earliest, latest))
}

/// Projection: select specific columns, including one reached through the
/// collection relation. Rows come back positionally, like tuples.
pub async fn projection_queries(db: &dyn DbExecutor) -> StoreResult<Vec<(i64, String, String)>> {
    let rows = Product::objects()
        .all()
        .select_related_with(vec![Product::collection_relation()])
        .values_list(vec!["id", "title", "collection__title"])
        .order_by(vec![OrderBy::asc("id")])
        .fetch_rows(db)
        .await?;

    let mut tuples = Vec::with_capacity(rows.len());
    for row in &rows {
        tuples.push((
            row.get_by_index::<i64>(0)?,
            row.get_by_index::<String>(1)?,
            row.get_by_index::<String>(2)?,
        ));
    }
    tracing::info!(rows = tuples.len(), "projection");
    Ok(tuples)
}

/// Subquery: products that have been ordered at least once, without
/// duplicates, sorted by title.
pub async fn subquery_example(db: &dyn DbExecutor) -> StoreResult<Vec<String>> {
    let ordered_ids = OrderItem::objects()
        .all()
        .values(vec!["product_id"])
        .distinct();

    let ordered_products = Product::objects()
        .filter(Q::filter(
            "id",
            Lookup::InSubquery(Box::new(ordered_ids.query().clone())),
        ))
        .order_by(vec![OrderBy::asc("title")])
        .fetch_all(db)
        .await?;

    let titles: Vec<String> = ordered_products.into_iter().map(|p| p.title).collect();
    tracing::info!(?titles, "products with orders");
    Ok(titles)
}

/// Relation loading: eager JOIN for the order's customer, a batch query for
/// its items, newest five orders first.
pub async fn query_optimization(db: &dyn DbExecutor) -> StoreResult<Vec<(i64, String, usize)>> {
    // One query for products with their collection joined, plus one batch
    // query for the promotion links attached through the join table.
    let products = Product::objects()
        .all()
        .select_related_with(vec![Product::collection_relation()])
        .prefetch_related_with(vec![PrefetchRelatedField {
            field_name: "promotions".to_string(),
            related_table: "store_product_promotions".to_string(),
            related_column: "product_id".to_string(),
        }])
        .fetch_with_prefetch(db)
        .await?;
    let promotion_links = products.get_prefetched("promotions").map_or(0, Vec::len);
    tracing::info!(
        products = products.len(),
        promotion_links,
        "products with collection and promotions"
    );

    // One query: orders joined to their customer.
    let order_rows = Order::objects()
        .all()
        .select_related_with(vec![Order::customer_relation()])
        .values_list(vec![
            "store_order__id",
            "customer__first_name",
            "customer__last_name",
        ])
        .order_by(vec![OrderBy::desc("placed_at")])
        .limit(5)
        .fetch_rows(db)
        .await?;

    // One more query: all items for those orders, batched with IN (...).
    let prefetched = Order::objects()
        .all()
        .order_by(vec![OrderBy::desc("placed_at")])
        .limit(5)
        .prefetch_related_with(vec![PrefetchRelatedField {
            field_name: "items".to_string(),
            related_table: "store_orderitem".to_string(),
            related_column: "order_id".to_string(),
        }])
        .fetch_with_prefetch(db)
        .await?;
    let item_rows = prefetched
        .get_prefetched("items")
        .cloned()
        .unwrap_or_default();

    let mut recent = Vec::with_capacity(order_rows.len());
    for row in &order_rows {
        let order_id = row.get_by_index::<i64>(0)?;
        let last_name = row.get_by_index::<String>(2)?;
        let item_count = item_rows
            .iter()
            .filter(|item| item.get::<i64>("order_id").ok() == Some(order_id))
            .count();
        recent.push((order_id, last_name, item_count));
    }
    tracing::info!(orders = recent.len(), "recent orders with customer and items");
    Ok(recent)
}

/// Aggregation: count, min, max, average, and sum over all products and over
/// one collection.
pub async fn aggregation_queries(db: &dyn DbExecutor) -> StoreResult<(ProductStats, ProductStats)> {
    let stats_aggregates = || {
        vec![
            (
                "count".to_string(),
                Expression::aggregate(AggregateFunc::Count, Expression::col("id")),
            ),
            (
                "min_price".to_string(),
                Expression::aggregate(AggregateFunc::Min, Expression::col("unit_price")),
            ),
            (
                "max_price".to_string(),
                Expression::aggregate(AggregateFunc::Max, Expression::col("unit_price")),
            ),
            (
                "avg_price".to_string(),
                Expression::aggregate(AggregateFunc::Avg, Expression::col("unit_price")),
            ),
            (
                "total_inventory".to_string(),
                Expression::aggregate(AggregateFunc::Sum, Expression::col("inventory")),
            ),
        ]
    };

    let read = |row: &storefront_orm::Row| -> StoreResult<ProductStats> {
        Ok(ProductStats {
            count: row.get("count")?,
            min_price: row.get("min_price")?,
            max_price: row.get("max_price")?,
            avg_price: row.get("avg_price")?,
            total_inventory: row.get("total_inventory")?,
        })
    };

    let overall_row = Product::objects()
        .all()
        .aggregate(db, stats_aggregates())
        .await?;
    let overall = read(&overall_row)?;

    let cleaning_row = Product::objects()
        .filter(Q::filter("collection_id", Lookup::Exact(Value::from(3))))
        .aggregate(db, stats_aggregates())
        .await?;
    let cleaning = read(&cleaning_row)?;

    tracing::info!(?overall, ?cleaning, "aggregation");
    Ok((overall, cleaning))
}

/// Annotation: computed full names, and orders counted per customer through
/// a join.
pub async fn annotation_examples(
    db: &dyn DbExecutor,
) -> StoreResult<(Vec<String>, Vec<(String, i64)>)> {
    // A computed full_name column from first + ' ' + last.
    let name_rows = Customer::objects()
        .all()
        .values(vec!["first_name", "last_name"])
        .annotate(
            "full_name",
            concat(vec![
                Expression::f("first_name"),
                Expression::value(" "),
                Expression::f("last_name"),
            ]),
        )
        .order_by(vec![OrderBy::asc("last_name")])
        .fetch_rows(db)
        .await?;
    let full_names: Vec<String> = name_rows
        .iter()
        .map(|row| row.get::<String>("full_name"))
        .collect::<Result<_, _>>()?;

    // Orders per customer: LEFT JOIN + GROUP BY + COUNT, so customers with
    // no orders still appear with zero.
    let count_rows = Customer::objects()
        .all()
        .values(vec!["store_customer__id", "store_customer__first_name"])
        .join(Join {
            table: "store_order".to_string(),
            alias: "customer_order".to_string(),
            kind: JoinKind::Left,
            left_table: "store_customer".to_string(),
            left_column: "id".to_string(),
            right_column: "customer_id".to_string(),
        })
        .annotate(
            "orders_count",
            Expression::aggregate(
                AggregateFunc::Count,
                Expression::table_col("customer_order", "id"),
            ),
        )
        .group_by(vec!["store_customer__id", "store_customer__first_name"])
        .order_by(vec![OrderBy::asc("store_customer__id")])
        .fetch_rows(db)
        .await?;
    let orders_per_customer: Vec<(String, i64)> = count_rows
        .iter()
        .map(|row| {
            Ok((
                row.get_by_index::<String>(1)?,
                row.get::<i64>("orders_count")?,
            ))
        })
        .collect::<StoreResult<_>>()?;

    tracing::info!(?full_names, ?orders_per_customer, "annotations");
    Ok((full_names, orders_per_customer))
}

/// Typed computed expression: a 20%-discounted unit price carried as a
/// decimal column.
pub async fn expression_examples(db: &dyn DbExecutor) -> StoreResult<Vec<(String, f64)>> {
    let discounted_price = (Expression::f("unit_price") * Expression::value(0.8)).wrap(
        OutputType::Decimal {
            max_digits: 6,
            decimal_places: 2,
        },
    );

    let rows = Product::objects()
        .all()
        .values(vec!["title"])
        .annotate("discounted_price", discounted_price)
        .order_by(vec![OrderBy::asc("id")])
        .fetch_rows(db)
        .await?;

    let discounted: Vec<(String, f64)> = rows
        .iter()
        .map(|row| {
            Ok((
                row.get::<String>("title")?,
                row.get::<f64>("discounted_price")?,
            ))
        })
        .collect::<StoreResult<_>>()?;
    tracing::info!(rows = discounted.len(), "discounted prices");
    Ok(discounted)
}

/// Generic tagging: the labels attached to one product.
pub async fn tagged_items_example(db: &dyn DbExecutor) -> StoreResult<Vec<String>> {
    let rows = TaggedItem::tags_for(Product::table_name(), 1)
        .values(vec!["tag__label"])
        .order_by(vec![OrderBy::asc("tag__label")])
        .fetch_rows(db)
        .await?;

    let labels: Vec<String> = rows
        .iter()
        .map(|row| row.get_by_index::<String>(0))
        .collect::<Result<_, _>>()?;
    tracing::info!(?labels, "tags for product 1");
    Ok(labels)
}

/// Data access: single row by position versus full materialization.
pub async fn data_access_examples(db: &dyn DbExecutor) -> StoreResult<(Option<String>, usize)> {
    let qs = Product::objects().all().order_by(vec![OrderBy::asc("id")]);

    let first = qs.first(db).await?.map(|p| p.title);
    let all = qs.fetch_all(db).await?;

    tracing::info!(?first, total = all.len(), "data access");
    Ok((first, all.len()))
}

/// Updates: the load-modify-save path and the bulk UPDATE path, both
/// clearing a nullable foreign key.
pub async fn update_examples(db: &dyn DbExecutor) -> StoreResult<(Option<i64>, u64)> {
    // Load, modify, save.
    let mut collection = Collection::objects()
        .filter(Q::filter("id", Lookup::Exact(Value::from(2))))
        .get(db)
        .await?;
    collection.featured_product_id = None;
    save_model(&mut collection, db).await?;

    let reloaded = Collection::objects()
        .filter(Q::filter("id", Lookup::Exact(Value::from(2))))
        .get(db)
        .await?;

    // Bulk update straight in the database, no load required.
    let affected = Collection::objects()
        .filter(Q::filter("id", Lookup::Exact(Value::from(2))))
        .update(vec![("featured_product_id", Value::Null)])
        .update_exec(db)
        .await?;

    tracing::info!(
        featured = ?reloaded.featured_product_id,
        bulk_affected = affected,
        "updates"
    );
    Ok((reloaded.featured_product_id, affected))
}

/// Deletes: one row through its model instance, then a filtered bulk DELETE.
pub async fn delete_examples(db: &dyn DbExecutor) -> StoreResult<(u64, u64)> {
    use storefront_orm::{create_model, delete_model};

    // Create a throwaway collection and delete it again via the instance.
    let mut seasonal = Collection::new("Seasonal");
    create_model(&mut seasonal, db).await?;
    let single = delete_model(&seasonal, db).await?;

    // Create two more and remove them with one bulk DELETE on id > 5.
    let mut outlet = Collection::new("Outlet");
    create_model(&mut outlet, db).await?;
    let mut clearance = Collection::new("Clearance Corner");
    create_model(&mut clearance, db).await?;

    let bulk = Collection::objects()
        .filter(Q::filter("id", Lookup::Gt(Value::from(5))))
        .delete()
        .delete_exec(db)
        .await?;

    tracing::info!(single, bulk, "deletes");
    Ok((single, bulk))
}

/// Transactions: an order and an order item written in one atomic block.
/// The item's invalid product id violates the foreign key, so the whole
/// block rolls back and the order disappears with it.
///
/// Returns the order counts before and after the failed block.
pub async fn transaction_example(db: &dyn DbExecutor) -> StoreResult<(i64, i64)> {
    let before = Order::objects().all().count(db).await?;

    let placed_at = chrono::NaiveDate::from_ymd_opt(2024, 7, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .ok_or_else(|| StoreError::DatabaseError("invalid demo timestamp".to_string()))?;

    let result: StoreResult<()> = atomic(db, |txn| async move {
        let order_id = Order::objects()
            .create(vec![
                ("placed_at", Value::DateTime(placed_at)),
                ("payment_status", Value::from(Order::PAYMENT_PENDING)),
                ("customer_id", Value::from(1)),
            ])
            .create_exec(txn.as_ref())
            .await?;

        // An intentionally invalid product id; the insert fails and the
        // order above is rolled back with it.
        OrderItem::objects()
            .create(vec![
                ("order_id", order_id),
                ("product_id", Value::from(-1)),
                ("quantity", Value::from(1)),
                ("unit_price", Value::from(10.0)),
            ])
            .create_exec(txn.as_ref())
            .await?;

        Ok(())
    })
    .await;

    match &result {
        Err(e) => tracing::info!(error = %e, "atomic block rolled back"),
        Ok(()) => tracing::warn!("atomic block unexpectedly committed"),
    }

    let after = Order::objects().all().count(db).await?;
    tracing::info!(before, after, "transaction demo");
    Ok((before, after))
}

/// Raw SQL: a cursor SELECT over the product table, and a stored-procedure
/// invocation (reported as unsupported on SQLite).
pub async fn raw_sql_example(db: &dyn DbExecutor) -> StoreResult<(usize, Option<String>)> {
    let cursor = Cursor::new(db);

    let rows = cursor
        .fetch_all("SELECT * FROM store_product", &[])
        .await?;
    for row in rows.iter().take(3) {
        tracing::info!(
            id = ?row.get_value("id"),
            title = ?row.get_value("title"),
            "raw row"
        );
    }

    let proc_error = match cursor
        .call_procedure("get_customers", &[Value::from(1), Value::from(2)])
        .await
    {
        Ok(result_rows) => {
            tracing::info!(rows = result_rows.len(), "procedure returned");
            None
        }
        Err(e) => {
            tracing::info!(error = %e, "procedure call not available");
            Some(e.to_string())
        }
    };

    Ok((rows.len(), proc_error))
}

/// Runs every demonstration in sequence against the given database.
pub async fn run_all(db: &dyn DbExecutor) -> StoreResult<()> {
    basic_queries(db).await?;
    filter_queries(db).await?;
    complex_filters(db).await?;
    ordering_queries(db).await?;
    projection_queries(db).await?;
    subquery_example(db).await?;
    query_optimization(db).await?;
    aggregation_queries(db).await?;
    annotation_examples(db).await?;
    expression_examples(db).await?;
    tagged_items_example(db).await?;
    data_access_examples(db).await?;
    update_examples(db).await?;
    delete_examples(db).await?;
    transaction_example(db).await?;
    raw_sql_example(db).await?;
    Ok(())
}

/// The demonstration registry: names accepted by the `demo` CLI command.
pub const DEMO_NAMES: &[&str] = &[
    "basic",
    "filters",
    "complex-filters",
    "ordering",
    "projection",
    "subquery",
    "optimization",
    "aggregation",
    "annotation",
    "expressions",
    "tags",
    "data-access",
    "updates",
    "deletes",
    "transaction",
    "raw-sql",
];

/// Runs a single demonstration by name.
pub async fn run_one(db: &dyn DbExecutor, name: &str) -> StoreResult<()> {
    match name {
        "basic" => basic_queries(db).await.map(drop),
        "filters" => filter_queries(db).await.map(drop),
        "complex-filters" => complex_filters(db).await.map(drop),
        "ordering" => ordering_queries(db).await.map(drop),
        "projection" => projection_queries(db).await.map(drop),
        "subquery" => subquery_example(db).await.map(drop),
        "optimization" => query_optimization(db).await.map(drop),
        "aggregation" => aggregation_queries(db).await.map(drop),
        "annotation" => annotation_examples(db).await.map(drop),
        "expressions" => expression_examples(db).await.map(drop),
        "tags" => tagged_items_example(db).await.map(drop),
        "data-access" => data_access_examples(db).await.map(drop),
        "updates" => update_examples(db).await.map(drop),
        "deletes" => delete_examples(db).await.map(drop),
        "transaction" => transaction_example(db).await.map(drop),
        "raw-sql" => raw_sql_example(db).await.map(drop),
        other => Err(StoreError::ConfigurationError(format!(
            "unknown demo '{other}'; expected one of {DEMO_NAMES:?}"
        ))),
    }
}
