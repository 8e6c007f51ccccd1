//! QuerySet and Manager for building and executing database queries.
//!
//! The [`QuerySet`] represents a lazy database query that builds up a SQL
//! query AST. It only executes when a terminal method is called
//! (`.fetch_all()`, `.count()`, `.get()`, etc.). The [`Manager`] is the entry
//! point for accessing querysets on a model.
//!
//! All filtering/ordering methods consume `self` and return a modified
//! queryset, making the API chainable.

use super::compiler::{
    Join, OrderBy, PrefetchRelatedField, Query, Row, SelectColumn, SelectRelatedField, SqlCompiler,
    WhereNode,
};
use super::expressions::{AggregateFunc, Expression};
use super::lookups::Q;
use crate::executor::DbExecutor;
use crate::model::Model;
use crate::value::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use storefront_core::{StoreError, StoreResult};

use super::compiler::BackendKind;

/// The entry point for model-level query operations.
///
/// Every model has a default `Manager` that provides access to the
/// `QuerySet` API. The `Manager` itself does not hold any query state; it
/// simply creates fresh `QuerySet` instances.
#[derive(Debug)]
pub struct Manager<M: Model> {
    _phantom: PhantomData<M>,
}

impl<M: Model> Default for Manager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Manager<M> {
    /// Creates a new manager.
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }

    /// Returns a new `QuerySet` that returns all rows.
    pub fn all(&self) -> QuerySet<M> {
        QuerySet::new()
    }

    /// Returns a new `QuerySet` with the given filter applied.
    pub fn filter(&self, q: Q) -> QuerySet<M> {
        self.all().filter(q)
    }

    /// Returns a new `QuerySet` with the given exclusion applied.
    pub fn exclude(&self, q: Q) -> QuerySet<M> {
        self.all().exclude(q)
    }

    /// Prepares an INSERT of the given fields, to be run with
    /// [`QuerySet::create_exec`].
    pub fn create(&self, fields: Vec<(&'static str, Value)>) -> QuerySet<M> {
        let mut qs = self.all();
        qs.pending_create = Some(fields);
        qs
    }
}

/// A lazy, composable database query.
pub struct QuerySet<M: Model> {
    model: PhantomData<M>,
    query: Query,
    /// Pending create operation fields.
    pending_create: Option<Vec<(&'static str, Value)>>,
    /// Pending update operation fields.
    pending_update: Option<Vec<(&'static str, Value)>>,
    /// Whether this is a delete operation.
    pending_delete: bool,
}

impl<M: Model> QuerySet<M> {
    fn new() -> Self {
        Self {
            model: PhantomData,
            query: Query::new(M::table_name()),
            pending_create: None,
            pending_update: None,
            pending_delete: false,
        }
    }

    /// Returns a reference to the underlying query AST.
    pub const fn query(&self) -> &Query {
        &self.query
    }

    // ── Filtering methods (lazy) ─────────────────────────────────────

    /// Adds a filter condition. Chained calls AND together.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        let new_node = WhereNode::from_q(&q);
        self.query.where_clause = Some(match self.query.where_clause.take() {
            Some(existing) => WhereNode::And(vec![existing, new_node]),
            None => new_node,
        });
        self
    }

    /// Adds an exclusion condition (NOT).
    #[must_use]
    pub fn exclude(mut self, q: Q) -> Self {
        let new_node = WhereNode::Not(Box::new(WhereNode::from_q(&q)));
        self.query.where_clause = Some(match self.query.where_clause.take() {
            Some(existing) => WhereNode::And(vec![existing, new_node]),
            None => new_node,
        });
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn order_by(mut self, fields: Vec<OrderBy>) -> Self {
        self.query.order_by = fields;
        self
    }

    /// Reverses the current ordering.
    #[must_use]
    pub fn reverse(mut self) -> Self {
        for order in &mut self.query.order_by {
            order.descending = !order.descending;
        }
        self
    }

    /// Selects specific columns. A name of the form `alias__column` selects
    /// an alias-qualified column from a joined table.
    #[must_use]
    pub fn values(mut self, fields: Vec<&str>) -> Self {
        self.query.select = fields
            .into_iter()
            .map(|f| match f.split_once("__") {
                Some((table, col)) => {
                    SelectColumn::TableColumn(table.to_string(), col.to_string())
                }
                None => SelectColumn::Column(f.to_string()),
            })
            .collect();
        self
    }

    /// Selects specific columns as a flat list. Alias of [`QuerySet::values`];
    /// the difference is in how callers consume the rows.
    #[must_use]
    pub fn values_list(self, fields: Vec<&str>) -> Self {
        self.values(fields)
    }

    /// Adds DISTINCT to the query.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    /// Returns all rows (identity operation for chaining).
    #[must_use]
    pub fn all(self) -> Self {
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.query.limit = Some(n);
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub fn offset(mut self, n: usize) -> Self {
        self.query.offset = Some(n);
        self
    }

    /// Adds an annotation (computed expression with an alias). Annotations
    /// appear in the generated SQL in the order they are added.
    #[must_use]
    pub fn annotate(mut self, name: impl Into<String>, expr: Expression) -> Self {
        self.query.annotations.push((name.into(), expr));
        self
    }

    /// Adds GROUP BY columns (for aggregate annotations over joins).
    #[must_use]
    pub fn group_by(mut self, columns: Vec<&str>) -> Self {
        self.query
            .group_by
            .extend(columns.into_iter().map(String::from));
        self
    }

    /// Adds an explicit JOIN clause.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.query.joins.push(join);
        self
    }

    /// Eagerly loads foreign-key targets via LEFT JOINs.
    ///
    /// Each entry provides the relation metadata (related table, FK column,
    /// related PK column, and alias). The joined columns become addressable
    /// in `values()`, filters, and ordering as `alias__column`.
    #[must_use]
    pub fn select_related_with(mut self, fields: Vec<SelectRelatedField>) -> Self {
        let main_table = self.query.table.clone();
        for field in fields {
            self.query.joins.push(field.to_join(&main_table));
        }
        self
    }

    /// Registers reverse relations for batch loading.
    ///
    /// After the main query executes, one additional query per field loads
    /// the related rows with a single `IN (pks...)` filter. Results are
    /// returned alongside the main models by
    /// [`QuerySet::fetch_with_prefetch`].
    #[must_use]
    pub fn prefetch_related_with(mut self, fields: Vec<PrefetchRelatedField>) -> Self {
        self.query.prefetch_related.extend(fields);
        self
    }

    /// Sets fields for an update operation, to be run with
    /// [`QuerySet::update_exec`].
    #[must_use]
    pub fn update(mut self, fields: Vec<(&'static str, Value)>) -> Self {
        self.pending_update = Some(fields);
        self
    }

    /// Marks this queryset for deletion, to be run with
    /// [`QuerySet::delete_exec`].
    #[must_use]
    pub fn delete(mut self) -> Self {
        self.pending_delete = true;
        self
    }

    // ── SQL generation ───────────────────────────────────────────────

    /// Compiles the queryset to SQL for the given backend dialect.
    pub fn to_sql(&self, backend: BackendKind) -> (String, Vec<Value>) {
        let compiler = SqlCompiler::new(backend);

        if let Some(ref fields) = self.pending_create {
            return compiler.compile_insert(&self.query.table, fields);
        }

        if let Some(ref fields) = self.pending_update {
            let where_clause = self
                .query
                .where_clause
                .clone()
                // Update without WHERE updates all rows.
                .unwrap_or(WhereNode::And(vec![]));
            return compiler.compile_update(&self.query.table, fields, &where_clause);
        }

        if self.pending_delete {
            let where_clause = self
                .query
                .where_clause
                .clone()
                .unwrap_or(WhereNode::And(vec![]));
            return compiler.compile_delete(&self.query.table, &where_clause);
        }

        compiler.compile_select(&self.query)
    }

    /// Compiles a COUNT query.
    pub fn count_sql(&self, backend: BackendKind) -> (String, Vec<Value>) {
        let mut count_query = self.query.clone();
        count_query.select = vec![SelectColumn::Expression(
            Expression::aggregate(AggregateFunc::Count, Expression::col("*")),
            "count".to_string(),
        )];
        count_query.order_by.clear();
        count_query.limit = None;
        count_query.offset = None;
        SqlCompiler::new(backend).compile_select(&count_query)
    }

    /// Compiles an EXISTS probe (`SELECT 1 ... LIMIT 1`).
    pub fn exists_sql(&self, backend: BackendKind) -> (String, Vec<Value>) {
        let mut exists_query = self.query.clone();
        exists_query.select = vec![SelectColumn::Expression(
            Expression::value(1),
            "one".to_string(),
        )];
        exists_query.order_by.clear();
        exists_query.limit = Some(1);
        SqlCompiler::new(backend).compile_select(&exists_query)
    }

    /// Compiles an aggregate query with the given named aggregates.
    pub fn aggregate_sql(
        &self,
        aggregates: Vec<(String, Expression)>,
        backend: BackendKind,
    ) -> (String, Vec<Value>) {
        let mut agg_query = self.query.clone();
        agg_query.select = aggregates
            .into_iter()
            .map(|(alias, expr)| SelectColumn::Expression(expr, alias))
            .collect();
        agg_query.order_by.clear();
        agg_query.limit = None;
        agg_query.offset = None;
        SqlCompiler::new(backend).compile_select(&agg_query)
    }

    // ── Async execution methods ──────────────────────────────────────

    /// Executes the query and returns all matching model instances.
    pub async fn fetch_all(&self, db: &dyn DbExecutor) -> StoreResult<Vec<M>> {
        let (sql, params) = self.to_sql(db.backend_kind());
        let rows = db.query(&sql, &params).await?;
        rows.iter().map(M::from_row).collect()
    }

    /// Executes the query and returns the raw rows.
    ///
    /// Use this with `values()` projections and annotations, where the row
    /// shape no longer matches the model.
    pub async fn fetch_rows(&self, db: &dyn DbExecutor) -> StoreResult<Vec<Row>> {
        let (sql, params) = self.to_sql(db.backend_kind());
        db.query(&sql, &params).await
    }

    /// Returns the count of matching rows.
    pub async fn count(&self, db: &dyn DbExecutor) -> StoreResult<i64> {
        let (sql, params) = self.count_sql(db.backend_kind());
        let rows = db.query(&sql, &params).await?;
        rows.into_iter()
            .next()
            .map_or(Ok(0), |row| row.get_by_index::<i64>(0))
    }

    /// Returns whether any rows match the query.
    pub async fn exists(&self, db: &dyn DbExecutor) -> StoreResult<bool> {
        let (sql, params) = self.exists_sql(db.backend_kind());
        let rows = db.query(&sql, &params).await?;
        Ok(!rows.is_empty())
    }

    /// Returns the first matching row, or `None` if no rows match.
    pub async fn first(&self, db: &dyn DbExecutor) -> StoreResult<Option<M>> {
        let mut first_query = self.query.clone();
        first_query.limit = Some(1);
        let (sql, params) = SqlCompiler::new(db.backend_kind()).compile_select(&first_query);
        let rows = db.query(&sql, &params).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(M::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Returns the row with the smallest value of the given field.
    pub async fn earliest(&self, db: &dyn DbExecutor, field: &str) -> StoreResult<Option<M>> {
        let mut query = self.query.clone();
        query.order_by = vec![OrderBy::asc(field)];
        query.limit = Some(1);
        let (sql, params) = SqlCompiler::new(db.backend_kind()).compile_select(&query);
        let rows = db.query(&sql, &params).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(M::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Returns the row with the largest value of the given field.
    pub async fn latest(&self, db: &dyn DbExecutor, field: &str) -> StoreResult<Option<M>> {
        let mut query = self.query.clone();
        query.order_by = vec![OrderBy::desc(field)];
        query.limit = Some(1);
        let (sql, params) = SqlCompiler::new(db.backend_kind()).compile_select(&query);
        let rows = db.query(&sql, &params).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(M::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Returns a single matching row.
    ///
    /// Returns `DoesNotExist` if no rows match, or `MultipleObjectsReturned`
    /// if more than one row matches.
    pub async fn get(&self, db: &dyn DbExecutor) -> StoreResult<M> {
        let mut get_query = self.query.clone();
        get_query.limit = Some(2); // fetch 2 to detect multiple matches
        let (sql, params) = SqlCompiler::new(db.backend_kind()).compile_select(&get_query);
        let rows = db.query(&sql, &params).await?;
        match rows.len() {
            0 => Err(StoreError::DoesNotExist(format!(
                "{} matching query does not exist",
                M::table_name()
            ))),
            1 => M::from_row(&rows[0]),
            n => Err(StoreError::MultipleObjectsReturned(format!(
                "get() on {} returned {n} rows",
                M::table_name()
            ))),
        }
    }

    /// Runs the given named aggregates and returns the single result row.
    pub async fn aggregate(
        &self,
        db: &dyn DbExecutor,
        aggregates: Vec<(String, Expression)>,
    ) -> StoreResult<Row> {
        let (sql, params) = self.aggregate_sql(aggregates, db.backend_kind());
        db.query_one(&sql, &params).await
    }

    /// Runs an UPDATE and returns the number of rows affected.
    ///
    /// The queryset must have been prepared with `.update(fields)`.
    pub async fn update_exec(&self, db: &dyn DbExecutor) -> StoreResult<u64> {
        if self.pending_update.is_none() {
            return Err(StoreError::DatabaseError(
                "No pending update fields. Call .update(fields) before .update_exec()".to_string(),
            ));
        }
        let (sql, params) = self.to_sql(db.backend_kind());
        db.execute_sql(&sql, &params).await
    }

    /// Runs a DELETE and returns the number of rows affected.
    ///
    /// The queryset must have been prepared with `.delete()`.
    pub async fn delete_exec(&self, db: &dyn DbExecutor) -> StoreResult<u64> {
        if !self.pending_delete {
            return Err(StoreError::DatabaseError(
                "QuerySet is not marked for deletion. Call .delete() before .delete_exec()"
                    .to_string(),
            ));
        }
        let (sql, params) = self.to_sql(db.backend_kind());
        db.execute_sql(&sql, &params).await
    }

    /// Runs an INSERT and returns the inserted row ID.
    ///
    /// The queryset must have been prepared via `Manager::create(fields)`.
    pub async fn create_exec(&self, db: &dyn DbExecutor) -> StoreResult<Value> {
        if self.pending_create.is_none() {
            return Err(StoreError::DatabaseError(
                "No pending create fields. Call Manager::create(fields) before .create_exec()"
                    .to_string(),
            ));
        }
        let (sql, params) = self.to_sql(db.backend_kind());
        db.insert_returning_id(&sql, &params).await
    }

    /// Executes the main query and then the registered prefetch queries.
    ///
    /// Returns the models and a cache mapping each prefetch field name to the
    /// rows its batch query returned.
    pub async fn fetch_with_prefetch(&self, db: &dyn DbExecutor) -> StoreResult<PrefetchResult<M>> {
        let (sql, params) = self.to_sql(db.backend_kind());
        let rows = db.query(&sql, &params).await?;
        let models: Vec<M> = rows.iter().map(M::from_row).collect::<Result<_, _>>()?;

        // Collect PK values from the results for the batch IN clauses.
        let pk_values: Vec<Value> = models.iter().filter_map(Model::pk).collect();

        let compiler = SqlCompiler::new(db.backend_kind());
        let prefetch_queries =
            compiler.compile_prefetch_queries(&self.query.prefetch_related, &pk_values);

        let mut prefetch_cache = HashMap::new();
        for (field_name, pf_sql, pf_params) in prefetch_queries {
            let pf_rows = db.query(&pf_sql, &pf_params).await?;
            prefetch_cache.insert(field_name, pf_rows);
        }

        Ok(PrefetchResult {
            models,
            prefetch_cache,
        })
    }
}

/// Result of a prefetching query: the main models plus a cache of related
/// rows keyed by field name.
#[derive(Debug)]
pub struct PrefetchResult<M: Model> {
    /// The main query result models.
    pub models: Vec<M>,
    /// Cached prefetch query results, keyed by field name.
    pub prefetch_cache: HashMap<String, Vec<Row>>,
}

impl<M: Model> PrefetchResult<M> {
    /// Returns the prefetched rows for the given field.
    pub fn get_prefetched(&self, field_name: &str) -> Option<&Vec<Row>> {
        self.prefetch_cache.get(field_name)
    }

    /// Returns the number of main result models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if there are no main result models.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
