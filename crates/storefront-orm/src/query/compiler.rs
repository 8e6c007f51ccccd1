//! SQL query AST and compiler.
//!
//! This module defines the [`Query`] AST that represents a database query, and
//! the [`SqlCompiler`] that translates it into parameterized SQL strings. The
//! compiler supports PostgreSQL (`$1, $2, ...`) and SQLite (`?`) parameter
//! placeholder styles.

use super::expressions::Expression;
use super::lookups::{Lookup, Q};
use crate::value::Value;
use storefront_core::StoreError;

/// The database dialect, used by the compiler to generate backend-specific
/// SQL syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// SQLite (uses `?` placeholders).
    Sqlite,
    /// PostgreSQL (uses `$1, $2, ...` placeholders).
    Postgres,
}

/// A column ordering direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The column to order by (an alias-qualified name may use `alias__column`).
    pub column: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// A column to select in a query.
#[derive(Debug, Clone)]
pub enum SelectColumn {
    /// A simple column name.
    Column(String),
    /// A column with a table or alias prefix.
    TableColumn(String, String),
    /// An expression with an alias.
    Expression(Expression, String),
    /// All columns (`*`).
    Star,
}

/// A WHERE clause node in the query AST.
#[derive(Debug, Clone)]
pub enum WhereNode {
    /// A single condition.
    Condition {
        /// The column name.
        column: String,
        /// The lookup type.
        lookup: Lookup,
    },
    /// Logical AND of conditions.
    And(Vec<WhereNode>),
    /// Logical OR of conditions.
    Or(Vec<WhereNode>),
    /// Logical NOT of a condition.
    Not(Box<WhereNode>),
}

impl WhereNode {
    /// Converts a `Q` object into a `WhereNode`.
    pub fn from_q(q: &Q) -> Self {
        match q {
            Q::Filter { field, lookup } => Self::Condition {
                column: field.clone(),
                lookup: lookup.clone(),
            },
            Q::And(children) => Self::And(children.iter().map(Self::from_q).collect()),
            Q::Or(children) => Self::Or(children.iter().map(Self::from_q).collect()),
            Q::Not(inner) => Self::Not(Box::new(Self::from_q(inner))),
        }
    }
}

/// SQL JOIN types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
}

impl JoinKind {
    /// Returns the SQL keyword for this join type.
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A JOIN clause in the query AST.
///
/// Compiles to
/// `<kind> "<table>" AS "<alias>" ON "<left_table>"."<left_column>" = "<alias>"."<right_column>"`.
#[derive(Debug, Clone)]
pub struct Join {
    /// The table to join.
    pub table: String,
    /// The alias for the joined table.
    pub alias: String,
    /// The type of join.
    pub kind: JoinKind,
    /// The table (or alias) on the left side of the ON condition.
    pub left_table: String,
    /// The column on the left side of the ON condition.
    pub left_column: String,
    /// The column of the joined table on the right side of the ON condition.
    pub right_column: String,
}

/// Relation metadata for eager loading a foreign key target via a LEFT JOIN.
#[derive(Debug, Clone)]
pub struct SelectRelatedField {
    /// The relation field name (e.g. "collection").
    pub field_name: String,
    /// The related table.
    pub related_table: String,
    /// The FK column on the main table.
    pub fk_column: String,
    /// The PK column on the related table.
    pub related_column: String,
    /// The alias used for the joined table.
    pub alias: String,
}

impl SelectRelatedField {
    /// Builds the LEFT JOIN for this relation against the given main table.
    pub fn to_join(&self, main_table: &str) -> Join {
        Join {
            table: self.related_table.clone(),
            alias: self.alias.clone(),
            kind: JoinKind::Left,
            left_table: main_table.to_string(),
            left_column: self.fk_column.clone(),
            right_column: self.related_column.clone(),
        }
    }
}

/// Relation metadata for batch-loading a reverse relation after the main
/// query executes.
#[derive(Debug, Clone)]
pub struct PrefetchRelatedField {
    /// The relation field name (e.g. "items").
    pub field_name: String,
    /// The related table.
    pub related_table: String,
    /// The FK column on the related table that points back at the main table.
    pub related_column: String,
}

/// The complete query AST representing a SELECT statement.
#[derive(Debug, Clone)]
pub struct Query {
    /// The main table name.
    pub table: String,
    /// Columns to select.
    pub select: Vec<SelectColumn>,
    /// WHERE clause.
    pub where_clause: Option<WhereNode>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// GROUP BY columns.
    pub group_by: Vec<String>,
    /// JOIN clauses.
    pub joins: Vec<Join>,
    /// LIMIT.
    pub limit: Option<usize>,
    /// OFFSET.
    pub offset: Option<usize>,
    /// DISTINCT flag.
    pub distinct: bool,
    /// Named annotations (computed columns), in insertion order.
    pub annotations: Vec<(String, Expression)>,
    /// Relations to batch-load after the main query.
    pub prefetch_related: Vec<PrefetchRelatedField>,
}

impl Query {
    /// Creates a new query for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: vec![SelectColumn::Star],
            where_clause: None,
            order_by: Vec::new(),
            group_by: Vec::new(),
            joins: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            annotations: Vec::new(),
            prefetch_related: Vec::new(),
        }
    }
}

/// A generic database row for passing data between backends and the ORM.
///
/// `Row` holds a list of column names and their corresponding values. It
/// provides typed access via the [`get`](Row::get) method.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the value cannot be
    /// converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, StoreError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| {
                StoreError::DatabaseError(format!("Column '{column}' not found in row"))
            })?;
        T::from_value(&self.values[idx])
    }

    /// Gets a typed value by column index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds or the value cannot be
    /// converted to the requested type.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> Result<T, StoreError> {
        if idx >= self.values.len() {
            return Err(StoreError::DatabaseError(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            )));
        }
        T::from_value(&self.values[idx])
    }

    /// Returns a reference to the raw value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> Result<Self, StoreError>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(StoreError::DatabaseError(format!(
                "Expected Int, got {value:?}"
            ))),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::Int(i) => i32::try_from(*i)
                .map_err(|e| StoreError::DatabaseError(format!("Int value out of i32 range: {e}"))),
            _ => Err(StoreError::DatabaseError(format!(
                "Expected Int, got {value:?}"
            ))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            _ => Err(StoreError::DatabaseError(format!(
                "Expected Float, got {value:?}"
            ))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::Bool(b) => Ok(*b),
            // SQLite stores booleans as integers.
            Value::Int(i) => Ok(*i != 0),
            _ => Err(StoreError::DatabaseError(format!(
                "Expected Bool, got {value:?}"
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(StoreError::DatabaseError(format!(
                "Expected String, got {value:?}"
            ))),
        }
    }
}

impl FromValue for chrono::NaiveDate {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::DateTime(dt) => Ok(dt.date()),
            // SQLite stores dates as text.
            Value::String(s) => s
                .parse()
                .map_err(|e| StoreError::DatabaseError(format!("Invalid date '{s}': {e}"))),
            _ => Err(StoreError::DatabaseError(format!(
                "Expected Date, got {value:?}"
            ))),
        }
    }
}

impl FromValue for chrono::NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::String(s) => chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .map_err(|e| StoreError::DatabaseError(format!("Invalid datetime '{s}': {e}"))),
            _ => Err(StoreError::DatabaseError(format!(
                "Expected DateTime, got {value:?}"
            ))),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

/// Quotes a column reference, expanding `alias__column` into a qualified
/// `"alias"."column"` reference. A bare `*` passes through unquoted.
fn quote_column(column: &str) -> String {
    if column == "*" {
        return "*".to_string();
    }
    match column.split_once("__") {
        Some((table, col)) => format!("\"{table}\".\"{col}\""),
        None => format!("\"{column}\""),
    }
}

/// Quotes a column reference, qualifying bare names with the given table.
///
/// Once a query carries joins, an unqualified column name shared by two
/// tables is ambiguous, so every bare name is pinned to the main table.
/// Already-qualified `alias__column` names and `*` pass through unchanged.
fn quote_column_qualified(column: &str, table: Option<&str>) -> String {
    match table {
        Some(table) if !column.contains("__") && column != "*" => {
            format!("\"{table}\".\"{column}\"")
        }
        _ => quote_column(column),
    }
}

/// The SQL compiler translates a [`Query`] AST into parameterized SQL.
///
/// Different backends use different placeholder styles:
/// - SQLite: `?, ?, ?, ...`
/// - PostgreSQL: `$1, $2, $3, ...`
pub struct SqlCompiler {
    backend: BackendKind,
}

impl SqlCompiler {
    /// Creates a new compiler for the given backend dialect.
    pub const fn new(backend: BackendKind) -> Self {
        Self { backend }
    }

    /// Returns a parameter placeholder for the given 1-based index.
    fn placeholder(&self, index: usize) -> String {
        match self.backend {
            BackendKind::Sqlite => "?".to_string(),
            BackendKind::Postgres => format!("${index}"),
        }
    }

    /// Compiles a SELECT query into SQL and parameters.
    pub fn compile_select(&self, query: &Query) -> (String, Vec<Value>) {
        let mut params: Vec<Value> = Vec::new();
        let mut sql = String::from("SELECT ");

        if query.distinct {
            sql.push_str("DISTINCT ");
        }

        // With joins present, bare column names are qualified with the main
        // table so names shared across the joined tables stay unambiguous.
        let qualify_table = (!query.joins.is_empty()).then_some(query.table.as_str());

        // SELECT columns
        let select_parts: Vec<String> = if query.select.is_empty() {
            vec!["*".to_string()]
        } else {
            query
                .select
                .iter()
                .map(|col| match col {
                    SelectColumn::Column(name) => quote_column_qualified(name, qualify_table),
                    SelectColumn::TableColumn(table, name) => format!("\"{table}\".\"{name}\""),
                    SelectColumn::Expression(expr, alias) => {
                        let expr_sql = self.compile_expression(expr, &mut params);
                        format!("{expr_sql} AS \"{alias}\"")
                    }
                    // With joins present, a bare * would pull in the joined
                    // tables' duplicate column names.
                    SelectColumn::Star if !query.joins.is_empty() => {
                        format!("\"{}\".*", query.table)
                    }
                    SelectColumn::Star => "*".to_string(),
                })
                .collect()
        };
        sql.push_str(&select_parts.join(", "));

        // Annotations follow the selected columns, in insertion order.
        for (alias, expr) in &query.annotations {
            let expr_sql = self.compile_expression(expr, &mut params);
            sql.push_str(&format!(", {expr_sql} AS \"{alias}\""));
        }

        // FROM
        sql.push_str(&format!(" FROM \"{}\"", query.table));

        // JOINs
        for join in &query.joins {
            sql.push_str(&format!(
                " {} \"{}\" AS \"{}\" ON \"{}\".\"{}\" = \"{}\".\"{}\"",
                join.kind.sql_keyword(),
                join.table,
                join.alias,
                join.left_table,
                join.left_column,
                join.alias,
                join.right_column,
            ));
        }

        // WHERE
        if let Some(ref where_clause) = query.where_clause {
            sql.push_str(" WHERE ");
            self.compile_where_node(where_clause, qualify_table, &mut sql, &mut params);
        }

        // GROUP BY
        if !query.group_by.is_empty() {
            let cols: Vec<String> = query
                .group_by
                .iter()
                .map(|c| quote_column_qualified(c, qualify_table))
                .collect();
            sql.push_str(&format!(" GROUP BY {}", cols.join(", ")));
        }

        // ORDER BY
        if !query.order_by.is_empty() {
            let orders: Vec<String> = query
                .order_by
                .iter()
                .map(|o| {
                    let dir = if o.descending { " DESC" } else { " ASC" };
                    format!("{}{dir}", quote_column_qualified(&o.column, qualify_table))
                })
                .collect();
            sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
        }

        // LIMIT
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        // OFFSET
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        (sql, params)
    }

    /// Compiles an INSERT statement.
    pub fn compile_insert(&self, table: &str, fields: &[(&str, Value)]) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let columns: Vec<String> = fields.iter().map(|(name, _)| format!("\"{name}\"")).collect();
        let placeholders: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, (_, val))| {
                params.push(val.clone());
                self.placeholder(i + 1)
            })
            .collect();

        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );

        (sql, params)
    }

    /// Compiles an UPDATE statement.
    pub fn compile_update(
        &self,
        table: &str,
        fields: &[(&str, Value)],
        where_clause: &WhereNode,
    ) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let set_parts: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, (name, val))| {
                params.push(val.clone());
                let ph = self.placeholder(i + 1);
                format!("\"{name}\" = {ph}")
            })
            .collect();

        let mut sql = format!("UPDATE \"{}\" SET {} WHERE ", table, set_parts.join(", "));
        self.compile_where_node(where_clause, None, &mut sql, &mut params);
        (sql, params)
    }

    /// Compiles a DELETE statement.
    pub fn compile_delete(&self, table: &str, where_clause: &WhereNode) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM \"{table}\" WHERE ");
        self.compile_where_node(where_clause, None, &mut sql, &mut params);
        (sql, params)
    }

    /// Compiles the batch queries for prefetching reverse relations.
    ///
    /// Each prefetch field produces one query of the form
    /// `SELECT * FROM "related" WHERE "related_column" IN (pks...)`.
    /// An empty PK set compiles to `WHERE 1=0` so no rows are fetched.
    pub fn compile_prefetch_queries(
        &self,
        prefetch: &[PrefetchRelatedField],
        pk_values: &[Value],
    ) -> Vec<(String, String, Vec<Value>)> {
        prefetch
            .iter()
            .map(|field| {
                if pk_values.is_empty() {
                    let sql = format!("SELECT * FROM \"{}\" WHERE 1=0", field.related_table);
                    return (field.field_name.clone(), sql, Vec::new());
                }
                let placeholders: Vec<String> = (1..=pk_values.len())
                    .map(|i| self.placeholder(i))
                    .collect();
                let sql = format!(
                    "SELECT * FROM \"{}\" WHERE \"{}\" IN ({})",
                    field.related_table,
                    field.related_column,
                    placeholders.join(", ")
                );
                (field.field_name.clone(), sql, pk_values.to_vec())
            })
            .collect()
    }

    /// Compiles a `WhereNode` into SQL, appending to the provided string.
    fn compile_where_node(
        &self,
        node: &WhereNode,
        qualify_table: Option<&str>,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) {
        match node {
            WhereNode::Condition { column, lookup } => {
                self.compile_lookup(column, lookup, qualify_table, sql, params);
            }
            WhereNode::And(children) => {
                if children.is_empty() {
                    sql.push_str("1=1");
                    return;
                }
                sql.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" AND ");
                    }
                    self.compile_where_node(child, qualify_table, sql, params);
                }
                sql.push(')');
            }
            WhereNode::Or(children) => {
                if children.is_empty() {
                    sql.push_str("1=0");
                    return;
                }
                sql.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    self.compile_where_node(child, qualify_table, sql, params);
                }
                sql.push(')');
            }
            WhereNode::Not(inner) => {
                sql.push_str("NOT (");
                self.compile_where_node(inner, qualify_table, sql, params);
                sql.push(')');
            }
        }
    }

    /// Compiles a single lookup into SQL.
    fn compile_lookup(
        &self,
        column: &str,
        lookup: &Lookup,
        qualify_table: Option<&str>,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) {
        let col = quote_column_qualified(column, qualify_table);
        match lookup {
            Lookup::Exact(val) => {
                if val.is_null() {
                    sql.push_str(&format!("{col} IS NULL"));
                } else {
                    params.push(val.clone());
                    let ph = self.placeholder(params.len());
                    sql.push_str(&format!("{col} = {ph}"));
                }
            }
            Lookup::IExact(val) => {
                params.push(val.clone());
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("LOWER({col}) = LOWER({ph})"));
            }
            Lookup::ExactField(other) => {
                let other = quote_column_qualified(other, qualify_table);
                sql.push_str(&format!("{col} = {other}"));
            }
            Lookup::Contains(val) => {
                params.push(Value::String(format!("%{val}%")));
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{col} LIKE {ph}"));
            }
            Lookup::IContains(val) => {
                params.push(Value::String(format!("%{val}%")));
                let ph = self.placeholder(params.len());
                match self.backend {
                    BackendKind::Postgres => {
                        sql.push_str(&format!("{col} ILIKE {ph}"));
                    }
                    BackendKind::Sqlite => {
                        sql.push_str(&format!("LOWER({col}) LIKE LOWER({ph})"));
                    }
                }
            }
            Lookup::In(vals) => {
                let placeholders: Vec<String> = vals
                    .iter()
                    .map(|v| {
                        params.push(v.clone());
                        self.placeholder(params.len())
                    })
                    .collect();
                sql.push_str(&format!("{col} IN ({})", placeholders.join(", ")));
            }
            Lookup::InSubquery(query) => {
                // Inner placeholders continue the outer numbering so the
                // parameter list stays flat.
                let (inner_sql, inner_params) = self.compile_subquery(query, params.len());
                params.extend(inner_params);
                sql.push_str(&format!("{col} IN ({inner_sql})"));
            }
            Lookup::Gt(val) => {
                params.push(val.clone());
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{col} > {ph}"));
            }
            Lookup::Gte(val) => {
                params.push(val.clone());
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{col} >= {ph}"));
            }
            Lookup::Lt(val) => {
                params.push(val.clone());
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{col} < {ph}"));
            }
            Lookup::Lte(val) => {
                params.push(val.clone());
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{col} <= {ph}"));
            }
            Lookup::StartsWith(val) => {
                params.push(Value::String(format!("{val}%")));
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{col} LIKE {ph}"));
            }
            Lookup::IStartsWith(val) => {
                params.push(Value::String(format!("{val}%")));
                let ph = self.placeholder(params.len());
                match self.backend {
                    BackendKind::Postgres => sql.push_str(&format!("{col} ILIKE {ph}")),
                    BackendKind::Sqlite => {
                        sql.push_str(&format!("LOWER({col}) LIKE LOWER({ph})"));
                    }
                }
            }
            Lookup::EndsWith(val) => {
                params.push(Value::String(format!("%{val}")));
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{col} LIKE {ph}"));
            }
            Lookup::IEndsWith(val) => {
                params.push(Value::String(format!("%{val}")));
                let ph = self.placeholder(params.len());
                match self.backend {
                    BackendKind::Postgres => sql.push_str(&format!("{col} ILIKE {ph}")),
                    BackendKind::Sqlite => {
                        sql.push_str(&format!("LOWER({col}) LIKE LOWER({ph})"));
                    }
                }
            }
            Lookup::Range(low, high) => {
                params.push(low.clone());
                let ph_low = self.placeholder(params.len());
                params.push(high.clone());
                let ph_high = self.placeholder(params.len());
                sql.push_str(&format!("{col} BETWEEN {ph_low} AND {ph_high}"));
            }
            Lookup::IsNull(is_null) => {
                if *is_null {
                    sql.push_str(&format!("{col} IS NULL"));
                } else {
                    sql.push_str(&format!("{col} IS NOT NULL"));
                }
            }
        }
    }

    /// Compiles a subquery with placeholder numbering offset by the number of
    /// parameters already emitted by the outer query.
    fn compile_subquery(&self, query: &Query, outer_params: usize) -> (String, Vec<Value>) {
        let (sql, params) = self.compile_select(query);
        match self.backend {
            // `?` placeholders are positional; nothing to renumber.
            BackendKind::Sqlite => (sql, params),
            BackendKind::Postgres => {
                // Renumber $1..$n to $(outer+1)..$(outer+n). Highest index
                // first so $1 does not clobber $10.
                let mut renumbered = sql;
                for i in (1..=params.len()).rev() {
                    renumbered =
                        renumbered.replace(&format!("${i}"), &format!("${}", i + outer_params));
                }
                (renumbered, params)
            }
        }
    }

    /// Compiles an expression into SQL.
    pub fn compile_expression(&self, expr: &Expression, params: &mut Vec<Value>) -> String {
        match expr {
            Expression::Col(name) | Expression::F(name) => quote_column(name),
            Expression::TableCol(table, name) => format!("\"{table}\".\"{name}\""),
            Expression::Value(val) => {
                params.push(val.clone());
                self.placeholder(params.len())
            }
            Expression::Func { name, args } => {
                let arg_parts: Vec<String> = args
                    .iter()
                    .map(|a| self.compile_expression(a, params))
                    .collect();
                format!("{name}({})", arg_parts.join(", "))
            }
            Expression::Aggregate {
                func,
                field,
                distinct,
            } => {
                let field_sql = self.compile_expression(field, params);
                let distinct_str = if *distinct { "DISTINCT " } else { "" };
                format!("{}({distinct_str}{field_sql})", func.sql_name())
            }
            Expression::Subquery(query) => {
                let (sub_sql, sub_params) = self.compile_subquery(query, params.len());
                params.extend(sub_params);
                format!("({sub_sql})")
            }
            Expression::Wrapped { expr, output } => {
                let inner = self.compile_expression(expr, params);
                format!("CAST({inner} AS {})", output.sql_type(self.backend))
            }
            Expression::RawSql(raw, raw_params) => {
                params.extend(raw_params.clone());
                raw.clone()
            }
            Expression::Add(left, right) => {
                let l = self.compile_expression(left, params);
                let r = self.compile_expression(right, params);
                format!("({l} + {r})")
            }
            Expression::Sub(left, right) => {
                let l = self.compile_expression(left, params);
                let r = self.compile_expression(right, params);
                format!("({l} - {r})")
            }
            Expression::Mul(left, right) => {
                let l = self.compile_expression(left, params);
                let r = self.compile_expression(right, params);
                format!("({l} * {r})")
            }
            Expression::Div(left, right) => {
                let l = self.compile_expression(left, params);
                let r = self.compile_expression(right, params);
                format!("({l} / {r})")
            }
        }
    }
}

/// Returns an error classifying a driver failure as an integrity violation
/// when the message indicates a constraint failure.
///
/// Backends funnel driver error strings through this helper so FK and UNIQUE
/// violations surface as [`StoreError::IntegrityError`].
pub fn classify_database_error(message: String) -> StoreError {
    let lower = message.to_lowercase();
    if lower.contains("constraint") || lower.contains("violates") {
        StoreError::IntegrityError(message)
    } else {
        StoreError::DatabaseError(message)
    }
}
