//! Query expressions, aggregates, and F-objects.
//!
//! This module provides the [`Expression`] enum for building computed values,
//! annotations, and aggregates in queries, along with helper constructors for
//! common database functions.
//!
//! # Examples
//!
//! ```
//! use storefront_orm::query::expressions::{AggregateFunc, Expression, OutputType};
//!
//! // unit_price * 0.8, typed as a decimal
//! let discounted = (Expression::f("unit_price") * Expression::value(0.8))
//!     .wrap(OutputType::Decimal { max_digits: 6, decimal_places: 2 });
//!
//! // COUNT(id)
//! let count = Expression::aggregate(AggregateFunc::Count, Expression::col("id"));
//! ```

use crate::query::compiler::{BackendKind, Query};
use crate::value::Value;
use std::ops;

/// A query expression that produces a value in the context of a SQL query.
///
/// Expressions reference columns, literal values, functions, aggregates,
/// subqueries, and arithmetic combinations. They are used in `annotate()` and
/// `aggregate()` clauses.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A column reference (plain or `table.column` via [`Expression::table_col`]).
    Col(String),
    /// A column reference with an explicit table or alias prefix.
    TableCol(String, String),
    /// A literal value.
    Value(Value),
    /// An F-expression referencing another field of the same row.
    F(String),
    /// A database function call.
    Func {
        /// Function name (e.g. "CONCAT", "COALESCE").
        name: String,
        /// Function arguments.
        args: Vec<Expression>,
    },
    /// An aggregate function.
    Aggregate {
        /// The aggregate operation.
        func: AggregateFunc,
        /// The expression being aggregated.
        field: Box<Expression>,
        /// Whether to apply DISTINCT.
        distinct: bool,
    },
    /// A subquery expression.
    Subquery(Box<Query>),
    /// An expression annotated with an explicit output column type.
    /// Compiles to a CAST so the database reports the intended type.
    Wrapped {
        /// The wrapped expression.
        expr: Box<Expression>,
        /// The output column type.
        output: OutputType,
    },
    /// Raw SQL with parameters.
    RawSql(String, Vec<Value>),
    /// Addition.
    Add(Box<Expression>, Box<Expression>),
    /// Subtraction.
    Sub(Box<Expression>, Box<Expression>),
    /// Multiplication.
    Mul(Box<Expression>, Box<Expression>),
    /// Division.
    Div(Box<Expression>, Box<Expression>),
}

/// Aggregate function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    /// COUNT.
    Count,
    /// SUM.
    Sum,
    /// AVG.
    Avg,
    /// MIN.
    Min,
    /// MAX.
    Max,
}

impl AggregateFunc {
    /// Returns the SQL function name for this aggregate.
    pub const fn sql_name(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// The declared output type of a wrapped expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    /// A 64-bit integer.
    Integer,
    /// A double-precision float.
    Float,
    /// A fixed-precision decimal.
    Decimal {
        /// Maximum total digits.
        max_digits: u32,
        /// Digits after the decimal point.
        decimal_places: u32,
    },
    /// A text column.
    Text,
}

impl OutputType {
    /// Returns the SQL type name used in the CAST for the given backend.
    pub fn sql_type(&self, backend: BackendKind) -> String {
        match (self, backend) {
            (Self::Integer, _) => "BIGINT".to_string(),
            (Self::Float, BackendKind::Postgres) => "DOUBLE PRECISION".to_string(),
            (Self::Float, BackendKind::Sqlite) => "REAL".to_string(),
            (
                Self::Decimal {
                    max_digits,
                    decimal_places,
                },
                _,
            ) => format!("NUMERIC({max_digits}, {decimal_places})"),
            (Self::Text, _) => "TEXT".to_string(),
        }
    }
}

impl Expression {
    /// Creates a column reference expression.
    pub fn col(name: impl Into<String>) -> Self {
        Self::Col(name.into())
    }

    /// Creates a table-qualified column reference expression.
    pub fn table_col(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::TableCol(table.into(), name.into())
    }

    /// Creates an F-expression referencing a field.
    pub fn f(name: impl Into<String>) -> Self {
        Self::F(name.into())
    }

    /// Creates a literal value expression.
    pub fn value(v: impl Into<Value>) -> Self {
        Self::Value(v.into())
    }

    /// Creates a function call expression.
    pub fn func(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::Func {
            name: name.into(),
            args,
        }
    }

    /// Creates an aggregate expression.
    pub fn aggregate(func: AggregateFunc, field: Expression) -> Self {
        Self::Aggregate {
            func,
            field: Box::new(field),
            distinct: false,
        }
    }

    /// Creates an aggregate with DISTINCT.
    pub fn aggregate_distinct(func: AggregateFunc, field: Expression) -> Self {
        Self::Aggregate {
            func,
            field: Box::new(field),
            distinct: true,
        }
    }

    /// Wraps this expression with an explicit output type.
    #[must_use]
    pub fn wrap(self, output: OutputType) -> Self {
        Self::Wrapped {
            expr: Box::new(self),
            output,
        }
    }

    /// Creates a raw SQL expression with parameters.
    pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self::RawSql(sql.into(), params)
    }
}

impl ops::Add for Expression {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Expression {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::Sub(Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Expression {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::Mul(Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Expression {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        Self::Div(Box::new(self), Box::new(rhs))
    }
}

// ── Database function helpers ──────────────────────────────────────────

/// CONCAT(args...) - string concatenation.
pub fn concat(args: Vec<Expression>) -> Expression {
    Expression::func("CONCAT", args)
}

/// COALESCE(args...) - first non-null argument.
pub fn coalesce(args: Vec<Expression>) -> Expression {
    Expression::func("COALESCE", args)
}

/// LOWER(expr) - lowercase.
pub fn lower(expr: Expression) -> Expression {
    Expression::func("LOWER", vec![expr])
}

/// UPPER(expr) - uppercase.
pub fn upper(expr: Expression) -> Expression {
    Expression::func("UPPER", vec![expr])
}

/// LENGTH(expr) - string length.
pub fn length(expr: Expression) -> Expression {
    Expression::func("LENGTH", vec![expr])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_expression() {
        let expr = Expression::col("title");
        assert!(matches!(expr, Expression::Col(ref s) if s == "title"));
    }

    #[test]
    fn test_f_expression() {
        let expr = Expression::f("unit_price");
        assert!(matches!(expr, Expression::F(ref s) if s == "unit_price"));
    }

    #[test]
    fn test_value_expression() {
        let expr = Expression::value(42);
        assert!(matches!(expr, Expression::Value(Value::Int(42))));
    }

    #[test]
    fn test_func_expression() {
        let expr = concat(vec![
            Expression::f("first_name"),
            Expression::value(" "),
            Expression::f("last_name"),
        ]);
        if let Expression::Func { name, args } = &expr {
            assert_eq!(name, "CONCAT");
            assert_eq!(args.len(), 3);
        } else {
            panic!("Expected Func");
        }
    }

    #[test]
    fn test_aggregate_expression() {
        let expr = Expression::aggregate(AggregateFunc::Count, Expression::col("id"));
        if let Expression::Aggregate { func, distinct, .. } = &expr {
            assert_eq!(*func, AggregateFunc::Count);
            assert!(!distinct);
        } else {
            panic!("Expected Aggregate");
        }
    }

    #[test]
    fn test_aggregate_distinct() {
        let expr =
            Expression::aggregate_distinct(AggregateFunc::Count, Expression::col("product_id"));
        if let Expression::Aggregate { distinct, .. } = &expr {
            assert!(distinct);
        } else {
            panic!("Expected Aggregate");
        }
    }

    #[test]
    fn test_wrapped_expression() {
        let expr = (Expression::f("unit_price") * Expression::value(0.8)).wrap(
            OutputType::Decimal {
                max_digits: 6,
                decimal_places: 2,
            },
        );
        if let Expression::Wrapped { output, .. } = &expr {
            assert_eq!(
                *output,
                OutputType::Decimal {
                    max_digits: 6,
                    decimal_places: 2
                }
            );
        } else {
            panic!("Expected Wrapped");
        }
    }

    #[test]
    fn test_arithmetic_operators() {
        assert!(matches!(
            Expression::f("a") + Expression::value(1),
            Expression::Add(_, _)
        ));
        assert!(matches!(
            Expression::f("a") - Expression::value(1),
            Expression::Sub(_, _)
        ));
        assert!(matches!(
            Expression::f("a") * Expression::f("b"),
            Expression::Mul(_, _)
        ));
        assert!(matches!(
            Expression::f("a") / Expression::value(2),
            Expression::Div(_, _)
        ));
    }

    #[test]
    fn test_chained_arithmetic() {
        // (unit_price * quantity) - discount
        let expr =
            (Expression::f("unit_price") * Expression::f("quantity")) - Expression::f("discount");
        assert!(matches!(expr, Expression::Sub(_, _)));
    }

    #[test]
    fn test_aggregate_func_sql_names() {
        assert_eq!(AggregateFunc::Count.sql_name(), "COUNT");
        assert_eq!(AggregateFunc::Sum.sql_name(), "SUM");
        assert_eq!(AggregateFunc::Avg.sql_name(), "AVG");
        assert_eq!(AggregateFunc::Min.sql_name(), "MIN");
        assert_eq!(AggregateFunc::Max.sql_name(), "MAX");
    }

    #[test]
    fn test_output_type_sql() {
        assert_eq!(OutputType::Integer.sql_type(BackendKind::Sqlite), "BIGINT");
        assert_eq!(OutputType::Float.sql_type(BackendKind::Sqlite), "REAL");
        assert_eq!(
            OutputType::Float.sql_type(BackendKind::Postgres),
            "DOUBLE PRECISION"
        );
        assert_eq!(
            OutputType::Decimal {
                max_digits: 6,
                decimal_places: 2
            }
            .sql_type(BackendKind::Postgres),
            "NUMERIC(6, 2)"
        );
    }

    #[test]
    fn test_function_helpers() {
        assert!(matches!(
            lower(Expression::col("title")),
            Expression::Func { ref name, .. } if name == "LOWER"
        ));
        assert!(matches!(
            upper(Expression::col("title")),
            Expression::Func { ref name, .. } if name == "UPPER"
        ));
        assert!(matches!(
            length(Expression::col("title")),
            Expression::Func { ref name, .. } if name == "LENGTH"
        ));
        assert!(matches!(
            coalesce(vec![Expression::col("phone"), Expression::value("")]),
            Expression::Func { ref name, .. } if name == "COALESCE"
        ));
    }

    #[test]
    fn test_raw_expression() {
        let expr = Expression::raw("strftime('%Y', ?)", vec![Value::from("2024-01-01")]);
        if let Expression::RawSql(sql, params) = &expr {
            assert!(sql.contains("strftime"));
            assert_eq!(params.len(), 1);
        } else {
            panic!("Expected RawSql");
        }
    }
}
