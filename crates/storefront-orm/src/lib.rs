//! # storefront-orm
//!
//! The data-access layer for the storefront workspace. Provides the
//! [`Model`](model::Model) trait for defining database models,
//! [`QuerySet`](query::QuerySet) for building and executing queries, and
//! expression types for filters, aggregates, and annotations.
//!
//! ## Architecture
//!
//! The layer is designed around lazy evaluation. A [`QuerySet`](query::QuerySet)
//! builds a [`Query`](query::Query) AST through method chaining without touching
//! the database. SQL is only generated when a terminal method (`.get()`,
//! `.count()`, `.fetch_all()`, etc.) is called, at which point the
//! [`SqlCompiler`](query::SqlCompiler) translates the AST into parameterized SQL
//! for the target backend dialect.
//!
//! ## Module Overview
//!
//! - [`model`] - The [`Model`](model::Model) trait and [`ModelMeta`](model::ModelMeta)
//! - [`fields`] - Field definitions ([`FieldDef`](fields::FieldDef)) and types
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`query`] - Query building, lookups, expressions, and compilation
//! - [`schema`] - DDL generation from model metadata
//! - [`transactions`] - Atomic blocks and savepoints
//! - [`executor`] - The [`DbExecutor`](executor::DbExecutor) bridge trait

// These clippy lints are intentionally allowed for the ORM crate:
// - too_many_lines: the SQL compiler methods are inherently large due to many match arms
// - result_large_err: StoreError is the workspace error type and is used consistently
// - format_push_string: format! with push_str is clearer than write! for SQL generation
// - needless_pass_by_value: some API signatures mirror the query-builder patterns
// - return_self_not_must_use: builder pattern methods are self-documenting
#![allow(clippy::too_many_lines)]
#![allow(clippy::result_large_err)]
#![allow(clippy::format_push_string)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::use_self)]

pub mod executor;
pub mod fields;
pub mod model;
pub mod query;
pub mod schema;
pub mod transactions;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use executor::{create_model, delete_model, refresh_model, save_model, DbExecutor};
pub use fields::{FieldDef, FieldType, OnDelete};
pub use model::{Model, ModelMeta};
pub use query::expressions::{AggregateFunc, Expression, OutputType};
pub use query::raw::{Cursor, RawQuerySet};
pub use query::{
    BackendKind, Join, JoinKind, Lookup, Manager, OrderBy, PrefetchRelatedField, Query, QuerySet,
    Row, SelectColumn, SelectRelatedField, SqlCompiler, WhereNode, Q,
};
pub use transactions::{atomic, Savepoint, TransactionManager};
pub use value::Value;
