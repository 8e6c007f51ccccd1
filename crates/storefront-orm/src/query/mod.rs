//! Query building, compilation, and execution.
//!
//! This module contains the complete query pipeline:
//!
//! - [`lookups`] - Q objects and lookup types for filtering
//! - [`expressions`] - F-objects, aggregates, and computed expressions
//! - [`compiler`] - Query AST and SQL compilation
//! - [`queryset`] - QuerySet and Manager for lazy query building
//! - [`raw`] - Raw SQL cursors and model-mapped raw queries

pub mod compiler;
pub mod expressions;
pub mod lookups;
pub mod queryset;
pub mod raw;

pub use compiler::{
    BackendKind, Join, JoinKind, OrderBy, PrefetchRelatedField, Query, Row, SelectColumn,
    SelectRelatedField, SqlCompiler, WhereNode,
};
pub use expressions::{AggregateFunc, Expression};
pub use lookups::{Lookup, Q};
pub use queryset::{Manager, PrefetchResult, QuerySet};
