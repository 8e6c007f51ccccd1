//! Query lookups and Q objects for building complex filters.
//!
//! This module provides the [`Lookup`] enum for field-level comparisons and
//! the [`Q`] enum for combining filters with AND, OR, and NOT operators.
//!
//! # Examples
//!
//! ```
//! use storefront_orm::query::lookups::{Lookup, Q};
//! use storefront_orm::value::Value;
//!
//! // Simple filter: unit_price < 20
//! let q = Q::filter("unit_price", Lookup::Lt(Value::from(20)));
//!
//! // OR: inventory < 10 OR unit_price < 20
//! let either = Q::filter("inventory", Lookup::Lt(Value::from(10)))
//!     | Q::filter("unit_price", Lookup::Lt(Value::from(20)));
//!
//! // AND NOT: inventory < 10 AND NOT(unit_price < 20)
//! let combined = Q::filter("inventory", Lookup::Lt(Value::from(10)))
//!     & !Q::filter("unit_price", Lookup::Lt(Value::from(20)));
//! ```

use crate::query::compiler::Query;
use crate::value::Value;
use std::ops;

/// A field-level lookup operation.
///
/// Each variant produces the corresponding SQL WHERE clause fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match (`field = value`); a `Null` value compiles to `IS NULL`.
    Exact(Value),
    /// Case-insensitive exact match (`LOWER(field) = LOWER(value)`).
    IExact(Value),
    /// Exact match against another column (`field = other_column`).
    ExactField(String),
    /// Substring match (`field LIKE '%value%'`).
    Contains(String),
    /// Case-insensitive substring match.
    IContains(String),
    /// Membership test (`field IN (values...)`).
    In(Vec<Value>),
    /// Membership test against a subquery (`field IN (SELECT ...)`).
    InSubquery(Box<Query>),
    /// Greater than (`field > value`).
    Gt(Value),
    /// Greater than or equal (`field >= value`).
    Gte(Value),
    /// Less than (`field < value`).
    Lt(Value),
    /// Less than or equal (`field <= value`).
    Lte(Value),
    /// Starts with (`field LIKE 'value%'`).
    StartsWith(String),
    /// Case-insensitive starts with.
    IStartsWith(String),
    /// Ends with (`field LIKE '%value'`).
    EndsWith(String),
    /// Case-insensitive ends with.
    IEndsWith(String),
    /// Range test (`field BETWEEN low AND high`).
    Range(Value, Value),
    /// NULL test (`field IS NULL` or `field IS NOT NULL`).
    IsNull(bool),
}

/// A composable query filter.
///
/// `Q` objects can be combined using `&` (AND), `|` (OR), and `!` (NOT)
/// operators to build arbitrarily complex WHERE clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single field lookup.
    Filter {
        /// The column name (an alias-qualified name may use `alias__column`).
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Returns `true` if this is an empty AND or OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_filter() {
        let q = Q::filter("title", Lookup::IContains("coffee".to_string()));
        match &q {
            Q::Filter { field, lookup } => {
                assert_eq!(field, "title");
                assert_eq!(*lookup, Lookup::IContains("coffee".to_string()));
            }
            _ => panic!("Expected Filter"),
        }
    }

    #[test]
    fn test_and_operator() {
        let q1 = Q::filter("inventory", Lookup::Lt(Value::from(10)));
        let q2 = Q::filter("unit_price", Lookup::Lt(Value::from(20)));
        let combined = q1 & q2;
        match &combined {
            Q::And(children) => assert_eq!(children.len(), 2),
            _ => panic!("Expected And"),
        }
    }

    #[test]
    fn test_or_operator() {
        let q1 = Q::filter("inventory", Lookup::Lt(Value::from(10)));
        let q2 = Q::filter("unit_price", Lookup::Lt(Value::from(20)));
        let combined = q1 | q2;
        match &combined {
            Q::Or(children) => assert_eq!(children.len(), 2),
            _ => panic!("Expected Or"),
        }
    }

    #[test]
    fn test_not_operator() {
        let q = Q::filter("unit_price", Lookup::Lt(Value::from(20)));
        let negated = !q;
        match &negated {
            Q::Not(inner) => match inner.as_ref() {
                Q::Filter { field, .. } => assert_eq!(field, "unit_price"),
                _ => panic!("Expected Filter inside Not"),
            },
            _ => panic!("Expected Not"),
        }
    }

    #[test]
    fn test_double_negation() {
        let q = Q::filter("inventory", Lookup::Gt(Value::from(0)));
        let double_neg = !!q.clone();
        assert_eq!(double_neg, q);
    }

    #[test]
    fn test_and_flattening() {
        let q1 = Q::filter("a", Lookup::Exact(Value::from(1)));
        let q2 = Q::filter("b", Lookup::Exact(Value::from(2)));
        let q3 = Q::filter("c", Lookup::Exact(Value::from(3)));
        let combined = (q1 & q2) & q3;
        match &combined {
            Q::And(children) => assert_eq!(children.len(), 3),
            _ => panic!("Expected And with 3 children"),
        }
    }

    #[test]
    fn test_or_flattening() {
        let q1 = Q::filter("a", Lookup::Exact(Value::from(1)));
        let q2 = Q::filter("b", Lookup::Exact(Value::from(2)));
        let q3 = Q::filter("c", Lookup::Exact(Value::from(3)));
        let combined = (q1 | q2) | q3;
        match &combined {
            Q::Or(children) => assert_eq!(children.len(), 3),
            _ => panic!("Expected Or with 3 children"),
        }
    }

    #[test]
    fn test_and_not_combination() {
        // inventory < 10 AND NOT(unit_price < 20)
        let combined = Q::filter("inventory", Lookup::Lt(Value::from(10)))
            & !Q::filter("unit_price", Lookup::Lt(Value::from(20)));
        match &combined {
            Q::And(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(&children[1], Q::Not(_)));
            }
            _ => panic!("Expected And"),
        }
    }

    #[test]
    fn test_field_comparison_lookup() {
        let q = Q::filter("inventory", Lookup::ExactField("unit_price".to_string()));
        assert!(matches!(
            q,
            Q::Filter {
                lookup: Lookup::ExactField(_),
                ..
            }
        ));
    }

    #[test]
    fn test_q_is_empty() {
        assert!(Q::And(vec![]).is_empty());
        assert!(Q::Or(vec![]).is_empty());
        assert!(!Q::filter("x", Lookup::Exact(Value::from(1))).is_empty());
    }
}
