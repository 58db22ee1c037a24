//! Query surface shared by the record store and the link filter normalizer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Snapshot;

/// A single `[attribute, operator, operand]` constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, String, Value)", into = "(String, String, Value)")]
pub struct Filter {
    /// The attribute to test.
    pub attribute: String,
    /// The operator, e.g. `=` or `is_a`.
    pub operator: String,
    /// The right-hand side.
    pub operand: Value,
}

impl Filter {
    /// Equality.
    pub const EQ: &'static str = "=";
    /// Inequality.
    pub const NE: &'static str = "!=";
    /// Membership in a list.
    pub const IN: &'static str = "in";
    /// Non-membership in a list.
    pub const NOT_IN: &'static str = "not in";
    /// The UUID in the attribute refers to a record of the given kind(s).
    pub const IS_A: &'static str = "is_a";

    /// Creates a new filter.
    #[must_use]
    pub fn new(
        attribute: impl Into<String>,
        operator: impl Into<String>,
        operand: impl Into<Value>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            operator: operator.into(),
            operand: operand.into(),
        }
    }

    /// Creates an `is_a` filter.
    #[must_use]
    pub fn is_a(attribute: impl Into<String>, kind: impl Into<Value>) -> Self {
        Self::new(attribute, Self::IS_A, kind)
    }
}

impl From<(String, String, Value)> for Filter {
    fn from((attribute, operator, operand): (String, String, Value)) -> Self {
        Self {
            attribute,
            operator,
            operand,
        }
    }
}

impl From<Filter> for (String, String, Value) {
    fn from(filter: Filter) -> Self {
        (filter.attribute, filter.operator, filter.operand)
    }
}

/// A list query: structured filters plus an attribute-equality `where` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Structured filters, all of which must hold.
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Attribute equality constraints.
    #[serde(rename = "where", default)]
    pub where_clause: Snapshot,
}

impl RecordQuery {
    /// Creates an empty query that matches every readable record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a `where` equality constraint.
    #[must_use]
    pub fn with_where(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_clause.insert(attribute.into(), value.into());
        self
    }
}
