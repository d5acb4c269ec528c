//! Filter types for splitting one data source into small multiples
//!
//! A [`FilterQuery`] is an ordered set of `column == value` conditions. Group
//! expansion produces one per plot, and every tile applies its own before any
//! aggregation happens.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use polars::prelude::{lit, AnyValue, Expr};
use serde::{Deserialize, Serialize};

/// Equality filter: column name -> value, in insertion order
pub type FilterQuery = IndexMap<String, FilterValue>;

/// A scalar taken from a data frame cell
///
/// Serializes as a bare JSON scalar so project files read naturally
/// (`{"species": "A", "dose": 10}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FilterValue {
    /// Convert a polars cell into a filter value.
    ///
    /// Nulls and NaN have no equality semantics and yield `None`. Types without
    /// a direct counterpart (dates, durations, ...) fall back to their display
    /// string.
    pub fn from_any_value(value: &AnyValue) -> Option<Self> {
        match value {
            AnyValue::Null => None,
            AnyValue::Boolean(b) => Some(FilterValue::Bool(*b)),
            AnyValue::Int8(v) => Some(FilterValue::Int(*v as i64)),
            AnyValue::Int16(v) => Some(FilterValue::Int(*v as i64)),
            AnyValue::Int32(v) => Some(FilterValue::Int(*v as i64)),
            AnyValue::Int64(v) => Some(FilterValue::Int(*v)),
            AnyValue::UInt8(v) => Some(FilterValue::Int(*v as i64)),
            AnyValue::UInt16(v) => Some(FilterValue::Int(*v as i64)),
            AnyValue::UInt32(v) => Some(FilterValue::Int(*v as i64)),
            AnyValue::UInt64(v) => Some(FilterValue::Int(*v as i64)),
            AnyValue::Float32(v) if !v.is_nan() => Some(FilterValue::Float(*v as f64)),
            AnyValue::Float64(v) if !v.is_nan() => Some(FilterValue::Float(*v)),
            AnyValue::Float32(_) | AnyValue::Float64(_) => None,
            AnyValue::String(s) => Some(FilterValue::Str(s.to_string())),
            AnyValue::StringOwned(s) => Some(FilterValue::Str(s.to_string())),
            other => {
                tracing::debug!("Using display string for filter value {:?}", other);
                Some(FilterValue::Str(other.to_string()))
            }
        }
    }

    /// Literal expression for an equality predicate
    pub fn to_lit(&self) -> Expr {
        match self {
            FilterValue::Bool(b) => lit(*b),
            FilterValue::Int(i) => lit(*i),
            FilterValue::Float(f) => lit(*f),
            FilterValue::Str(s) => lit(s.as_str()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            FilterValue::Int(i) => Some(*i as f64),
            FilterValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FilterValue::Bool(_) => 0,
            FilterValue::Int(_) | FilterValue::Float(_) => 1,
            FilterValue::Str(_) => 2,
        }
    }

    /// Natural ordering: booleans, then numbers by value, then strings.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FilterValue::Bool(a), FilterValue::Bool(b)) => a.cmp(b),
            (FilterValue::Str(a), FilterValue::Str(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.rank().cmp(&b.rank()),
            },
        }
    }
}

/// Formats the way group labels are shown in legends and titles:
/// `True`, `3`, `2.5`, `1.0`, `A`.
impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(true) => write!(f, "True"),
            FilterValue::Bool(false) => write!(f, "False"),
            FilterValue::Int(i) => write!(f, "{}", i),
            FilterValue::Float(v) => write!(f, "{:?}", v),
            FilterValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Str(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Str(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

/// Render a filter as a plot title: `species=A, treatment=X`
pub fn filter_title(filter: &FilterQuery) -> Option<String> {
    if filter.is_empty() {
        return None;
    }
    Some(
        filter
            .iter()
            .map(|(column, value)| format!("{}={}", column, value))
            .collect::<Vec<_>>()
            .join(", "),
    )
}
