use serde_json::Value;

use crate::document::lookup_path;

/// A predicate over a document, evaluated against dotted field paths.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value. An array field matches if any element equals it.
    Eq { field: String, value: Value },
    /// Field is one of the values.
    In { field: String, values: Vec<Value> },
    /// Numeric field lies within the inclusive bounds; an absent bound is open.
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Array field has at least one element matching the inner filter.
    ElemMatch { field: String, filter: Box<Filter> },
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Filter::Range {
            field: field.into(),
            min,
            max,
        }
    }

    pub fn elem_match(field: impl Into<String>, filter: Filter) -> Self {
        Filter::ElemMatch {
            field: field.into(),
            filter: Box::new(filter),
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Eq { field, value } => match lookup_path(doc, field) {
                Some(Value::Array(items)) if !value.is_array() => items.contains(value),
                Some(found) => values_equal(found, value),
                None => value.is_null(),
            },
            Filter::In { field, values } => match lookup_path(doc, field) {
                Some(found) => values.iter().any(|v| values_equal(found, v)),
                None => false,
            },
            Filter::Range { field, min, max } => {
                match lookup_path(doc, field).and_then(Value::as_f64) {
                    Some(n) => min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi),
                    None => false,
                }
            }
            Filter::ElemMatch { field, filter } => match lookup_path(doc, field) {
                Some(Value::Array(items)) => items.iter().any(|item| filter.matches(item)),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

/// Equality that treats `5` and `5.0` as the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
