//! Staged aggregation: an ordered list of stages run over one collection.
//!
//! Stages run strictly in order. A stage that reads a field produced by a
//! [`Lookup`] must come after that lookup, or the field will not exist yet.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use crate::document::{lookup_path, Collection, Document};
use crate::error::StorageError;
use crate::filter::Filter;
use crate::storage::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Join against another collection, embedding the first matching document.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: Collection,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
    /// Fields stripped from the joined document before embedding.
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Lookup(Lookup),
    Sort {
        field: String,
        direction: SortDirection,
    },
}

impl Stage {
    pub fn sort(field: impl Into<String>, direction: SortDirection) -> Self {
        Stage::Sort {
            field: field.into(),
            direction,
        }
    }

    fn apply<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        mut docs: Vec<Document>,
    ) -> Result<Vec<Document>, StorageError> {
        match self {
            Stage::Match(filter) => {
                docs.retain(|doc| filter.matches(doc));
                Ok(docs)
            }
            Stage::Lookup(lookup) => {
                let foreign = index_by_field(store.all(lookup.from)?, &lookup.foreign_field);
                for doc in docs.iter_mut() {
                    let joined = lookup_path(doc, &lookup.local_field)
                        .and_then(key_of)
                        .and_then(|key| foreign.get(&key))
                        .map(|found| strip_fields(found.clone(), &lookup.exclude))
                        .unwrap_or(Value::Null);
                    if let Value::Object(map) = doc {
                        map.insert(lookup.as_field.clone(), joined);
                    }
                }
                Ok(docs)
            }
            Stage::Sort { field, direction } => {
                docs.sort_by(|a, b| {
                    let ord = compare_values(lookup_path(a, field), lookup_path(b, field));
                    match direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                });
                Ok(docs)
            }
        }
    }
}

/// Run `stages` in order over every document of `collection`.
pub fn execute<S: DocumentStore + ?Sized>(
    store: &S,
    collection: Collection,
    stages: &[Stage],
) -> Result<Vec<Document>, StorageError> {
    let mut docs = store.all(collection)?;
    for stage in stages {
        docs = stage.apply(store, docs)?;
    }
    Ok(docs)
}

/// Index foreign documents by the join field, keeping the first per key.
fn index_by_field(docs: Vec<Document>, field: &str) -> HashMap<String, Document> {
    let mut index = HashMap::new();
    for doc in docs {
        if let Some(key) = lookup_path(&doc, field).and_then(key_of) {
            index.entry(key).or_insert(doc);
        }
    }
    index
}

fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn strip_fields(mut doc: Document, exclude: &[String]) -> Document {
    if let Value::Object(map) = &mut doc {
        for field in exclude {
            map.remove(field);
        }
    }
    doc
}

/// Missing and null sort first, then booleans, numbers, strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
