use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::StorageError;

/// A stored record: a JSON object with an `id` field.
pub type Document = Value;

/// The four record collections of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Sessions,
    CatalogItems,
    Listings,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Users,
        Collection::Sessions,
        Collection::CatalogItems,
        Collection::Listings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Sessions => "sessions",
            Collection::CatalogItems => "catalog_items",
            Collection::Listings => "listings",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve a dotted path such as `seller.username` inside a document.
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, key| current.get(key))
}

/// Read the `id` field of a document.
pub fn document_id(collection: Collection, doc: &Value) -> Result<Uuid, StorageError> {
    doc.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| StorageError::Malformed(collection.name(), "missing or invalid id".into()))
}

/// Overwrite the `id` field of a document.
pub fn set_document_id(doc: &mut Value, id: Uuid) {
    if let Value::Object(map) = doc {
        map.insert("id".to_string(), Value::String(id.to_string()));
    }
}

pub fn to_document<T: Serialize>(collection: Collection, value: &T) -> Result<Document, StorageError> {
    serde_json::to_value(value).map_err(|e| StorageError::Malformed(collection.name(), e.to_string()))
}

pub fn from_document<T: DeserializeOwned>(
    collection: Collection,
    doc: Document,
) -> Result<T, StorageError> {
    serde_json::from_value(doc).map_err(|e| StorageError::Malformed(collection.name(), e.to_string()))
}
