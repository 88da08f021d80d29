use uuid::Uuid;

use crate::document::{Collection, Document};
use crate::error::StorageError;
use crate::filter::Filter;
use crate::pipeline::{self, Stage};

/// Outcome of an `update_one` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Id of the existing document that was replaced.
    pub matched: Option<Uuid>,
    /// Id of the document inserted because nothing matched.
    pub upserted: Option<Uuid>,
}

impl UpdateOutcome {
    /// Whether the store confirmed that a document now holds the update.
    pub fn acknowledged(&self) -> bool {
        self.matched.is_some() || self.upserted.is_some()
    }
}

/// A document store holding the marketplace collections.
///
/// Each call is atomic with respect to a single document. Implementations
/// return documents of a collection in a stable order.
pub trait DocumentStore: Send + Sync {
    /// Every document of a collection.
    fn all(&self, collection: Collection) -> Result<Vec<Document>, StorageError>;

    /// Get a document by id.
    fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StorageError>;

    /// Insert a new document. Its `id` field must be set and unused.
    fn insert(&self, collection: Collection, doc: Document) -> Result<Uuid, StorageError>;

    /// Replace the first document matching `filter`, keeping its id.
    /// With `upsert`, insert `doc` as-is when nothing matches.
    fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        doc: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError>;

    /// Replace a document by id. Returns the stored document, or None if absent.
    fn find_by_id_and_update(
        &self,
        collection: Collection,
        id: Uuid,
        doc: Document,
    ) -> Result<Option<Document>, StorageError>;

    /// Delete a document by id. Returns the removed document, or None if absent.
    fn find_by_id_and_delete(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StorageError>;

    /// All documents matching `filter`.
    fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StorageError> {
        let mut docs = self.all(collection)?;
        docs.retain(|doc| filter.matches(doc));
        Ok(docs)
    }

    /// The first document matching `filter`.
    fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StorageError> {
        Ok(self
            .all(collection)?
            .into_iter()
            .find(|doc| filter.matches(doc)))
    }

    /// Run an aggregation pipeline over a collection.
    fn aggregate(&self, collection: Collection, stages: &[Stage]) -> Result<Vec<Document>, StorageError> {
        pipeline::execute(self, collection, stages)
    }
}

// In-memory implementation for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use crate::document::{document_id, set_document_id};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::RwLock;

    /// In-memory document store for testing.
    #[derive(Default)]
    pub struct InMemoryDocumentStore {
        collections: RwLock<HashMap<Collection, BTreeMap<Uuid, Document>>>,
    }

    impl InMemoryDocumentStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DocumentStore for InMemoryDocumentStore {
        fn all(&self, collection: Collection) -> Result<Vec<Document>, StorageError> {
            let collections = self.collections.read().unwrap();
            Ok(collections
                .get(&collection)
                .map(|docs| docs.values().cloned().collect())
                .unwrap_or_default())
        }

        fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StorageError> {
            let collections = self.collections.read().unwrap();
            Ok(collections.get(&collection).and_then(|docs| docs.get(&id)).cloned())
        }

        fn insert(&self, collection: Collection, doc: Document) -> Result<Uuid, StorageError> {
            let id = document_id(collection, &doc)?;
            let mut collections = self.collections.write().unwrap();
            let docs = collections.entry(collection).or_default();
            if docs.contains_key(&id) {
                return Err(StorageError::Duplicate(collection.name(), id));
            }
            docs.insert(id, doc);
            Ok(id)
        }

        fn update_one(
            &self,
            collection: Collection,
            filter: &Filter,
            mut doc: Document,
            upsert: bool,
        ) -> Result<UpdateOutcome, StorageError> {
            let mut collections = self.collections.write().unwrap();
            let docs = collections.entry(collection).or_default();

            let existing = docs
                .iter()
                .find(|(_, d)| filter.matches(d))
                .map(|(id, _)| *id);

            match existing {
                Some(id) => {
                    set_document_id(&mut doc, id);
                    docs.insert(id, doc);
                    Ok(UpdateOutcome {
                        matched: Some(id),
                        upserted: None,
                    })
                }
                None if upsert => {
                    let id = document_id(collection, &doc)?;
                    docs.insert(id, doc);
                    Ok(UpdateOutcome {
                        matched: None,
                        upserted: Some(id),
                    })
                }
                None => Ok(UpdateOutcome {
                    matched: None,
                    upserted: None,
                }),
            }
        }

        fn find_by_id_and_update(
            &self,
            collection: Collection,
            id: Uuid,
            mut doc: Document,
        ) -> Result<Option<Document>, StorageError> {
            let mut collections = self.collections.write().unwrap();
            let docs = collections.entry(collection).or_default();
            if !docs.contains_key(&id) {
                return Ok(None);
            }
            set_document_id(&mut doc, id);
            docs.insert(id, doc.clone());
            Ok(Some(doc))
        }

        fn find_by_id_and_delete(
            &self,
            collection: Collection,
            id: Uuid,
        ) -> Result<Option<Document>, StorageError> {
            let mut collections = self.collections.write().unwrap();
            Ok(collections
                .get_mut(&collection)
                .and_then(|docs| docs.remove(&id)))
        }
    }

}
