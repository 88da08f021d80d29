use std::sync::Arc;

use redb::{Database, ReadableTable, Table};
use uuid::Uuid;

use tradepost_core::document::{document_id, set_document_id};
use tradepost_core::{Collection, Document, DocumentStore, Filter, StorageError, UpdateOutcome};

use crate::tables::table_for;

type DocumentTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

fn db_err(e: impl ToString) -> StorageError {
    StorageError::Database(e.to_string())
}

fn decode(collection: Collection, bytes: &[u8]) -> Result<Document, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Malformed(collection.name(), e.to_string()))
}

fn encode(collection: Collection, doc: &Document) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(doc).map_err(|e| StorageError::Malformed(collection.name(), e.to_string()))
}

/// redb implementation of DocumentStore.
///
/// Each collection lives in its own table keyed by the document id.
/// Every mutating call runs in a single write transaction.
pub struct RedbDocumentStore {
    db: Arc<Database>,
}

impl RedbDocumentStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Initialize the database tables.
    pub fn init_tables(db: &Database) -> Result<(), StorageError> {
        let write_txn = db.begin_write().map_err(db_err)?;
        for collection in Collection::ALL {
            write_txn.open_table(table_for(collection)).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    /// Run `f` against a collection's table and commit if it succeeds.
    fn write<T>(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut DocumentTable<'_>) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let result = {
            let mut table = write_txn.open_table(table_for(collection)).map_err(db_err)?;
            f(&mut table)?
        };
        write_txn.commit().map_err(db_err)?;
        Ok(result)
    }
}

fn first_match(
    collection: Collection,
    table: &DocumentTable<'_>,
    filter: &Filter,
) -> Result<Option<Uuid>, StorageError> {
    for entry in table.iter().map_err(db_err)? {
        let (key, value) = entry.map_err(db_err)?;
        let doc = decode(collection, value.value())?;
        if filter.matches(&doc) {
            let id = Uuid::from_slice(key.value())
                .map_err(|e| StorageError::Malformed(collection.name(), e.to_string()))?;
            return Ok(Some(id));
        }
    }
    Ok(None)
}

impl DocumentStore for RedbDocumentStore {
    fn all(&self, collection: Collection) -> Result<Vec<Document>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(table_for(collection)).map_err(db_err)?;

        let mut docs = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, value) = entry.map_err(db_err)?;
            docs.push(decode(collection, value.value())?);
        }
        Ok(docs)
    }

    fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(table_for(collection)).map_err(db_err)?;

        match table.get(id.as_bytes().as_slice()).map_err(db_err)? {
            Some(value) => Ok(Some(decode(collection, value.value())?)),
            None => Ok(None),
        }
    }

    fn insert(&self, collection: Collection, doc: Document) -> Result<Uuid, StorageError> {
        let id = document_id(collection, &doc)?;
        let value = encode(collection, &doc)?;

        self.write(collection, |table| {
            let key = id.as_bytes().as_slice();
            if table.get(key).map_err(db_err)?.is_some() {
                return Err(StorageError::Duplicate(collection.name(), id));
            }
            table.insert(key, value.as_slice()).map_err(db_err)?;
            Ok(id)
        })
    }

    fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        mut doc: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError> {
        self.write(collection, |table| {
            let (id, outcome) = match first_match(collection, table, filter)? {
                Some(id) => {
                    set_document_id(&mut doc, id);
                    (
                        id,
                        UpdateOutcome {
                            matched: Some(id),
                            upserted: None,
                        },
                    )
                }
                None if upsert => {
                    let id = document_id(collection, &doc)?;
                    (
                        id,
                        UpdateOutcome {
                            matched: None,
                            upserted: Some(id),
                        },
                    )
                }
                None => {
                    return Ok(UpdateOutcome {
                        matched: None,
                        upserted: None,
                    })
                }
            };

            let value = encode(collection, &doc)?;
            table
                .insert(id.as_bytes().as_slice(), value.as_slice())
                .map_err(db_err)?;
            Ok(outcome)
        })
    }

    fn find_by_id_and_update(
        &self,
        collection: Collection,
        id: Uuid,
        mut doc: Document,
    ) -> Result<Option<Document>, StorageError> {
        set_document_id(&mut doc, id);
        let value = encode(collection, &doc)?;

        self.write(collection, |table| {
            let key = id.as_bytes().as_slice();
            if table.get(key).map_err(db_err)?.is_none() {
                return Ok(None);
            }
            table.insert(key, value.as_slice()).map_err(db_err)?;
            Ok(Some(doc))
        })
    }

    fn find_by_id_and_delete(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StorageError> {
        self.write(collection, |table| {
            let removed = table.remove(id.as_bytes().as_slice()).map_err(db_err)?;
            match removed {
                Some(value) => Ok(Some(decode(collection, value.value())?)),
                None => Ok(None),
            }
        })
    }
}
