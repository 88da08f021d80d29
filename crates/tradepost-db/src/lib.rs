//! Tradepost DB - redb implementation of the document store.

pub mod document_store;
pub mod tables;

pub use document_store::RedbDocumentStore;

use std::path::Path;
use std::sync::Arc;

use redb::backends::InMemoryBackend;
use redb::Database;

use tradepost_core::StorageError;

/// Open (or create) a database file with all required tables.
pub fn init_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;
    RedbDocumentStore::init_tables(&db)?;
    Ok(Arc::new(db))
}

/// Create a database that lives only in memory.
pub fn init_in_memory() -> Result<Arc<Database>, StorageError> {
    let db = Database::builder()
        .create_with_backend(InMemoryBackend::new())
        .map_err(|e| StorageError::Database(e.to_string()))?;
    RedbDocumentStore::init_tables(&db)?;
    Ok(Arc::new(db))
}
