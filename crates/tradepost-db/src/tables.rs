use redb::TableDefinition;

use tradepost_core::Collection;

/// Table for storing users.
/// Key: user UUID as bytes
/// Value: JSON document as bytes
pub const USERS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("users");

/// Table for storing sessions, at most one per username.
pub const SESSIONS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("sessions");

/// Table for storing catalog item templates.
pub const CATALOG_ITEMS_TABLE: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("catalog_items");

/// Table for storing listings.
pub const LISTINGS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("listings");

/// The table backing a collection.
pub fn table_for(collection: Collection) -> TableDefinition<'static, &'static [u8], &'static [u8]> {
    match collection {
        Collection::Users => USERS_TABLE,
        Collection::Sessions => SESSIONS_TABLE,
        Collection::CatalogItems => CATALOG_ITEMS_TABLE,
        Collection::Listings => LISTINGS_TABLE,
    }
}
