use std::sync::Arc;

use crate::auth::Accounts;
use crate::catalog::{CatalogItem, CatalogItemId, NewCatalogItem};
use crate::clock::Clock;
use crate::document::{from_document, to_document, Collection, Document};
use crate::error::MarketError;
use crate::listing::{Listing, ListingId, ListingRequest, ListingView};
use crate::query::{self, ListingQuery};
use crate::session::{Identity, SessionManager};
use crate::storage::DocumentStore;
use crate::user::Role;
use crate::validation::Validator;

/// The marketplace service: catalog, listings, browse, and the
/// account/session operations they depend on.
#[derive(Clone)]
pub struct Marketplace {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    sessions: SessionManager,
    accounts: Accounts,
}

impl Marketplace {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        let sessions = SessionManager::new(store.clone(), clock.clone());
        let accounts = Accounts::new(store.clone(), sessions.clone());
        Self {
            store,
            clock,
            sessions,
            accounts,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    /// Register a catalog item. Only admins may do this.
    pub fn create_catalog_item(
        &self,
        token: &str,
        input: NewCatalogItem,
    ) -> Result<CatalogItem, MarketError> {
        let identity = self.sessions.resolve_session(token)?;
        identity.require_role(Role::Admin)?;

        let item = Validator::validate_catalog_item(input)?;
        self.store.insert(
            Collection::CatalogItems,
            to_document(Collection::CatalogItems, &item)?,
        )?;
        tracing::info!("{} added catalog item {} ({})", identity.username, item.name, item.id);
        Ok(item)
    }

    pub fn catalog_items(&self) -> Result<Vec<CatalogItem>, MarketError> {
        decode_all(Collection::CatalogItems, self.store.all(Collection::CatalogItems)?)
    }

    fn ensure_catalog_item(&self, id: CatalogItemId) -> Result<(), MarketError> {
        match self.store.find_by_id(Collection::CatalogItems, id.0)? {
            Some(_) => Ok(()),
            None => Err(MarketError::NotFound("Catalog item", id.0)),
        }
    }

    /// Post a listing as the session holder.
    pub fn create_listing(&self, token: &str, req: ListingRequest) -> Result<Listing, MarketError> {
        let identity = self.sessions.resolve_session(token)?;
        let draft = Validator::validate_listing(req)?;
        self.ensure_catalog_item(draft.catalog_item_id)?;

        let listing = Listing::create(draft, identity.id, self.clock.now_millis());
        self.store.insert(
            Collection::Listings,
            to_document(Collection::Listings, &listing)?,
        )?;
        tracing::info!("{} listed {} at {}", identity.username, listing.id, listing.price);
        Ok(listing)
    }

    pub fn get_listing(&self, id: ListingId) -> Result<Listing, MarketError> {
        let doc = self
            .store
            .find_by_id(Collection::Listings, id.0)?
            .ok_or(MarketError::NotFound("Listing", id.0))?;
        Ok(from_document(Collection::Listings, doc)?)
    }

    /// Load a listing the identity is allowed to change.
    fn owned_listing(&self, identity: &Identity, id: ListingId) -> Result<Listing, MarketError> {
        let listing = self.get_listing(id)?;
        listing.ensure_seller(identity)?;
        Ok(listing)
    }

    /// Replace a listing's item, rarity, price, and mods. Seller only.
    pub fn edit_listing(
        &self,
        token: &str,
        id: ListingId,
        req: ListingRequest,
    ) -> Result<Listing, MarketError> {
        let identity = self.sessions.resolve_session(token)?;
        let mut listing = self.owned_listing(&identity, id)?;

        let draft = Validator::validate_listing(req)?;
        self.ensure_catalog_item(draft.catalog_item_id)?;
        listing.apply(draft);

        let stored = self
            .store
            .find_by_id_and_update(
                Collection::Listings,
                id.0,
                to_document(Collection::Listings, &listing)?,
            )?
            .ok_or(MarketError::NotFound("Listing", id.0))?;
        tracing::info!("{} edited listing {}", identity.username, id);
        Ok(from_document(Collection::Listings, stored)?)
    }

    /// Remove a listing for good. Seller only.
    pub fn delete_listing(&self, token: &str, id: ListingId) -> Result<Listing, MarketError> {
        let identity = self.sessions.resolve_session(token)?;
        self.owned_listing(&identity, id)?;

        let removed = self
            .store
            .find_by_id_and_delete(Collection::Listings, id.0)?
            .ok_or(MarketError::NotFound("Listing", id.0))?;
        tracing::info!("{} removed listing {}", identity.username, id);
        Ok(from_document(Collection::Listings, removed)?)
    }

    /// Every listing, newest first, with its catalog item.
    pub fn recent_listings(&self) -> Result<Vec<ListingView>, MarketError> {
        let docs = self
            .store
            .aggregate(Collection::Listings, &query::recent_listings())?;
        decode_all(Collection::Listings, docs)
    }

    /// Listings matching the browse filters, with seller and item joined.
    pub fn browse(&self, filters: &ListingQuery) -> Result<Vec<ListingView>, MarketError> {
        let stages = query::compile(filters);
        tracing::debug!("Browsing listings with {} stages", stages.len());
        let docs = self.store.aggregate(Collection::Listings, &stages)?;
        decode_all(Collection::Listings, docs)
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(
    collection: Collection,
    docs: Vec<Document>,
) -> Result<Vec<T>, MarketError> {
    docs.into_iter()
        .map(|doc| from_document(collection, doc).map_err(MarketError::from))
        .collect()
}
