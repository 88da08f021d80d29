use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{CatalogItem, CatalogItemId};
use crate::error::MarketError;
use crate::session::Identity;
use crate::user::{PublicUser, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub Uuid);

impl ListingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rolled modifier on a listed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModRoll {
    pub name: String,
    pub val1: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val2: Option<f64>,
}

/// A sale posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub catalog_item_id: CatalogItemId,
    pub seller_id: UserId,
    pub rarity: String,
    pub price: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub list_date: DateTime<Utc>,
    #[serde(default)]
    pub mods: Vec<ModRoll>,
}

/// The replaceable part of a listing, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub catalog_item_id: CatalogItemId,
    pub rarity: String,
    pub price: f64,
    pub mods: Vec<ModRoll>,
}

/// Client input for creating or editing a listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    pub catalog_item_id: Option<CatalogItemId>,
    pub rarity: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub mods: Vec<ModRoll>,
}

impl Listing {
    /// A new listing owned by `seller`, dated `now`.
    pub fn create(draft: ListingDraft, seller: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: ListingId::new(),
            catalog_item_id: draft.catalog_item_id,
            seller_id: seller,
            rarity: draft.rarity,
            price: draft.price,
            list_date: now,
            mods: draft.mods,
        }
    }

    /// Fail with `NotSeller` unless `identity` posted this listing.
    pub fn ensure_seller(&self, identity: &Identity) -> Result<(), MarketError> {
        if self.seller_id != identity.id {
            return Err(MarketError::NotSeller);
        }
        Ok(())
    }

    /// Replace the editable fields. Seller and list date are kept.
    pub fn apply(&mut self, draft: ListingDraft) {
        self.catalog_item_id = draft.catalog_item_id;
        self.rarity = draft.rarity;
        self.price = draft.price;
        self.mods = draft.mods;
    }
}

/// A listing together with its joined seller and catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(default)]
    pub seller: Option<PublicUser>,
    #[serde(default)]
    pub item: Option<CatalogItem>,
}
