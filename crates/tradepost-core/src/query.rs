//! Compiles listing filters into aggregation stages.
//!
//! The stage order is fixed: id match, seller join, seller-name match, sort,
//! item join, item/rarity membership, price range, then one stage per mod
//! filter. Matches on `seller.*` and `item.*` only work after their joins.

use std::str::FromStr;

use serde::Deserialize;
use uuid::Uuid;

use crate::document::Collection;
use crate::error::ValidationError;
use crate::filter::Filter;
use crate::listing::ListingId;
use crate::pipeline::{Lookup, SortDirection, Stage};

/// Document field names the compiler refers to.
pub mod fields {
    pub const ID: &str = "id";
    pub const SELLER_ID: &str = "sellerId";
    pub const CATALOG_ITEM_ID: &str = "catalogItemId";
    pub const SELLER: &str = "seller";
    pub const SELLER_USERNAME: &str = "seller.username";
    pub const ITEM: &str = "item";
    pub const ITEM_NAME: &str = "item.name";
    pub const ITEM_TYPE: &str = "item.type";
    pub const RARITY: &str = "rarity";
    pub const PRICE: &str = "price";
    pub const LIST_DATE: &str = "listDate";
    pub const MODS: &str = "mods";
    pub const MOD_NAME: &str = "name";
    pub const MOD_VAL1: &str = "val1";
    pub const PASSWORD_DIGEST: &str = "passwordDigest";
}

/// Fields a client may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    ListDate,
    Rarity,
    SellerName,
}

impl SortField {
    pub fn path(self) -> &'static str {
        match self {
            SortField::Price => fields::PRICE,
            SortField::ListDate => fields::LIST_DATE,
            SortField::Rarity => fields::RARITY,
            SortField::SellerName => fields::SELLER_USERNAME,
        }
    }
}

impl FromStr for SortField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(SortField::Price),
            "listDate" => Ok(SortField::ListDate),
            "rarity" => Ok(SortField::Rarity),
            "sellerName" | "seller.username" => Ok(SortField::SellerName),
            other => Err(ValidationError::UnsortableField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn direction(self) -> SortDirection {
        match self {
            SortOrder::Asc => SortDirection::Ascending,
            SortOrder::Desc => SortDirection::Descending,
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// Matches listings carrying a mod `name` whose first value is within bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModFilter {
    pub name: String,
    #[serde(default)]
    pub val1: Option<f64>,
    #[serde(default)]
    pub val2: Option<f64>,
}

/// Raw browse parameters as a client sends them. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQueryParams {
    pub ids: Option<Vec<String>>,
    pub seller_name: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub item_names: Option<Vec<String>>,
    pub item_types: Option<Vec<String>>,
    pub rarities: Option<Vec<String>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub mods: Option<Vec<ModFilter>>,
}

/// Validated browse filters. Empty lists mean "no filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub ids: Vec<ListingId>,
    pub seller_name: Option<String>,
    pub sort: Option<(SortField, SortOrder)>,
    pub item_names: Vec<String>,
    pub item_types: Vec<String>,
    pub rarities: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub mods: Vec<ModFilter>,
}

impl ListingQueryParams {
    /// Validate and normalise into a [`ListingQuery`].
    ///
    /// A sort field without an order, or an order without a field, yields no
    /// sort; a field or order outside the allowed set is rejected.
    pub fn into_query(self) -> Result<ListingQuery, ValidationError> {
        let ids = self
            .ids
            .unwrap_or_default()
            .iter()
            .map(|s| {
                Uuid::parse_str(s.trim())
                    .map(ListingId)
                    .map_err(|_| ValidationError::InvalidId(s.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sort_field = self.sort_field.as_deref().map(str::parse::<SortField>).transpose()?;
        let sort_order = self.sort_order.as_deref().map(str::parse::<SortOrder>).transpose()?;
        let sort = sort_field.zip(sort_order);

        let mods = self.mods.unwrap_or_default();
        if let Some(bad) = mods.iter().find(|m| m.name.trim().is_empty()) {
            return Err(ValidationError::InvalidModFilter(format!(
                "mod filter without a name ({:?}..{:?})",
                bad.val1, bad.val2
            )));
        }

        Ok(ListingQuery {
            ids,
            seller_name: self.seller_name.filter(|s| !s.is_empty()),
            sort,
            item_names: self.item_names.unwrap_or_default(),
            item_types: self.item_types.unwrap_or_default(),
            rarities: self.rarities.unwrap_or_default(),
            min_price: self.min_price,
            max_price: self.max_price,
            mods,
        })
    }
}

/// Join that embeds the seller, without the password digest.
pub fn seller_join() -> Stage {
    Stage::Lookup(Lookup {
        from: Collection::Users,
        local_field: fields::SELLER_ID.to_string(),
        foreign_field: fields::ID.to_string(),
        as_field: fields::SELLER.to_string(),
        exclude: vec![fields::PASSWORD_DIGEST.to_string()],
    })
}

/// Join that embeds the catalog item a listing refers to.
pub fn item_join() -> Stage {
    Stage::Lookup(Lookup {
        from: Collection::CatalogItems,
        local_field: fields::CATALOG_ITEM_ID.to_string(),
        foreign_field: fields::ID.to_string(),
        as_field: fields::ITEM.to_string(),
        exclude: Vec::new(),
    })
}

/// Stages for the plain listing feed: newest first, item embedded.
pub fn recent_listings() -> Vec<Stage> {
    vec![
        Stage::sort(fields::LIST_DATE, SortDirection::Descending),
        item_join(),
    ]
}

/// Compile browse filters into an ordered stage list.
pub fn compile(query: &ListingQuery) -> Vec<Stage> {
    let mut stages = Vec::new();

    if !query.ids.is_empty() {
        let ids = query.ids.iter().map(|id| id.to_string());
        stages.push(Stage::Match(Filter::is_in(fields::ID, ids)));
    }

    stages.push(seller_join());

    if let Some(name) = &query.seller_name {
        stages.push(Stage::Match(Filter::eq(fields::SELLER_USERNAME, name.as_str())));
    }

    if let Some((field, order)) = query.sort {
        stages.push(Stage::sort(field.path(), order.direction()));
    }

    stages.push(item_join());

    for (field, values) in [
        (fields::ITEM_NAME, &query.item_names),
        (fields::ITEM_TYPE, &query.item_types),
        (fields::RARITY, &query.rarities),
    ] {
        if !values.is_empty() {
            stages.push(Stage::Match(Filter::is_in(field, values.iter().cloned())));
        }
    }

    if query.min_price.is_some() || query.max_price.is_some() {
        stages.push(Stage::Match(Filter::range(
            fields::PRICE,
            query.min_price,
            query.max_price,
        )));
    }

    for m in &query.mods {
        stages.push(Stage::Match(mod_filter(m)));
    }

    stages
}

fn mod_filter(m: &ModFilter) -> Filter {
    let name = Filter::eq(fields::MOD_NAME, m.name.as_str());
    let inner = if m.val1.is_some() || m.val2.is_some() {
        Filter::And(vec![name, Filter::range(fields::MOD_VAL1, m.val1, m.val2)])
    } else {
        name
    };
    Filter::elem_match(fields::MODS, inner)
}
