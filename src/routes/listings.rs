use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use tradepost_core::{
    Listing, ListingId, ListingQueryParams, ListingRequest, ListingView, ModFilter,
    ValidationError,
};

use crate::error::ApiError;
use crate::extract::{BearerToken, JsonBody, QueryParams};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(recent_listings).post(create_listing))
        .route("/listings/query", get(query_listings).post(query_listings_json))
        .route(
            "/listings/{id}",
            get(get_listing).patch(edit_listing).delete(delete_listing),
        )
}

/// Browse filters as they arrive in a query string.
///
/// Lists are comma separated. Mods are `name:val1:val2` entries where either
/// bound may be left empty, e.g. `mods=fire damage:5:10,life::`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQueryString {
    ids: Option<String>,
    seller_name: Option<String>,
    sort_field: Option<String>,
    sort_order: Option<String>,
    item_names: Option<String>,
    item_types: Option<String>,
    rarities: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    mods: Option<String>,
}

fn split_list(raw: Option<String>) -> Option<Vec<String>> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    })
}

fn parse_bound(raw: &str, entry: &str) -> Result<Option<f64>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ValidationError::InvalidModFilter(entry.to_string()))
}

fn parse_mod(entry: &str) -> Result<ModFilter, ValidationError> {
    let mut parts = entry.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim().to_string();
    let val1 = parse_bound(parts.next().unwrap_or_default(), entry)?;
    let val2 = parse_bound(parts.next().unwrap_or_default(), entry)?;
    Ok(ModFilter { name, val1, val2 })
}

impl TryFrom<ListingQueryString> for ListingQueryParams {
    type Error = ValidationError;

    fn try_from(raw: ListingQueryString) -> Result<Self, Self::Error> {
        let mods = split_list(raw.mods)
            .map(|entries| entries.iter().map(|e| parse_mod(e)).collect::<Result<Vec<_>, _>>())
            .transpose()?;

        Ok(ListingQueryParams {
            ids: split_list(raw.ids),
            seller_name: raw.seller_name,
            sort_field: raw.sort_field.filter(|s| !s.is_empty()),
            sort_order: raw.sort_order.filter(|s| !s.is_empty()),
            item_names: split_list(raw.item_names),
            item_types: split_list(raw.item_types),
            rarities: split_list(raw.rarities),
            min_price: raw.min_price,
            max_price: raw.max_price,
            mods,
        })
    }
}

fn parse_listing_id(raw: &str) -> Result<ListingId, ApiError> {
    Uuid::parse_str(raw)
        .map(ListingId)
        .map_err(|_| ValidationError::InvalidId(raw.to_string()).into())
}

/// GET /listings - Every listing, newest first.
async fn recent_listings(State(state): State<AppState>) -> Result<Json<Vec<ListingView>>, ApiError> {
    Ok(Json(state.market.recent_listings()?))
}

fn browse(state: &AppState, params: ListingQueryParams) -> Result<Json<Vec<ListingView>>, ApiError> {
    let query = params.into_query()?;
    Ok(Json(state.market.browse(&query)?))
}

/// GET /listings/query - Browse with query-string filters.
async fn query_listings(
    State(state): State<AppState>,
    QueryParams(raw): QueryParams<ListingQueryString>,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    browse(&state, raw.try_into()?)
}

/// POST /listings/query - Browse with a JSON filter body.
async fn query_listings_json(
    State(state): State<AppState>,
    JsonBody(params): JsonBody<ListingQueryParams>,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    browse(&state, params)
}

async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, ApiError> {
    let id = parse_listing_id(&id)?;
    Ok(Json(state.market.get_listing(id)?))
}

/// POST /listings - Post a listing as the session holder.
async fn create_listing(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    JsonBody(req): JsonBody<ListingRequest>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    let listing = state.market.create_listing(&token, req)?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// PATCH /listings/{id} - Replace item, rarity, price, and mods (seller only).
async fn edit_listing(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<ListingRequest>,
) -> Result<Json<Listing>, ApiError> {
    let id = parse_listing_id(&id)?;
    Ok(Json(state.market.edit_listing(&token, id, req)?))
}

/// DELETE /listings/{id} - Remove a listing (seller only). Returns what was removed.
async fn delete_listing(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<String>,
) -> Result<Json<Listing>, ApiError> {
    let id = parse_listing_id(&id)?;
    Ok(Json(state.market.delete_listing(&token, id)?))
}
