use std::path::Path;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use tradepost_core::{CatalogItem, NewCatalogItem, ReferenceLists};

use crate::error::ApiError;
use crate::extract::{BearerToken, JsonBody};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items/attr", get(get_reference_lists))
        .route("/items", get(get_items).post(create_item))
}

/// GET /items/attr - Lists used to build item and listing forms.
async fn get_reference_lists(State(state): State<AppState>) -> Json<ReferenceLists> {
    Json(state.reference.as_ref().clone())
}

/// GET /items - Every catalog item.
async fn get_items(State(state): State<AppState>) -> Result<Json<Vec<CatalogItem>>, ApiError> {
    Ok(Json(state.market.catalog_items()?))
}

/// POST /items - Register a catalog item (admin only).
async fn create_item(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    JsonBody(input): JsonBody<NewCatalogItem>,
) -> Result<(StatusCode, Json<CatalogItem>), ApiError> {
    let item = state.market.create_catalog_item(&token, input)?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Load reference lists from a JSON file, falling back to the built-in lists.
pub fn load_reference_lists(path: &Path) -> ReferenceLists {
    if path.exists() {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(lists) => return lists,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
            }
        }
    }

    ReferenceLists::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let lists = load_reference_lists(Path::new("/nonexistent/reference.json"));
        assert_eq!(lists, ReferenceLists::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("tradepost-ref-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"rarity":["plain"],"types":["wand"],"stats":["range"],"mods":["frost"]}"#,
        )
        .unwrap();

        let lists = load_reference_lists(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(lists.rarity, vec!["plain".to_string()]);
        assert_eq!(lists.mods, vec!["frost".to_string()]);
    }

    #[test]
    fn test_load_malformed_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("tradepost-ref-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not json").unwrap();

        let lists = load_reference_lists(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(lists, ReferenceLists::default());
    }
}
