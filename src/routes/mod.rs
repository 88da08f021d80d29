pub mod auth;
pub mod health;
pub mod items;
pub mod listings;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(auth::routes())
        .merge(items::routes())
        .merge(listings::routes())
        .merge(health::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
