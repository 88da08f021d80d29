//! Tradepost Server - Axum HTTP layer over the marketplace service.

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use routes::create_router;
pub use routes::items::load_reference_lists;
pub use state::AppState;
