use std::sync::Arc;

use tradepost_core::{Marketplace, ReferenceLists};

use crate::config::Config;
use crate::middleware::RateLimiter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<Marketplace>,
    pub reference: Arc<ReferenceLists>,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(market: Marketplace, reference: ReferenceLists, config: &Config) -> Self {
        Self {
            market: Arc::new(market),
            reference: Arc::new(reference),
            login_limiter: Arc::new(RateLimiter::new(config.login_attempts, config.login_window)),
        }
    }
}
