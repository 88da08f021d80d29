use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradepost::{create_router, load_reference_lists, AppState, Config};
use tradepost_core::{Marketplace, SystemClock};
use tradepost_db::{init_database, RedbDocumentStore};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: TRADEPOST_LISTEN_ADDR, TRADEPOST_DB_PATH, TRADEPOST_REFERENCE_PATH");
            eprintln!("Optional pair: TRADEPOST_ADMIN_USERNAME, TRADEPOST_ADMIN_PASSWORD");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Tradepost server");
    tracing::info!("Listen address: {}", config.listen_addr);
    tracing::info!("Database path: {}", config.db_path.display());

    // Initialize database
    let db = match init_database(&config.db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Database error: {}", e);
            std::process::exit(1);
        }
    };

    let market = Marketplace::new(Arc::new(RedbDocumentStore::new(db)), Arc::new(SystemClock));

    if let Some(admin) = &config.admin {
        if let Err(e) = market.accounts().ensure_admin(&admin.username, &admin.password) {
            eprintln!("Admin bootstrap error: {}", e);
            std::process::exit(1);
        }
    }

    let reference = load_reference_lists(&config.reference_path);
    tracing::info!(
        "Loaded reference lists: {} rarities, {} types, {} stats, {} mods",
        reference.rarity.len(),
        reference.types.len(),
        reference.stats.len(),
        reference.mods.len()
    );

    let state = AppState::new(market, reference, &config);

    // Forget stale login attempts
    let limiter = state.login_limiter.clone();
    let window = config.login_window;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(window.max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server running at http://{}", config.listen_addr);

    axum::serve(listener, app).await.expect("Server error");
}
