use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tradepost::{create_router, AppState, Config};
use tradepost_core::{ManualClock, Marketplace, ReferenceLists};
use tradepost_db::{init_in_memory, RedbDocumentStore};

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

/// Create a test app over an in-memory database with an `admin` account.
fn create_test_app_with(config: Config) -> TestApp {
    let db = init_in_memory().unwrap();
    let clock = Arc::new(ManualClock::default());
    let market = Marketplace::new(Arc::new(RedbDocumentStore::new(db)), clock.clone());
    market.accounts().ensure_admin("admin", "admin-pw").unwrap();

    let state = AppState::new(market, ReferenceLists::default(), &config);
    TestApp {
        router: create_router(state),
        clock,
    }
}

fn create_test_app() -> TestApp {
    create_test_app_with(Config::for_testing())
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    async fn signup(&self, username: &str) -> String {
        let (status, json) = self
            .send(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({ "username": username, "password": "pw" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", json);
        json["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        let (status, json) = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "username": "admin", "password": "admin-pw" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", json);
        json["token"].as_str().unwrap().to_string()
    }

    async fn create_item(&self, name: &str, item_type: &str) -> String {
        let token = self.admin_token().await;
        let (status, json) = self
            .send(
                Method::POST,
                "/items",
                Some(&token),
                Some(json!({ "name": name, "type": item_type, "icon": format!("{}.png", name) })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        json["id"].as_str().unwrap().to_string()
    }

    async fn create_listing(&self, token: &str, body: Value) -> Value {
        let (status, json) = self
            .send(Method::POST, "/listings", Some(token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        json
    }
}

fn prices(listings: &Value) -> Vec<f64> {
    listings
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["price"].as_f64().unwrap())
        .collect()
}

// ============================================================================
// Health and reference data
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = create_test_app();

    for uri in ["/health", "/ready"] {
        let (status, json) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "status": "ok" }));
    }
}

#[tokio::test]
async fn test_reference_lists() {
    let app = create_test_app();

    let (status, json) = app.get("/items/attr").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::to_value(ReferenceLists::default()).unwrap());
}

// ============================================================================
// Accounts and sessions
// ============================================================================

#[tokio::test]
async fn test_signup_login_and_session_check() {
    let app = create_test_app();

    let (status, signup) = app
        .send(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "username": "bob", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(signup["username"], "bob");
    assert_eq!(signup["role"], "user");

    let (status, login) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "bob", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap();
    assert_ne!(login["token"], signup["token"]);

    let (status, session) = app.get(&format!("/auth/session/{}", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session, json!({ "username": "bob", "token": token, "role": "user" }));

    // The signup session was replaced by the login.
    let old = signup["token"].as_str().unwrap();
    let (status, json) = app.get(&format!("/auth/session/{}", old)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_signup_rejections() {
    let app = create_test_app();
    app.signup("bob").await;

    let (status, json) = app
        .send(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "username": "bob", "password": "other" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["message"].as_str().unwrap().contains("bob"));

    let (status, _) = app
        .send(Method::POST, "/auth/signup", None, Some(json!({ "username": "carol" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejections() {
    let app = create_test_app();
    app.signup("bob").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "bob", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_expires() {
    let app = create_test_app();
    let token = app.signup("bob").await;

    app.clock.advance_secs(1200);
    let (status, _) = app.get(&format!("/auth/session/{}", token)).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance_secs(1);
    let (status, json) = app.get(&format!("/auth/session/{}", token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["message"].as_str().unwrap().contains("1201"));
}

#[tokio::test]
async fn test_login_rate_limited_per_username() {
    let mut config = Config::for_testing();
    config.login_attempts = 2;
    let app = create_test_app_with(config);
    let wrong = json!({ "username": "admin", "password": "wrong" });

    for _ in 0..2 {
        let (status, _) = app
            .send(Method::POST, "/auth/login", None, Some(wrong.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, json) = app
        .send(Method::POST, "/auth/login", None, Some(wrong))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(json["message"].is_string());

    // Another username still has its own budget.
    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "bob", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_admin_creates_catalog_item() {
    let app = create_test_app();
    let id = app.create_item("Sword", "sword").await;

    let (status, json) = app.get("/items").await;
    assert_eq!(status, StatusCode::OK);
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id.as_str());
    assert_eq!(items[0]["type"], "sword");
}

#[tokio::test]
async fn test_catalog_item_requires_admin() {
    let app = create_test_app();
    let user = app.signup("bob").await;
    let body = json!({ "name": "Axe", "type": "axe", "icon": "axe.png" });

    let (status, _) = app
        .send(Method::POST, "/items", Some(&user), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::POST, "/items", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = app.admin_token().await;
    let (status, _) = app
        .send(Method::POST, "/items", Some(&admin), Some(json!({ "name": "Axe" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = app.get("/items").await;
    assert!(json.as_array().unwrap().is_empty());
}

// ============================================================================
// Listing lifecycle
// ============================================================================

#[tokio::test]
async fn test_listing_lifecycle_with_ownership() {
    let app = create_test_app();
    let item = app.create_item("Sword", "sword").await;
    let alice = app.signup("alice").await;
    let mallory = app.signup("mallory").await;

    let listing = app
        .create_listing(
            &alice,
            json!({ "catalogItemId": item, "rarity": "rare", "price": 50,
                    "mods": [{ "name": "fire", "val1": 7 }] }),
        )
        .await;
    let id = listing["id"].as_str().unwrap();
    let uri = format!("/listings/{}", id);

    let (status, fetched) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, listing);

    let edit = json!({ "catalogItemId": item, "rarity": "unique", "price": 75 });
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&mallory), Some(edit.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.clock.advance_secs(60);
    let (status, edited) = app.send(Method::PATCH, &uri, Some(&alice), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["price"], 75.0);
    assert_eq!(edited["rarity"], "unique");
    assert_eq!(edited["mods"], json!([]));
    assert_eq!(edited["listDate"], listing["listDate"]);
    assert_eq!(edited["sellerId"], listing["sellerId"]);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, removed) = app.send(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["id"], id);

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_rejections() {
    let app = create_test_app();
    let item = app.create_item("Sword", "sword").await;
    let alice = app.signup("alice").await;

    let cases = [
        (
            json!({ "catalogItemId": item, "rarity": "rare", "price": -1 }),
            StatusCode::BAD_REQUEST,
        ),
        (json!({ "catalogItemId": item, "price": 5 }), StatusCode::BAD_REQUEST),
        (
            json!({ "catalogItemId": uuid::Uuid::new_v4(), "rarity": "rare", "price": 5 }),
            StatusCode::NOT_FOUND,
        ),
    ];
    for (body, expected) in cases {
        let (status, json) = app
            .send(Method::POST, "/listings", Some(&alice), Some(body))
            .await;
        assert_eq!(status, expected, "{}", json);
    }

    let (status, _) = app
        .send(
            Method::POST,
            "/listings",
            Some("bogus-token"),
            Some(json!({ "catalogItemId": item, "rarity": "rare", "price": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/listings/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_input_uses_message_payload() {
    let app = create_test_app();
    let alice = app.signup("alice").await;

    let (status, json) = app
        .send(
            Method::POST,
            "/listings",
            Some(&alice),
            Some(json!({ "catalogItemId": "not-a-uuid", "rarity": "rare", "price": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().starts_with("Malformed request"));

    let (status, json) = app.get("/listings/query?minPrice=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].is_string());

    let (status, json) = app
        .send(Method::POST, "/auth/login", None, Some(json!({ "username": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].is_string());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/listings/query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
}

#[tokio::test]
async fn test_recent_listings_newest_first_with_item() {
    let app = create_test_app();
    let item = app.create_item("Sword", "sword").await;
    let alice = app.signup("alice").await;

    for price in [1, 2, 3] {
        app.create_listing(
            &alice,
            json!({ "catalogItemId": item, "rarity": "rare", "price": price }),
        )
        .await;
        app.clock.advance_secs(5);
    }

    let (status, json) = app.get("/listings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prices(&json), vec![3.0, 2.0, 1.0]);
    assert_eq!(json[0]["item"]["name"], "Sword");
}

// ============================================================================
// Browse queries
// ============================================================================

async fn seed_market(app: &TestApp) {
    let sword = app.create_item("Sword", "sword").await;
    let ring = app.create_item("Ring", "ring").await;
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    app.create_listing(
        &alice,
        json!({ "catalogItemId": sword, "rarity": "rare", "price": 99,
                "mods": [{ "name": "fire", "val1": 3 }] }),
    )
    .await;
    app.create_listing(
        &alice,
        json!({ "catalogItemId": ring, "rarity": "magic", "price": 150,
                "mods": [{ "name": "fire", "val1": 7 }, { "name": "life", "val1": 40 }] }),
    )
    .await;
    app.create_listing(
        &bob,
        json!({ "catalogItemId": sword, "rarity": "unique", "price": 100 }),
    )
    .await;
}

#[tokio::test]
async fn test_query_by_seller_and_type() {
    let app = create_test_app();
    seed_market(&app).await;

    let (status, json) = app
        .get("/listings/query?sellerName=alice&itemTypes=sword")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prices(&json), vec![99.0]);
    assert_eq!(json[0]["seller"]["username"], "alice");
    assert!(json[0]["seller"].get("passwordDigest").is_none());
    assert_eq!(json[0]["item"]["type"], "sword");
}

#[tokio::test]
async fn test_query_price_range_and_sort() {
    let app = create_test_app();
    seed_market(&app).await;

    let (_, json) = app
        .get("/listings/query?minPrice=100&sortField=price&sortOrder=desc")
        .await;
    assert_eq!(prices(&json), vec![150.0, 100.0]);

    let (_, json) = app
        .get("/listings/query?maxPrice=100&sortField=sellerName&sortOrder=asc")
        .await;
    let sellers: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["seller"]["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(sellers, vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_query_mod_ranges() {
    let app = create_test_app();
    seed_market(&app).await;

    let (_, json) = app.get("/listings/query?mods=fire:5:10").await;
    assert_eq!(prices(&json), vec![150.0]);

    let (_, json) = app
        .get("/listings/query?mods=fire::,life:30:&sortField=price&sortOrder=asc")
        .await;
    assert_eq!(prices(&json), vec![150.0]);

    let (_, json) = app
        .get("/listings/query?mods=fire&sortField=price&sortOrder=asc")
        .await;
    assert_eq!(prices(&json), vec![99.0, 150.0]);
}

#[tokio::test]
async fn test_query_json_body() {
    let app = create_test_app();
    seed_market(&app).await;

    let (status, json) = app
        .send(
            Method::POST,
            "/listings/query",
            None,
            Some(json!({ "itemNames": [], "rarities": ["rare", "unique"],
                         "sortField": "price", "sortOrder": "asc" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prices(&json), vec![99.0, 100.0]);

    let ids: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].clone())
        .collect();
    let (_, json) = app
        .send(
            Method::POST,
            "/listings/query",
            None,
            Some(json!({ "ids": [ids[1]] })),
        )
        .await;
    assert_eq!(prices(&json), vec![100.0]);
}

#[tokio::test]
async fn test_query_rejects_unknown_sort() {
    let app = create_test_app();

    let (status, json) = app
        .get("/listings/query?sortField=passwordDigest&sortOrder=asc")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("passwordDigest"));

    let (status, _) = app
        .get("/listings/query?sortField=price&sortOrder=sideways")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/listings/query?ids=nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
