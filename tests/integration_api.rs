//! API Integration Tests
//!
//! Tests marked `#[ignore]` need a PostgreSQL database in `DATABASE_URL`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware, Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::util::ServiceExt;
use uuid::Uuid;

use storefront::api::{self, AppState};
use storefront::notifier::NotifierStatus;
use storefront::store::DocumentStore;

mod common;

fn app(pool: PgPool) -> Router {
    let state = AppState::new(DocumentStore::new(pool), Arc::new(NotifierStatus::new()));
    api::create_router().with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

// =========================================================================
// Without a database
// =========================================================================

#[tokio::test]
async fn test_invalid_product_id_is_rejected() {
    let app = app(common::unreachable_pool());

    let (status, body) = send(&app, "GET", "/products/not-an-id", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid Product Id");
    assert_eq!(body["error_code"], "invalid_id");
}

#[tokio::test]
async fn test_invalid_category_reference_is_rejected() {
    let app = app(common::unreachable_pool());
    let product = json!({
        "name": "Lamp",
        "image": "http://localhost/public/uploads/lamp.png",
        "category": "garbage",
    });

    let (status, body) = send(&app, "POST", "/products", Some(product)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Category");
}

#[tokio::test]
async fn test_unreachable_store_is_reported_unavailable() {
    let app = app(common::unreachable_pool());

    let (status, body) = send(&app, "GET", "/categories", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_code"], "store_unavailable");
}

#[tokio::test]
async fn test_notifier_status_endpoint() {
    let app = app(common::unreachable_pool());

    let (status, body) = send(&app, "GET", "/notifier/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"], "waiting_for_store");
    assert_eq!(body["events_received"], 0);
    assert_eq!(body["calls_in_flight"], 0);
    assert!(body["last_resume_token"].is_null());
}

#[tokio::test]
async fn test_non_numeric_featured_count_is_json_error() {
    let app = app(common::unreachable_pool());

    let (status, body) = send(&app, "GET", "/products/get/featured/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_access_log_middleware_passes_response_through() {
    let app = app(common::unreachable_pool())
        .layer(middleware::from_fn(api::middleware::logging_middleware));

    let (status, body) = send(&app, "GET", "/notifier/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"], "waiting_for_store");
}

// =========================================================================
// With a database
// =========================================================================

async fn create_category(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/categories",
        Some(json!({ "name": name, "icon": "icon", "color": "#000" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "category creation failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_product_lifecycle() {
    let app = app(common::setup_test_db().await);
    let category_id = create_category(&app, "Furniture").await;

    // 1. Create
    let (status, created) = send(
        &app,
        "POST",
        "/products",
        Some(json!({
            "name": "Chair",
            "image": "http://localhost/public/uploads/chair.png",
            "price": 49.5,
            "category": category_id,
            "countInStock": 10,
            "isFeatured": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "product creation failed: {created}");
    let product_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["category"], category_id);

    // 2. Read with the category populated
    let (status, fetched) = send(&app, "GET", &format!("/products/{}", product_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Chair");
    assert_eq!(fetched["category"]["name"], "Furniture");

    // 3. Update
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/products/{}", product_id),
        Some(json!({ "price": 59.0, "category": category_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 59.0);
    assert_eq!(updated["name"], "Chair");

    // 4. Count and featured
    let (_, count) = send(&app, "GET", "/products/get/count", None).await;
    assert_eq!(count["productCount"], 1);

    let (_, featured) = send(&app, "GET", "/products/get/featured/5", None).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);

    // 5. Gallery
    let (status, gallery) = send(
        &app,
        "PUT",
        &format!("/products/gallery-images/{}", product_id),
        Some(json!({ "images": ["side view.png", "back.png"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        gallery["images"],
        json!([
            "http://localhost/public/uploads/side-view.png",
            "http://localhost/public/uploads/back.png",
        ])
    );

    // 6. Delete
    let (status, deleted) = send(&app, "DELETE", &format!("/products/{}", product_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);

    let (status, _) = send(&app, "GET", &format!("/products/{}", product_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_product_without_image_is_rejected() {
    let app = app(common::setup_test_db().await);
    let category_id = create_category(&app, "Garden").await;

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(json!({ "name": "Hose", "category": category_id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image in the request");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unknown_category_is_rejected() {
    let app = app(common::setup_test_db().await);

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(json!({
            "name": "Lamp",
            "image": "lamp.png",
            "category": Uuid::new_v4().to_string(),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Category");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_products_by_category() {
    let app = app(common::setup_test_db().await);
    let kitchen = create_category(&app, "Kitchen").await;
    let office = create_category(&app, "Office").await;

    for (name, category) in [("Pan", &kitchen), ("Pot", &kitchen), ("Pen", &office)] {
        let (status, _) = send(
            &app,
            "POST",
            "/products",
            Some(json!({ "name": name, "image": "x.png", "category": category })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, all) = send(&app, "GET", "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, kitchen_only) = send(&app, "GET", &format!("/products?categories={}", kitchen), None).await;
    let names: Vec<_> = kitchen_only
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Pan", "Pot"]);

    // An empty filter value means no filter
    let (status, unfiltered) = send(&app, "GET", "/products?categories=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unfiltered.as_array().unwrap().len(), 3);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_featured_count_zero_returns_all_featured() {
    let app = app(common::setup_test_db().await);
    let category = create_category(&app, "Books").await;

    for (name, featured) in [("A", true), ("B", true), ("C", false)] {
        let (status, _) = send(
            &app,
            "POST",
            "/products",
            Some(json!({ "name": name, "image": "x.png", "category": category, "isFeatured": featured })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, all) = send(&app, "GET", "/products/get/featured/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, one) = send(&app, "GET", "/products/get/featured/1", None).await;
    assert_eq!(one.as_array().unwrap().len(), 1);

    let (_, negative) = send(&app, "GET", "/products/get/featured/-1", None).await;
    assert_eq!(negative.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_category_crud() {
    let app = app(common::setup_test_db().await);
    let id = create_category(&app, "Toys").await;

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/categories/{}", id),
        Some(json!({ "color": "#f00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Toys");
    assert_eq!(updated["color"], "#f00");

    let (status, deleted) = send(&app, "DELETE", &format!("/categories/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);

    let (status, missing) = send(&app, "DELETE", &format!("/categories/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["success"], false);
}
