//! Product endpoints
//!
//! Mounted at `{API_URL}/products`.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::{
    parse_category_ref, parse_document_id, DomainError, GalleryUpdate, NewProduct, Product,
    ProductUpdate,
};
use crate::error::{AppError, AppResult};
use crate::store::{Collection, Document, DocumentQuery, DocumentStore, StoreError};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    /// Comma separated category ids
    #[serde(default)]
    pub categories: Option<String>,
}

/// Create the products router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/get/count", get(count_products))
        .route("/get/featured/:count", get(featured_products))
        .route("/gallery-images/:id", put(update_gallery))
}

// =========================================================================
// GET /products
// =========================================================================

/// List products, optionally restricted to some categories
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<Vec<Value>>> {
    let mut filter = DocumentQuery::new();

    if let Some(categories) = query.categories {
        let ids: Vec<String> = categories
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if !ids.is_empty() {
            filter = filter.field_in("category", ids);
        }
    }

    let products = state.documents.find(Collection::Products, &filter).await?;
    let populated = populate_categories(&state.documents, &products).await?;

    Ok(Json(populated))
}

// =========================================================================
// GET /products/:id
// =========================================================================

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_document_id(&id, "Product")?;

    let product = state
        .documents
        .find_by_id(Collection::Products, id)
        .await?
        .ok_or_else(|| AppError::ProductNotFound(id.to_string()))?;

    let mut populated = populate_categories(&state.documents, std::slice::from_ref(&product)).await?;

    populated
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("populated product missing".to_string()))
}

// =========================================================================
// POST /products
// =========================================================================

async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<NewProduct>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let category_id = resolve_category(&state.documents, Some(&request.category)).await?;

    let product = Product::create(request, category_id)?;
    let body = serde_json::to_value(&product).map_err(StoreError::from)?;

    let document = state.documents.insert(Collection::Products, body).await?;

    tracing::info!(product_id = %document.id, category_id = %category_id, "Product created");

    Ok((StatusCode::CREATED, Json(document.to_json())))
}

// =========================================================================
// PUT /products/:id
// =========================================================================

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ProductUpdate>,
) -> AppResult<Json<Value>> {
    let id = parse_document_id(&id, "Product")?;
    let category_id = resolve_category(&state.documents, request.category.as_deref()).await?;

    let patch = request.into_patch(category_id)?;

    let document = state
        .documents
        .update(Collection::Products, id, patch)
        .await?
        .ok_or_else(|| AppError::ProductNotFound(id.to_string()))?;

    tracing::info!(product_id = %id, "Product updated");

    Ok(Json(document.to_json()))
}

// =========================================================================
// DELETE /products/:id
// =========================================================================

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let id = parse_document_id(&id, "Product")?;

    if state.documents.delete(Collection::Products, id).await? {
        tracing::info!(product_id = %id, "Product deleted");
        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "message": "the product is deleted!" })),
        ))
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "product not found!" })),
        ))
    }
}

// =========================================================================
// GET /products/get/count
// =========================================================================

async fn count_products(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let count = state.documents.count(Collection::Products).await?;

    Ok(Json(json!({ "productCount": count })))
}

// =========================================================================
// GET /products/get/featured/:count
// =========================================================================

async fn featured_products(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> AppResult<Json<Vec<Value>>> {
    let count: i64 = count.trim().parse().map_err(|_| {
        AppError::InvalidRequest(format!("featured count must be a number, got {count:?}"))
    })?;

    let filter = DocumentQuery::new()
        .contains(json!({ "isFeatured": true }))
        .limit(count);

    let products = state.documents.find(Collection::Products, &filter).await?;

    Ok(Json(products.iter().map(Document::to_json).collect()))
}

// =========================================================================
// PUT /products/gallery-images/:id
// =========================================================================

async fn update_gallery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<GalleryUpdate>,
) -> AppResult<Json<Value>> {
    let id = parse_document_id(&id, "Product")?;

    let images = request.image_urls(&upload_base_url(&headers));

    let document = state
        .documents
        .update(Collection::Products, id, json!({ "images": images }))
        .await?
        .ok_or_else(|| AppError::ProductNotFound(id.to_string()))?;

    Ok(Json(document.to_json()))
}

// =========================================================================
// Helpers
// =========================================================================

/// Check that a category reference points at an existing category
async fn resolve_category(documents: &DocumentStore, raw: Option<&str>) -> AppResult<Uuid> {
    let raw = raw.ok_or(DomainError::InvalidCategory)?;
    let category_id = parse_category_ref(raw)?;

    documents
        .find_by_id(Collection::Categories, category_id)
        .await?
        .ok_or(DomainError::InvalidCategory)?;

    Ok(category_id)
}

fn category_id_of(product: &Document) -> Option<Uuid> {
    product.body.get("category")?.as_str()?.parse().ok()
}

/// Replace each product's category id with the category document
async fn populate_categories(
    documents: &DocumentStore,
    products: &[Document],
) -> Result<Vec<Value>, StoreError> {
    let ids: Vec<Uuid> = products
        .iter()
        .filter_map(category_id_of)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let categories: HashMap<Uuid, Value> = documents
        .find_by_ids(Collection::Categories, &ids)
        .await?
        .iter()
        .map(|category| (category.id, category.to_json()))
        .collect();

    Ok(products
        .iter()
        .map(|product| {
            let mut json = product.to_json();
            json["category"] = category_id_of(product)
                .and_then(|id| categories.get(&id).cloned())
                .unwrap_or(Value::Null);
            json
        })
        .collect())
}

/// `{scheme}://{host}/public/uploads/` as seen by the client
fn upload_base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}/public/uploads/", scheme, host)
}
