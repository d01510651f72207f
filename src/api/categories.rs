//! Category endpoints
//!
//! Mounted at `{API_URL}/categories`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::domain::{parse_document_id, Category, CategoryUpdate};
use crate::error::{AppError, AppResult};
use crate::store::{Collection, Document, DocumentQuery, StoreError};

use super::AppState;

/// Create the categories router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Value>>> {
    let categories = state
        .documents
        .find(Collection::Categories, &DocumentQuery::new())
        .await?;

    Ok(Json(categories.iter().map(Document::to_json).collect()))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_document_id(&id, "Category")?;

    let category = state
        .documents
        .find_by_id(Collection::Categories, id)
        .await?
        .ok_or_else(|| AppError::CategoryNotFound(id.to_string()))?;

    Ok(Json(category.to_json()))
}

async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<Category>,
) -> AppResult<(StatusCode, Json<Value>)> {
    request.validate()?;

    let body = serde_json::to_value(&request).map_err(StoreError::from)?;
    let document = state.documents.insert(Collection::Categories, body).await?;

    tracing::info!(category_id = %document.id, name = %request.name, "Category created");

    Ok((StatusCode::CREATED, Json(document.to_json())))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CategoryUpdate>,
) -> AppResult<Json<Value>> {
    let id = parse_document_id(&id, "Category")?;
    let patch = request.into_patch()?;

    let document = state
        .documents
        .update(Collection::Categories, id, patch)
        .await?
        .ok_or_else(|| AppError::CategoryNotFound(id.to_string()))?;

    Ok(Json(document.to_json()))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let id = parse_document_id(&id, "Category")?;

    if state.documents.delete(Collection::Categories, id).await? {
        tracing::info!(category_id = %id, "Category deleted");
        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "message": "the category is deleted!" })),
        ))
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "category not found!" })),
        ))
    }
}
