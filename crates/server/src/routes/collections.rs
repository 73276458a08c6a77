use crate::context::ExecutionContext;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eval_hub::Collection;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Collections listing
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionList {
    pub collections: Vec<Collection>,
    pub total_collections: usize,
}

/// GET /api/v1/evaluations/collections
pub async fn list_collections(ctx: ExecutionContext) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), "list collections");

    Json(CollectionList {
        collections: Vec::new(),
        total_collections: 0,
    })
}

/// POST /api/v1/evaluations/collections
pub async fn create_collection(ctx: ExecutionContext) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), "create collection");

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Collection creation not yet implemented",
        })),
    )
}

/// GET /api/v1/evaluations/collections/{id}
pub async fn get_collection(ctx: ExecutionContext, Path(id): Path<String>) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), collection_id = %id, "get collection");

    Json(json!({
        "message": "Collection retrieval not yet implemented",
        "collection_id": id,
    }))
}

/// PUT /api/v1/evaluations/collections/{id}
pub async fn update_collection(
    ctx: ExecutionContext,
    Path(id): Path<String>,
) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), collection_id = %id, "update collection");

    Json(json!({
        "message": "Collection update not yet implemented",
    }))
}

/// PATCH /api/v1/evaluations/collections/{id}
pub async fn patch_collection(ctx: ExecutionContext, Path(id): Path<String>) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), collection_id = %id, "patch collection");

    Json(json!({
        "message": "Collection patch not yet implemented",
    }))
}

/// DELETE /api/v1/evaluations/collections/{id}
pub async fn delete_collection(
    ctx: ExecutionContext,
    Path(id): Path<String>,
) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), collection_id = %id, "delete collection");

    (
        StatusCode::OK,
        Json(json!({
            "message": "Collection deletion not yet implemented",
        })),
    )
}
