use crate::context::ExecutionContext;
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A benchmark provider and the benchmarks it offers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub provider_id: String,
    pub name: String,
    pub benchmarks: Vec<String>,
}

/// Provider listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderList {
    pub providers: Vec<ProviderInfo>,
    pub total_providers: usize,
    pub total_benchmarks: usize,
}

/// GET /api/v1/evaluations/providers
pub async fn list_providers(ctx: ExecutionContext) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), "list providers");

    Json(ProviderList {
        providers: Vec::new(),
        total_providers: 0,
        total_benchmarks: 0,
    })
}

/// GET /api/v1/evaluations/providers/{id}
pub async fn get_provider(ctx: ExecutionContext, Path(id): Path<String>) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), provider_id = %id, "get provider");

    Json(json!({
        "message": "Provider retrieval not yet implemented",
        "provider_id": id,
    }))
}

/// GET /api/v1/metrics/system
pub async fn system_metrics(ctx: ExecutionContext) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), "get system metrics");

    Json(json!({
        "message": "System metrics not yet implemented",
    }))
}
