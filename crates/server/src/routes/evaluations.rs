//! Evaluation job endpoints.
//!
//! Job execution is not wired up yet: every handler answers with the
//! envelope and status code its final version will use, and a placeholder
//! message in place of real data.

use crate::context::ExecutionContext;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eval_hub::{BenchmarkRef, EvaluationJob, Page, DEFAULT_PAGE_LIMIT};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Benchmark catalogue across all providers
#[derive(Debug, Serialize, Deserialize)]
pub struct BenchmarkList {
    pub benchmarks: Vec<BenchmarkRef>,
    pub total_count: usize,
    pub providers_included: Vec<String>,
}

/// POST /api/v1/evaluations/jobs
pub async fn create_job(ctx: ExecutionContext) -> impl IntoResponse {
    tracing::debug!(
        parent: ctx.span(),
        timeout_minutes = ctx.timeout_minutes(),
        retry_attempts = ctx.retry_attempts(),
        "create evaluation job"
    );

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Evaluation creation not yet implemented",
        })),
    )
}

/// GET /api/v1/evaluations/jobs
pub async fn list_jobs(ctx: ExecutionContext) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), "list evaluation jobs");

    Json(Page::<EvaluationJob>::empty(DEFAULT_PAGE_LIMIT))
}

/// GET /api/v1/evaluations/jobs/{id}
pub async fn get_job(ctx: ExecutionContext, Path(id): Path<String>) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), job_id = %id, "get evaluation job");

    Json(json!({
        "message": "Evaluation retrieval not yet implemented",
        "id": id,
    }))
}

/// DELETE /api/v1/evaluations/jobs/{id}
pub async fn cancel_job(ctx: ExecutionContext, Path(id): Path<String>) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), job_id = %id, "cancel evaluation job");

    (
        StatusCode::OK,
        Json(json!({
            "message": "Evaluation cancellation not yet implemented",
        })),
    )
}

/// GET /api/v1/evaluations/jobs/{id}/summary
pub async fn job_summary(ctx: ExecutionContext, Path(id): Path<String>) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), job_id = %id, "get evaluation summary");

    Json(json!({
        "message": "Evaluation summary not yet implemented",
    }))
}

/// GET /api/v1/evaluations/benchmarks
pub async fn list_benchmarks(ctx: ExecutionContext) -> impl IntoResponse {
    tracing::debug!(parent: ctx.span(), "list benchmarks");

    Json(BenchmarkList {
        benchmarks: Vec::new(),
        total_count: 0,
        providers_included: Vec::new(),
    })
}
