//! Resource model shared by the storage contract and the HTTP handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Lifecycle state of an evaluation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

/// Reference to a benchmark offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRef {
    pub benchmark_id: String,
    pub provider_id: String,
}

/// An evaluation job submitted against a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationJob {
    pub id: String,
    pub model_name: String,
    pub model_url: String,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkRef>,
    #[serde(default)]
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvaluationJob {
    pub fn new(
        id: impl Into<String>,
        model_name: impl Into<String>,
        model_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            model_name: model_name.into(),
            model_url: model_url.into(),
            benchmarks: Vec::new(),
            state: JobState::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A named, reusable set of benchmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            benchmarks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Link to a page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Href {
    pub href: String,
}

impl Href {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// Pagination envelope returned by every list operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub limit: usize,
    pub first: Href,
    pub next: Option<Href>,
}

impl<T> Page<T> {
    /// An empty first page.
    pub fn empty(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            limit,
            first: Href::default(),
            next: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_page_envelope() {
        let page: Page<EvaluationJob> = Page::empty(DEFAULT_PAGE_LIMIT);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            value,
            json!({
                "items": [],
                "total_count": 0,
                "limit": 50,
                "first": {"href": ""},
                "next": null,
            })
        );
    }

    #[test]
    fn test_job_state_serializes_snake_case() {
        let job = EvaluationJob::new("job-1", "granite", "http://models/granite");
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["state"], "pending");
        assert_eq!(JobState::Cancelled.as_str(), "cancelled");
    }
}
