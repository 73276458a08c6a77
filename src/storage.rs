//! Storage contract for evaluation jobs and collections.
//!
//! The HTTP layer only depends on the [`Storage`] trait; [`InMemoryStorage`]
//! is the process-local implementation used for development and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::resources::{Collection, EvaluationJob, Href, Page, DEFAULT_PAGE_LIMIT};

/// String-keyed filter for list operations.
///
/// `limit` and `offset` control paging; every other key must match the
/// resource field of the same name.
pub type Query = HashMap<String, String>;

/// Upper bound on a requested page size.
pub const MAX_PAGE_LIMIT: usize = 500;

/// Resource kinds held by a [`Storage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    EvaluationJob,
    Collection,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::EvaluationJob => f.write_str("evaluation job"),
            ResourceKind::Collection => f.write_str("collection"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("{kind} {id} already exists")]
    Conflict { kind: ResourceKind, id: String },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn backend(msg: impl Into<String>) -> Self {
        StorageError::Backend(msg.into())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// CRUD-by-identifier over evaluation jobs and collections.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_evaluation_job(&self, job: EvaluationJob) -> StorageResult<()>;
    async fn get_evaluation_job(&self, id: &str) -> StorageResult<EvaluationJob>;
    async fn list_evaluation_jobs(&self, query: &Query) -> StorageResult<Page<EvaluationJob>>;
    async fn update_evaluation_job(&self, job: EvaluationJob) -> StorageResult<()>;
    async fn delete_evaluation_job(&self, id: &str) -> StorageResult<()>;

    async fn create_collection(&self, collection: Collection) -> StorageResult<()>;
    async fn get_collection(&self, id: &str) -> StorageResult<Collection>;
    async fn list_collections(&self, query: &Query) -> StorageResult<Page<Collection>>;
    async fn update_collection(&self, collection: Collection) -> StorageResult<()>;
    async fn delete_collection(&self, id: &str) -> StorageResult<()>;
}

/// An in-memory store using a `RwLock` around a `HashMap` per resource kind.
#[derive(Default)]
pub struct InMemoryStorage {
    jobs: RwLock<HashMap<String, EvaluationJob>>,
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::backend("poisoned lock")
}

fn require_id(id: &str) -> StorageResult<()> {
    if id.trim().is_empty() {
        return Err(StorageError::Validation("identifier must not be empty".into()));
    }
    Ok(())
}

/// Filter keys accepted by [`Storage::list_evaluation_jobs`].
pub const JOB_FILTERS: &[&str] = &["state", "model_name", "model_url"];

/// Filter keys accepted by [`Storage::list_collections`].
pub const COLLECTION_FILTERS: &[&str] = &["name"];

fn job_field<'a>(job: &'a EvaluationJob, key: &str) -> Option<&'a str> {
    match key {
        "state" => Some(job.state.as_str()),
        "model_name" => Some(&job.model_name),
        "model_url" => Some(&job.model_url),
        _ => None,
    }
}

fn collection_field<'a>(collection: &'a Collection, key: &str) -> Option<&'a str> {
    match key {
        "name" => Some(&collection.name),
        _ => None,
    }
}

fn parse_usize(query: &Query, key: &str, default: usize) -> StorageResult<usize> {
    match query.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| StorageError::Validation(format!("{key} must be a non-negative integer"))),
    }
}

/// Apply field filters, stable ordering and paging to a snapshot of records.
fn paginate<T, F, K>(
    mut items: Vec<T>,
    query: &Query,
    filters: &[&str],
    field: F,
    sort_key: K,
) -> StorageResult<Page<T>>
where
    F: for<'a> Fn(&'a T, &str) -> Option<&'a str>,
    K: Fn(&T) -> (chrono::DateTime<Utc>, String),
{
    let limit = parse_usize(query, "limit", DEFAULT_PAGE_LIMIT)?;
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(StorageError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    let offset = parse_usize(query, "offset", 0)?;

    let conditions: Vec<(&str, &str)> = query
        .iter()
        .filter(|(key, _)| key.as_str() != "limit" && key.as_str() != "offset")
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    if let Some((key, _)) = conditions.iter().find(|(key, _)| !filters.contains(key)) {
        return Err(StorageError::Validation(format!("unsupported filter: {key}")));
    }
    items.retain(|item| {
        conditions
            .iter()
            .all(|(key, expected)| field(item, *key) == Some(*expected))
    });

    items.sort_by_key(&sort_key);
    let total_count = items.len();
    let next_offset = offset.saturating_add(limit);
    let next = (next_offset < total_count)
        .then(|| Href::new(format!("?limit={limit}&offset={next_offset}")));
    let items = items.into_iter().skip(offset).take(limit).collect();

    Ok(Page {
        items,
        total_count,
        limit,
        first: Href::new(format!("?limit={limit}&offset=0")),
        next,
    })
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_evaluation_job(&self, job: EvaluationJob) -> StorageResult<()> {
        require_id(&job.id)?;
        let mut guard = self.jobs.write().map_err(poisoned)?;
        if guard.contains_key(&job.id) {
            return Err(StorageError::Conflict {
                kind: ResourceKind::EvaluationJob,
                id: job.id,
            });
        }
        guard.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get_evaluation_job(&self, id: &str) -> StorageResult<EvaluationJob> {
        let guard = self.jobs.read().map_err(poisoned)?;
        guard.get(id).cloned().ok_or_else(|| StorageError::NotFound {
            kind: ResourceKind::EvaluationJob,
            id: id.to_string(),
        })
    }

    async fn list_evaluation_jobs(&self, query: &Query) -> StorageResult<Page<EvaluationJob>> {
        let snapshot: Vec<EvaluationJob> =
            self.jobs.read().map_err(poisoned)?.values().cloned().collect();
        paginate(snapshot, query, JOB_FILTERS, job_field, |job| (job.created_at, job.id.clone()))
    }

    async fn update_evaluation_job(&self, mut job: EvaluationJob) -> StorageResult<()> {
        let mut guard = self.jobs.write().map_err(poisoned)?;
        let Some(existing) = guard.get_mut(&job.id) else {
            return Err(StorageError::NotFound {
                kind: ResourceKind::EvaluationJob,
                id: job.id,
            });
        };
        job.created_at = existing.created_at;
        job.updated_at = Utc::now();
        *existing = job;
        Ok(())
    }

    async fn delete_evaluation_job(&self, id: &str) -> StorageResult<()> {
        self.jobs
            .write()
            .map_err(poisoned)?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                kind: ResourceKind::EvaluationJob,
                id: id.to_string(),
            })
    }

    async fn create_collection(&self, collection: Collection) -> StorageResult<()> {
        require_id(&collection.id)?;
        let mut guard = self.collections.write().map_err(poisoned)?;
        if guard.contains_key(&collection.id) {
            return Err(StorageError::Conflict {
                kind: ResourceKind::Collection,
                id: collection.id,
            });
        }
        guard.insert(collection.id.clone(), collection);
        Ok(())
    }

    async fn get_collection(&self, id: &str) -> StorageResult<Collection> {
        let guard = self.collections.read().map_err(poisoned)?;
        guard.get(id).cloned().ok_or_else(|| StorageError::NotFound {
            kind: ResourceKind::Collection,
            id: id.to_string(),
        })
    }

    async fn list_collections(&self, query: &Query) -> StorageResult<Page<Collection>> {
        let snapshot: Vec<Collection> = self
            .collections
            .read()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();
        paginate(snapshot, query, COLLECTION_FILTERS, collection_field, |c| (c.created_at, c.id.clone()))
    }

    async fn update_collection(&self, mut collection: Collection) -> StorageResult<()> {
        let mut guard = self.collections.write().map_err(poisoned)?;
        let Some(existing) = guard.get_mut(&collection.id) else {
            return Err(StorageError::NotFound {
                kind: ResourceKind::Collection,
                id: collection.id,
            });
        };
        collection.created_at = existing.created_at;
        collection.updated_at = Utc::now();
        *existing = collection;
        Ok(())
    }

    async fn delete_collection(&self, id: &str) -> StorageResult<()> {
        self.collections
            .write()
            .map_err(poisoned)?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                kind: ResourceKind::Collection,
                id: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::JobState;

    fn query(pairs: &[(&str, &str)]) -> Query {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_job_crud() {
        let storage = InMemoryStorage::new();
        storage
            .create_evaluation_job(EvaluationJob::new("job-1", "granite", "http://m/granite"))
            .await
            .unwrap();

        let mut job = storage.get_evaluation_job("job-1").await.unwrap();
        assert_eq!(job.state, JobState::Pending);

        job.state = JobState::Running;
        storage.update_evaluation_job(job).await.unwrap();
        assert_eq!(
            storage.get_evaluation_job("job-1").await.unwrap().state,
            JobState::Running
        );

        storage.delete_evaluation_job("job-1").await.unwrap();
        let err = storage.get_evaluation_job("job-1").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(err.to_string().contains("evaluation job job-1 not found"));
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let storage = InMemoryStorage::new();
        storage
            .create_collection(Collection::new("c1", "safety"))
            .await
            .unwrap();
        let err = storage
            .create_collection(Collection::new("c1", "safety"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let storage = InMemoryStorage::new();
        assert!(matches!(
            storage.delete_collection("nope").await,
            Err(StorageError::NotFound { kind: ResourceKind::Collection, .. })
        ));
        assert!(matches!(
            storage
                .update_evaluation_job(EvaluationJob::new("nope", "m", "u"))
                .await,
            Err(StorageError::NotFound { kind: ResourceKind::EvaluationJob, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let storage = InMemoryStorage::new();
        let err = storage
            .create_evaluation_job(EvaluationJob::new("  ", "m", "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let storage = InMemoryStorage::new();
        for i in 0..5 {
            let mut job = EvaluationJob::new(format!("job-{i}"), "granite", "http://m");
            if i % 2 == 0 {
                job.state = JobState::Completed;
            }
            storage.create_evaluation_job(job).await.unwrap();
        }

        let page = storage
            .list_evaluation_jobs(&query(&[("state", "completed"), ("limit", "2")]))
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.limit, 2);
        assert_eq!(page.next, Some(Href::new("?limit=2&offset=2")));

        let last = storage
            .list_evaluation_jobs(&query(&[("state", "completed"), ("limit", "2"), ("offset", "2")]))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.next.is_none());
    }

    #[tokio::test]
    async fn test_list_rejects_bad_queries() {
        let storage = InMemoryStorage::new();
        storage
            .create_collection(Collection::new("c1", "safety"))
            .await
            .unwrap();

        for bad in [
            query(&[("limit", "0")]),
            query(&[("limit", "abc")]),
            query(&[("colour", "red")]),
        ] {
            let err = storage.list_collections(&bad).await.unwrap_err();
            assert!(matches!(err, StorageError::Validation(_)), "{bad:?}");
        }

        let page = storage.list_collections(&Query::new()).await.unwrap();
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(page.total_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_filter_rejected_regardless_of_contents() {
        let storage = InMemoryStorage::new();
        let err = storage
            .list_collections(&query(&[("colour", "red")]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        storage
            .create_evaluation_job(EvaluationJob::new("job-1", "granite", "http://m"))
            .await
            .unwrap();
        // A non-matching known filter must not hide the unknown one.
        for _ in 0..50 {
            let err = storage
                .list_evaluation_jobs(&query(&[("state", "nope"), ("colour", "red")]))
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_huge_offset_yields_empty_page() {
        let storage = InMemoryStorage::new();
        storage
            .create_collection(Collection::new("c1", "safety"))
            .await
            .unwrap();

        let offset = usize::MAX.to_string();
        let page = storage
            .list_collections(&query(&[("offset", offset.as_str())]))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 1);
        assert!(page.next.is_none());
    }
}
