//! Core crate for the evaluation hub.
//!
//! This crate holds everything the HTTP service shares with other
//! consumers: the resource model, the storage contract, the experiment
//! tracker capability and the layered service configuration.

pub mod config;
pub mod resources;
pub mod storage;
pub mod tracker;

pub use config::{Config, ConfigError, ConfigLoader, DatabaseConfig, ServiceConfig};
pub use resources::{
    BenchmarkRef, Collection, EvaluationJob, Href, JobState, Page, DEFAULT_PAGE_LIMIT,
};
pub use storage::{
    InMemoryStorage, Query, ResourceKind, Storage, StorageError, StorageResult, COLLECTION_FILTERS,
    JOB_FILTERS, MAX_PAGE_LIMIT,
};
pub use tracker::{ExperimentTracker, UrlTracker};
