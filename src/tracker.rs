//! Experiment tracking capability.
//!
//! Evaluation runs may be reported to an external experiment tracker. The
//! hub only needs a narrow contract from it; concrete trackers are supplied
//! by the embedding application.

/// An external experiment tracker that evaluation runs are reported to.
pub trait ExperimentTracker: Send + Sync {
    /// Short identifier of the tracker implementation, used in logs.
    fn name(&self) -> &str;

    /// Browser URL for an experiment, if the tracker exposes one.
    fn experiment_url(&self, experiment: &str) -> Option<String>;
}

/// Tracker rooted at a fixed base URL, e.g. an MLflow UI.
#[derive(Debug, Clone)]
pub struct UrlTracker {
    name: String,
    base_url: String,
}

impl UrlTracker {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }
}

impl ExperimentTracker for UrlTracker {
    fn name(&self) -> &str {
        &self.name
    }

    fn experiment_url(&self, experiment: &str) -> Option<String> {
        Some(format!(
            "{}/#/experiments/{experiment}",
            self.base_url.trim_end_matches('/')
        ))
    }
}
