use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::RwLock;

use crate::model::{Build, Pipeline, PullRequest, Repository, WorkItem};

/// The five independently fetched data categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataCategory {
    WorkItems,
    Builds,
    Pipelines,
    Repositories,
    PullRequests,
}

impl DataCategory {
    pub const ALL: [DataCategory; 5] = [
        DataCategory::WorkItems,
        DataCategory::Builds,
        DataCategory::Pipelines,
        DataCategory::Repositories,
        DataCategory::PullRequests,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::WorkItems => "work items",
            Self::Builds => "builds",
            Self::Pipelines => "pipelines",
            Self::Repositories => "repositories",
            Self::PullRequests => "pull requests",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Most recently fetched remote data, shared between the refresh task and the UI.
///
/// Only ever mutated through [`crate::reducer::reduce`] while the writer lock
/// is held.
#[derive(Clone, Debug, Default)]
pub struct DataSnapshot {
    pub work_items: Vec<WorkItem>,
    pub builds: Vec<Build>,
    pub pipelines: Vec<Pipeline>,
    pub repositories: Vec<Repository>,
    pub pull_requests: Vec<PullRequest>,
    pub last_refresh: Option<DateTime<Local>>,
    pub loading: bool,
    /// Bumped once per completed refresh cycle so views can tell stale copies apart.
    pub generation: u64,
    /// Categories whose fetch failed during the last completed refresh.
    pub failed: BTreeSet<DataCategory>,
}

impl DataSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len_of(&self, category: DataCategory) -> usize {
        match category {
            DataCategory::WorkItems => self.work_items.len(),
            DataCategory::Builds => self.builds.len(),
            DataCategory::Pipelines => self.pipelines.len(),
            DataCategory::Repositories => self.repositories.len(),
            DataCategory::PullRequests => self.pull_requests.len(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn shared() -> SharedSnapshot {
        Arc::new(RwLock::new(Self::new()))
    }
}

/// Read by the UI thread, written by refresh tasks.
pub type SharedSnapshot = Arc<RwLock<DataSnapshot>>;
