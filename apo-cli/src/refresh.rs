//! Background refresh of the shared snapshot.
//!
//! All five categories are fetched concurrently. A failed category records
//! a `FetchFailed` event and keeps its previous data; the others still land.
//! The snapshot lock is only taken to apply events, never across a request.
//! A cycle that panics is reported as aborted and the in-flight flag is
//! released either way.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use apo_core::reducer::{DataEvent, reduce, reduce_all};
use apo_core::source::{BuildQuery, ClientError, DataSource};
use apo_core::state::{DataCategory, SharedSnapshot};

const RECENT_BUILDS: usize = 20;
const ACTIVE_PULL_REQUESTS: usize = 20;

/// Reported once per finished refresh cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub at: DateTime<Local>,
    pub failed: Vec<DataCategory>,
    /// The cycle died before applying anything.
    pub aborted: bool,
}

impl RefreshOutcome {
    fn aborted() -> Self {
        Self {
            at: Local::now(),
            failed: DataCategory::ALL.to_vec(),
            aborted: true,
        }
    }
}

/// Clears the in-flight flag when dropped.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Spawns refresh cycles, at most one at a time.
#[derive(Clone)]
pub struct Refresher {
    source: Arc<dyn DataSource>,
    snapshot: SharedSnapshot,
    handle: Handle,
    in_flight: Arc<AtomicBool>,
    done_tx: mpsc::UnboundedSender<RefreshOutcome>,
}

impl Refresher {
    pub fn new(
        source: Arc<dyn DataSource>,
        snapshot: SharedSnapshot,
        handle: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<RefreshOutcome>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let refresher = Self {
            source,
            snapshot,
            handle,
            in_flight: Arc::new(AtomicBool::new(false)),
            done_tx,
        };
        (refresher, done_rx)
    }

    #[cfg(test)]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a refresh cycle unless one is already running.
    ///
    /// Returns `false` when the request was dropped. Safe to call from the
    /// blocking UI thread.
    pub fn request(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("refresh already in flight, request dropped");
            return false;
        }

        let guard = InFlight(self.in_flight.clone());
        let this = self.clone();
        self.handle.spawn(async move {
            let outcome = this.supervise().await;
            drop(guard);
            let _ = this.done_tx.send(outcome);
        });
        true
    }

    /// Run one cycle on its own task so a panic cannot leave the snapshot
    /// stuck in the loading state.
    async fn supervise(&self) -> RefreshOutcome {
        let source = self.source.clone();
        let snapshot = self.snapshot.clone();
        let cycle = tokio::spawn(async move {
            refresh_once(source.as_ref(), &snapshot).await
        });

        match cycle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "refresh cycle aborted");
                reduce(&mut *self.snapshot.write().await, &DataEvent::RefreshAborted);
                RefreshOutcome::aborted()
            }
        }
    }
}

fn failure(category: DataCategory, err: ClientError) -> DataEvent {
    tracing::warn!(%category, error = %err, "fetch failed");
    DataEvent::FetchFailed {
        category,
        message: err.to_string(),
    }
}

/// Run one full refresh cycle against `source` and apply it to `snapshot`.
pub async fn refresh_once(source: &dyn DataSource, snapshot: &SharedSnapshot) -> RefreshOutcome {
    reduce(&mut *snapshot.write().await, &DataEvent::RefreshStarted);
    tracing::info!(source = source.name(), "refresh started");

    let recent = BuildQuery::recent(RECENT_BUILDS);
    let (work_items, builds, pipelines, repositories, pull_requests) = tokio::join!(
        source.fetch_my_work_items(),
        source.fetch_builds(&recent),
        source.fetch_pipelines(),
        source.fetch_repositories(),
        source.fetch_active_pull_requests(ACTIVE_PULL_REQUESTS),
    );

    let mut events = vec![
        match work_items {
            Ok(items) => DataEvent::WorkItemsLoaded { items },
            Err(e) => failure(DataCategory::WorkItems, e),
        },
        match builds {
            Ok(builds) => DataEvent::BuildsLoaded { builds },
            Err(e) => failure(DataCategory::Builds, e),
        },
        match pipelines {
            Ok(pipelines) => DataEvent::PipelinesLoaded { pipelines },
            Err(e) => failure(DataCategory::Pipelines, e),
        },
        match repositories {
            Ok(repositories) => DataEvent::RepositoriesLoaded { repositories },
            Err(e) => failure(DataCategory::Repositories, e),
        },
        match pull_requests {
            Ok(pull_requests) => DataEvent::PullRequestsLoaded { pull_requests },
            Err(e) => failure(DataCategory::PullRequests, e),
        },
    ];

    let failed = events
        .iter()
        .filter_map(|event| match event {
            DataEvent::FetchFailed { category, .. } => Some(*category),
            _ => None,
        })
        .collect::<Vec<_>>();

    let at = Local::now();
    events.push(DataEvent::RefreshFinished { at });
    reduce_all(&mut *snapshot.write().await, &events);

    tracing::info!(failed = failed.len(), "refresh finished");
    RefreshOutcome {
        at,
        failed,
        aborted: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeSource;
    use apo_core::model::{Build, Pipeline, Project, PullRequest, Repository, WorkItem};
    use apo_core::state::DataSnapshot;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Every fetch succeeds empty except builds, which panics.
    struct PanickingSource;

    #[async_trait]
    impl DataSource for PanickingSource {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn fetch_my_work_items(&self) -> Result<Vec<WorkItem>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_builds(&self, _query: &BuildQuery) -> Result<Vec<Build>, ClientError> {
            panic!("build backend crashed");
        }

        async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_repositories(&self) -> Result<Vec<Repository>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_active_pull_requests(
            &self,
            _limit: usize,
        ) -> Result<Vec<PullRequest>, ClientError> {
            Ok(Vec::new())
        }

        async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_refresh_fills_snapshot() {
        let source = FakeSource::new();
        let snapshot = DataSnapshot::shared();

        let outcome = refresh_once(&source, &snapshot).await;
        assert!(outcome.failed.is_empty());

        let state = snapshot.read().await;
        assert!(!state.loading);
        assert_eq!(state.generation, 1);
        assert_eq!(state.last_refresh, Some(outcome.at));
        assert_eq!(state.work_items.len(), 4);
        assert_eq!(state.pipelines.len(), 4);
        assert_eq!(state.pull_requests.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_previous_builds() {
        let source = FakeSource::new();
        let snapshot = DataSnapshot::shared();
        refresh_once(&source, &snapshot).await;
        let builds_before = snapshot.read().await.builds.clone();

        source.set_failing(DataCategory::Builds, true);
        let outcome = refresh_once(&source, &snapshot).await;
        assert_eq!(outcome.failed, vec![DataCategory::Builds]);

        let state = snapshot.read().await;
        assert_eq!(state.builds, builds_before);
        assert_eq!(state.repositories.len(), 3);
        assert!(state.failed.contains(&DataCategory::Builds));
        assert_eq!(state.generation, 2);
    }

    #[tokio::test]
    async fn test_overlapping_request_is_dropped() {
        let source = Arc::new(FakeSource::new().with_latency(Duration::from_millis(50)));
        let snapshot = DataSnapshot::shared();
        let (refresher, mut done) = Refresher::new(source, snapshot.clone(), Handle::current());

        assert!(refresher.request());
        assert!(refresher.is_in_flight());
        assert!(!refresher.request());

        let outcome = done.recv().await.unwrap();
        assert!(outcome.failed.is_empty());
        assert!(!refresher.is_in_flight());
        assert_eq!(snapshot.read().await.generation, 1);

        assert!(refresher.request());
        done.recv().await.unwrap();
        assert_eq!(snapshot.read().await.generation, 2);
    }

    #[tokio::test]
    async fn test_panicking_cycle_is_reported_and_released() {
        let snapshot = DataSnapshot::shared();
        let source = Arc::new(PanickingSource);
        let (refresher, mut done) = Refresher::new(source, snapshot.clone(), Handle::current());

        assert!(refresher.request());
        let outcome = done.recv().await.unwrap();
        assert!(outcome.aborted);
        assert_eq!(outcome.failed.len(), DataCategory::ALL.len());
        assert!(!refresher.is_in_flight());

        {
            let state = snapshot.read().await;
            assert!(!state.loading);
            assert_eq!(state.generation, 0);
            assert_eq!(state.last_refresh, None);
        }

        assert!(refresher.request());
        assert!(done.recv().await.unwrap().aborted);
    }
}
