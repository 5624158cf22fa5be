use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use apo_core::model::{
    Build, BuildDefinition, Identity, Pipeline, Project, PullRequest, RepoRef, Repository,
    Reviewer, WorkItem,
};
use apo_core::source::{BuildQuery, ClientError, DataSource};
use apo_core::state::DataCategory;

/// In-memory data for `--demo` and tests.
///
/// Each fetch of builds bumps a counter so repeated refreshes show movement.
/// Categories can be made to fail to exercise partial refreshes.
pub struct FakeSource {
    latency: Duration,
    fetches: AtomicU64,
    failing: Mutex<BTreeSet<DataCategory>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            fetches: AtomicU64::new(0),
            failing: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[cfg(test)]
    pub fn set_failing(&self, category: DataCategory, failing: bool) {
        let mut set = match self.failing.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if failing {
            set.insert(category);
        } else {
            set.remove(&category);
        }
    }

    async fn simulate(&self, category: DataCategory) -> Result<(), ClientError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failing = match self.failing.lock() {
            Ok(set) => set.contains(&category),
            Err(poisoned) => poisoned.into_inner().contains(&category),
        };
        if failing {
            return Err(ClientError::Status {
                status: 503,
                body: format!("{} unavailable", category),
            });
        }
        Ok(())
    }
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::new()
    }
}

fn work_item(id: u64, kind: &str, title: &str, state: &str, description: &str) -> WorkItem {
    let fields = serde_json::json!({
        "System.Title": title,
        "System.State": state,
        "System.WorkItemType": kind,
        "System.AssignedTo": { "displayName": "Demo User", "uniqueName": "demo@example.com" },
        "System.CreatedDate": "2024-05-14T09:12:00Z",
        "System.Description": description,
    });
    WorkItem {
        id,
        rev: 1,
        fields: serde_json::from_value(fields).unwrap_or_default(),
        url: String::new(),
    }
}

fn identity(name: &str) -> Identity {
    Identity {
        id: name.to_lowercase(),
        display_name: name.to_string(),
        unique_name: format!("{}@example.com", name.to_lowercase()),
    }
}

#[async_trait]
impl DataSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_my_work_items(&self) -> Result<Vec<WorkItem>, ClientError> {
        self.simulate(DataCategory::WorkItems).await?;
        Ok(vec![
            work_item(
                4101,
                "Bug",
                "Login page times out behind the corporate proxy",
                "Active",
                "<p>Requests hang for 30s when <b>HTTPS_PROXY</b> is set.</p> \
                 <p>Repro on&nbsp;staging.</p>",
            ),
            work_item(4087, "User Story", "Export dashboard as CSV", "New", ""),
            work_item(
                4052,
                "Task",
                "Rotate service principal secrets",
                "Active",
                "Secrets expire at the end of the quarter.",
            ),
            work_item(
                3990,
                "Feature",
                "Release train notifications",
                "Resolved",
                "",
            ),
        ])
    }

    async fn fetch_builds(&self, query: &BuildQuery) -> Result<Vec<Build>, ClientError> {
        self.simulate(DataCategory::Builds).await?;
        let run = self.fetches.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();

        let all = [
            ("web-ci", "completed", "succeeded"),
            ("api-ci", "completed", "failed"),
            ("deploy-staging", "inProgress", ""),
            ("nightly-e2e", "completed", "canceled"),
            ("web-ci", "completed", "succeeded"),
        ];
        let builds = all
            .iter()
            .enumerate()
            .map(|(i, (name, status, result))| Build {
                id: 900 + i as u64,
                build_number: format!("20240514.{}", run * 10 + i as u64 + 1),
                status: status.to_string(),
                result: result.to_string(),
                queue_time: Some(now - ChronoDuration::minutes(10 * i as i64 + 5)),
                start_time: Some(now - ChronoDuration::minutes(10 * i as i64 + 4)),
                finish_time: (*status == "completed")
                    .then(|| now - ChronoDuration::minutes(10 * i as i64)),
                definition: BuildDefinition {
                    id: i as u64 + 1,
                    name: name.to_string(),
                    path: "\\".into(),
                },
                requested_by: identity("Demo User"),
                source_branch: "refs/heads/main".into(),
            })
            .filter(|b| query.status.as_deref().is_none_or(|s| b.status == s))
            .filter(|b| query.result.as_deref().is_none_or(|r| b.result == r));

        let limit = match query.limit {
            0 => usize::MAX,
            n => n,
        };
        Ok(builds.take(limit).collect())
    }

    async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>, ClientError> {
        self.simulate(DataCategory::Pipelines).await?;
        let pipelines = [
            (1, "web-ci", "\\"),
            (2, "api-ci", "\\"),
            (3, "deploy-staging", "release"),
            (4, "nightly-e2e", "qa"),
        ];
        Ok(pipelines
            .into_iter()
            .map(|(id, name, folder)| Pipeline {
                id,
                name: name.into(),
                folder: folder.into(),
            })
            .collect())
    }

    async fn fetch_repositories(&self) -> Result<Vec<Repository>, ClientError> {
        self.simulate(DataCategory::Repositories).await?;
        Ok([("web", 18_432), ("api", 7_210), ("infra", 512)]
            .into_iter()
            .map(|(name, size)| Repository {
                id: format!("repo-{}", name),
                name: name.into(),
                default_branch: "refs/heads/main".into(),
                size,
                ..Default::default()
            })
            .collect())
    }

    async fn fetch_active_pull_requests(
        &self,
        limit: usize,
    ) -> Result<Vec<PullRequest>, ClientError> {
        self.simulate(DataCategory::PullRequests).await?;
        let prs = vec![
            PullRequest {
                pull_request_id: 311,
                title: "Retry token refresh on 401".into(),
                status: "active".into(),
                created_by: identity("Dana"),
                creation_date: Some(Utc::now() - ChronoDuration::hours(3)),
                source_ref_name: "refs/heads/fix/token-refresh".into(),
                target_ref_name: "refs/heads/main".into(),
                repository: RepoRef {
                    id: "repo-api".into(),
                    name: "api".into(),
                },
                reviewers: vec![
                    Reviewer {
                        display_name: "Sam".into(),
                        vote: 10,
                        ..Default::default()
                    },
                    Reviewer {
                        display_name: "Priya".into(),
                        vote: 0,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            PullRequest {
                pull_request_id: 309,
                title: "Draft: new dashboard layout".into(),
                status: "active".into(),
                is_draft: true,
                created_by: identity("Lee"),
                creation_date: Some(Utc::now() - ChronoDuration::days(1)),
                source_ref_name: "refs/heads/ui/layout".into(),
                target_ref_name: "refs/heads/main".into(),
                repository: RepoRef {
                    id: "repo-web".into(),
                    name: "web".into(),
                },
                ..Default::default()
            },
        ];
        let limit = if limit == 0 { usize::MAX } else { limit };
        Ok(prs.into_iter().take(limit).collect())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        Ok(vec![Project {
            id: "p1".into(),
            name: "demo".into(),
            state: "wellFormed".into(),
            ..Default::default()
        }])
    }
}
