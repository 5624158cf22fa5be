//! Data source trait for remote backends
//!
//! A data source knows how to fetch each data category the dashboard shows.
//! The live implementation talks to the Azure DevOps REST API; a fake one
//! serves canned data for demos and tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Build, Pipeline, Project, PullRequest, Repository, WorkItem};

/// Errors a data source can report. None of them are retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or the connection failed
    #[error("request failed: {0}")]
    Transport(String),
    /// Service answered with a non-success status
    #[error("API error (status {status}): {body}")]
    Status { status: u16, body: String },
    /// Response body did not match the expected shape
    #[error("parsing response: {0}")]
    Parse(String),
    /// Client is not usable with the current configuration
    #[error("not configured: {0}")]
    NotConfigured(String),
}

/// Build list filters, mirrored from the REST API query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildQuery {
    /// notStarted, inProgress, completed
    pub status: Option<String>,
    /// succeeded, failed, canceled
    pub result: Option<String>,
    pub limit: usize,
}

impl BuildQuery {
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn failed(limit: usize) -> Self {
        Self {
            status: Some("completed".into()),
            result: Some("failed".into()),
            limit,
        }
    }

    pub fn running(limit: usize) -> Self {
        Self {
            status: Some("inProgress".into()),
            result: None,
            limit,
        }
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable name of this source
    fn name(&self) -> &'static str;

    /// Open work items assigned to the authenticated user, most recently changed first
    async fn fetch_my_work_items(&self) -> Result<Vec<WorkItem>, ClientError>;

    async fn fetch_builds(&self, query: &BuildQuery) -> Result<Vec<Build>, ClientError>;

    async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>, ClientError>;

    async fn fetch_repositories(&self) -> Result<Vec<Repository>, ClientError>;

    async fn fetch_active_pull_requests(
        &self,
        limit: usize,
    ) -> Result<Vec<PullRequest>, ClientError>;

    async fn list_projects(&self) -> Result<Vec<Project>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_queries() {
        assert_eq!(BuildQuery::recent(20).status, None);
        let failed = BuildQuery::failed(15);
        assert_eq!(failed.result.as_deref(), Some("failed"));
        assert_eq!(failed.limit, 15);
        let running = BuildQuery::running(50);
        assert_eq!(running.status.as_deref(), Some("inProgress"));
    }

    #[test]
    fn test_error_messages() {
        let err = ClientError::Status {
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "API error (status 401): unauthorized");
    }
}
