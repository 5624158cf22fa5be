//! Azure DevOps REST client.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;

use apo_core::config::{Config, DEFAULT_TIMEOUT};
use apo_core::model::{
    Build, ListEnvelope, Pipeline, Project, PullRequest, Repository, WiqlResult, WorkItem,
};
use apo_core::source::{BuildQuery, ClientError, DataSource};

const MY_WORK_ITEMS_WIQL: &str = "SELECT [System.Id] FROM WorkItems \
     WHERE [System.AssignedTo] = @Me \
     AND [System.State] <> 'Closed' \
     AND [System.State] <> 'Removed' \
     ORDER BY [System.ChangedDate] DESC";

pub struct AzureClient {
    http: reqwest::Client,
    base_url: String,
    organization: String,
    project: String,
    pat: String,
    api_version: String,
}

impl AzureClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::NotConfigured(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            organization: config.organization.clone(),
            project: config.project.clone(),
            pat: config.pat.clone(),
            api_version: config.api_version.clone(),
        })
    }

    fn project_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, self.organization, self.project, path
        )
    }

    fn org_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.organization, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        params: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        tracing::debug!(%method, %url, "azure request");

        let mut request = self
            .http
            .request(method, &url)
            .basic_auth("", Some(&self.pat))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("api-version", self.api_version.as_str())])
            .query(params);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        url: String,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ClientError> {
        let envelope: ListEnvelope<T> = self.send(Method::GET, url, params, None).await?;
        Ok(envelope.value)
    }
}

pub fn build_params(query: &BuildQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(status) = &query.status {
        params.push(("statusFilter", status.clone()));
    }
    if let Some(result) = &query.result {
        params.push(("resultFilter", result.clone()));
    }
    if query.limit > 0 {
        params.push(("$top", query.limit.to_string()));
    }
    params
}

#[async_trait]
impl DataSource for AzureClient {
    fn name(&self) -> &'static str {
        "azure-devops"
    }

    async fn fetch_my_work_items(&self) -> Result<Vec<WorkItem>, ClientError> {
        let wiql: WiqlResult = self
            .send(
                Method::POST,
                self.project_url("_apis/wit/wiql"),
                &[],
                Some(serde_json::json!({ "query": MY_WORK_ITEMS_WIQL })),
            )
            .await?;

        if wiql.work_items.is_empty() {
            return Ok(Vec::new());
        }

        let ids = wiql
            .work_items
            .iter()
            .map(|r| r.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.get_list(self.project_url("_apis/wit/workitems"), &[("ids", ids)])
            .await
    }

    async fn fetch_builds(&self, query: &BuildQuery) -> Result<Vec<Build>, ClientError> {
        self.get_list(self.project_url("_apis/build/builds"), &build_params(query))
            .await
    }

    async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>, ClientError> {
        self.get_list(self.project_url("_apis/pipelines"), &[])
            .await
    }

    async fn fetch_repositories(&self) -> Result<Vec<Repository>, ClientError> {
        self.get_list(self.project_url("_apis/git/repositories"), &[])
            .await
    }

    async fn fetch_active_pull_requests(
        &self,
        limit: usize,
    ) -> Result<Vec<PullRequest>, ClientError> {
        let mut params = vec![("searchCriteria.status", "active".to_string())];
        if limit > 0 {
            params.push(("$top", limit.to_string()));
        }
        self.get_list(self.project_url("_apis/git/pullrequests"), &params)
            .await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        self.get_list(self.org_url("_apis/projects"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            organization: "contoso".into(),
            project: "web".into(),
            pat: "secret".into(),
            api_url: "https://dev.azure.com/".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_urls() {
        let client = AzureClient::new(&config()).unwrap();
        assert_eq!(
            client.project_url("_apis/pipelines"),
            "https://dev.azure.com/contoso/web/_apis/pipelines"
        );
        assert_eq!(
            client.org_url("_apis/projects"),
            "https://dev.azure.com/contoso/_apis/projects"
        );
        assert_eq!(client.name(), "azure-devops");
    }

    #[test]
    fn test_requires_credentials() {
        let mut cfg = config();
        cfg.pat.clear();
        assert!(matches!(
            AzureClient::new(&cfg),
            Err(ClientError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_build_params() {
        assert_eq!(
            build_params(&BuildQuery::failed(15)),
            vec![
                ("statusFilter", "completed".to_string()),
                ("resultFilter", "failed".to_string()),
                ("$top", "15".to_string()),
            ]
        );
        assert!(build_params(&BuildQuery::recent(0)).is_empty());
    }
}
