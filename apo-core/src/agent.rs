//! Phrase-matching query interpreter.
//!
//! Free text is matched against an ordered table of case-insensitive
//! patterns; the first intent with a matching pattern wins and is executed
//! against the [`DataSource`].

use std::fmt::Write as _;
use std::sync::Arc;

use regex::Regex;

use crate::model::{Build, Pipeline, Project, PullRequest, Repository, WorkItem};
use crate::source::{BuildQuery, DataSource};

const FAILED_BUILD_LIMIT: usize = 15;
const RUNNING_BUILD_LIMIT: usize = 50;
const RECENT_BUILD_LIMIT: usize = 15;
const ACTIVE_PR_LIMIT: usize = 20;
const TITLE_WIDTH: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Unknown,
    Help,
    MyWorkItems,
    FailedBuilds,
    RunningBuilds,
    RecentBuilds,
    ListPipelines,
    ListRepos,
    ActivePullRequests,
    ListProjects,
}

/// Match order matters: "show failed builds" must hit FailedBuilds before
/// the broader RecentBuilds pattern.
const PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::MyWorkItems,
        &[
            r"(my|assigned to me).*work\s*items?",
            r"what('s| is| are).*assigned to me",
            r"work\s*items?.*assigned to me",
            r"my (tasks?|bugs?|stories?)",
        ],
    ),
    (
        Intent::FailedBuilds,
        &[
            r"failed builds?",
            r"what('s| is| are) (failing|broken)",
            r"build failures?",
        ],
    ),
    (
        Intent::RunningBuilds,
        &[
            r"running builds?",
            r"what('s| is) (running|building)",
            r"active builds?",
        ],
    ),
    (
        Intent::RecentBuilds,
        &[
            r"recent builds?",
            r"build (history|status)",
            r"show.*builds?",
        ],
    ),
    (
        Intent::ListPipelines,
        &[r"(list|show|get).*pipelines?", r"what pipelines?"],
    ),
    (Intent::ListRepos, &[r"(list|show|get).*repo", r"what repo"]),
    (
        Intent::ActivePullRequests,
        &[
            r"(active|open) (pull requests?|prs?)",
            r"(list|show|get).*\b(pull requests?|prs?)\b",
            r"pending (reviews?|prs?)",
            r"\b(pull requests?|prs?)\b.*\b(open|active)\b",
        ],
    ),
    (Intent::ListProjects, &[r"(list|show|get).*projects?"]),
    (Intent::Help, &[r"^help$", r"what can you do"]),
];

/// Example questions offered by the help answer.
pub const HELP_SUGGESTIONS: &[&str] = &[
    "What work items are assigned to me?",
    "Show me failed builds",
    "List all pipelines",
    "What PRs are open?",
];

/// Records returned alongside an answer.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryData {
    WorkItems(Vec<WorkItem>),
    Builds(Vec<Build>),
    Pipelines(Vec<Pipeline>),
    Repositories(Vec<Repository>),
    PullRequests(Vec<PullRequest>),
    Projects(Vec<Project>),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AskResult {
    pub success: bool,
    pub message: String,
    pub suggestions: Vec<String>,
    pub data: Option<QueryData>,
}

impl AskResult {
    fn ok(message: impl Into<String>, data: QueryData) -> Self {
        Self {
            success: true,
            message: message.into(),
            suggestions: Vec::new(),
            data: Some(data),
        }
    }

    fn hint(message: impl Into<String>, suggestions: &[&str]) -> Self {
        Self {
            success: true,
            message: message.into(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            data: None,
        }
    }

    fn error(err: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            message: format!("Error: {}", err),
            ..Default::default()
        }
    }
}

pub struct Agent {
    source: Arc<dyn DataSource>,
    patterns: Vec<(Intent, Vec<Regex>)>,
}

impl Agent {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        let patterns = PATTERNS
            .iter()
            .map(|(intent, exprs)| {
                let compiled = exprs
                    .iter()
                    .filter_map(|expr| match Regex::new(&format!("(?i){}", expr)) {
                        Ok(re) => Some(re),
                        Err(e) => {
                            tracing::warn!(
                                pattern = %expr,
                                error = %e,
                                "skipping invalid intent pattern"
                            );
                            None
                        }
                    })
                    .collect();
                (*intent, compiled)
            })
            .collect();
        Self { source, patterns }
    }

    pub fn match_intent(&self, query: &str) -> Intent {
        self.patterns
            .iter()
            .find(|(_, regexps)| regexps.iter().any(|re| re.is_match(query)))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::Unknown)
    }

    /// Interpret a query and run it. Never fails: errors become a result with
    /// `success == false`.
    pub async fn ask(&self, query: &str) -> AskResult {
        let query = query.trim();
        if query.is_empty() {
            return AskResult::hint("Please ask me something!", &["Try: 'help'"]);
        }
        let intent = self.match_intent(query);
        tracing::debug!(?intent, query, "interpreting query");
        self.execute(intent).await
    }

    async fn execute(&self, intent: Intent) -> AskResult {
        match intent {
            Intent::Help => AskResult::hint(
                "I can help you with Azure DevOps! Try asking:",
                HELP_SUGGESTIONS,
            ),
            Intent::MyWorkItems => match self.source.fetch_my_work_items().await {
                Ok(items) if items.is_empty() => AskResult::ok(
                    "No work items assigned to you.",
                    QueryData::WorkItems(items),
                ),
                Ok(items) => AskResult::ok(
                    format!("Found {} work item(s):", items.len()),
                    QueryData::WorkItems(items),
                ),
                Err(e) => AskResult::error(e),
            },
            Intent::FailedBuilds => {
                match self
                    .source
                    .fetch_builds(&BuildQuery::failed(FAILED_BUILD_LIMIT))
                    .await
                {
                    Ok(builds) if builds.is_empty() => {
                        AskResult::ok("No failed builds! 🎉", QueryData::Builds(builds))
                    }
                    Ok(builds) => AskResult::ok(
                        format!("Found {} failed build(s):", builds.len()),
                        QueryData::Builds(builds),
                    ),
                    Err(e) => AskResult::error(e),
                }
            }
            Intent::RunningBuilds => {
                match self
                    .source
                    .fetch_builds(&BuildQuery::running(RUNNING_BUILD_LIMIT))
                    .await
                {
                    Ok(builds) if builds.is_empty() => {
                        AskResult::ok("No builds currently running.", QueryData::Builds(builds))
                    }
                    Ok(builds) => AskResult::ok(
                        format!("Found {} running build(s):", builds.len()),
                        QueryData::Builds(builds),
                    ),
                    Err(e) => AskResult::error(e),
                }
            }
            Intent::RecentBuilds => {
                match self
                    .source
                    .fetch_builds(&BuildQuery::recent(RECENT_BUILD_LIMIT))
                    .await
                {
                    Ok(builds) => AskResult::ok(
                        format!("Found {} recent build(s):", builds.len()),
                        QueryData::Builds(builds),
                    ),
                    Err(e) => AskResult::error(e),
                }
            }
            Intent::ListPipelines => match self.source.fetch_pipelines().await {
                Ok(pipelines) => AskResult::ok(
                    format!("Found {} pipeline(s):", pipelines.len()),
                    QueryData::Pipelines(pipelines),
                ),
                Err(e) => AskResult::error(e),
            },
            Intent::ListRepos => match self.source.fetch_repositories().await {
                Ok(repos) => AskResult::ok(
                    format!("Found {} repository(ies):", repos.len()),
                    QueryData::Repositories(repos),
                ),
                Err(e) => AskResult::error(e),
            },
            Intent::ActivePullRequests => {
                match self
                    .source
                    .fetch_active_pull_requests(ACTIVE_PR_LIMIT)
                    .await
                {
                    Ok(prs) if prs.is_empty() => {
                        AskResult::ok("No active pull requests.", QueryData::PullRequests(prs))
                    }
                    Ok(prs) => AskResult::ok(
                        format!("Found {} active PR(s):", prs.len()),
                        QueryData::PullRequests(prs),
                    ),
                    Err(e) => AskResult::error(e),
                }
            }
            Intent::ListProjects => match self.source.list_projects().await {
                Ok(projects) => AskResult::ok(
                    format!("Found {} project(s):", projects.len()),
                    QueryData::Projects(projects),
                ),
                Err(e) => AskResult::error(e),
            },
            Intent::Unknown => AskResult::hint(
                "I'm not sure what you're asking.",
                &["Try: 'help' to see what I can do"],
            ),
        }
    }
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// One line per record, each indented by two spaces and newline-terminated.
pub fn format_result(data: &QueryData) -> String {
    let mut out = String::new();
    match data {
        QueryData::WorkItems(items) => {
            for item in items {
                let _ = writeln!(
                    out,
                    "  {} #{} {} [{}]",
                    item.icon(),
                    item.id,
                    clip(&item.title(), TITLE_WIDTH),
                    item.state()
                );
            }
        }
        QueryData::Builds(builds) => {
            for b in builds {
                let name = &b.definition.name;
                let _ = writeln!(out, "  {} #{} {}", b.icon(), b.build_number, name);
            }
        }
        QueryData::Pipelines(pipelines) => {
            for p in pipelines {
                let _ = writeln!(out, "  🔧 [{}] {}", p.id, p.full_path());
            }
        }
        QueryData::Repositories(repos) => {
            for r in repos {
                let _ = writeln!(out, "  📁 {} ({})", r.name, r.default_branch_name());
            }
        }
        QueryData::PullRequests(prs) => {
            for pr in prs {
                let _ = writeln!(
                    out,
                    "  {} #{} {}",
                    pr.icon(),
                    pr.pull_request_id,
                    clip(&pr.title, TITLE_WIDTH)
                );
            }
        }
        QueryData::Projects(projects) => {
            for p in projects {
                let _ = writeln!(out, "  📦 {}", p.name);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ClientError;
    use async_trait::async_trait;

    #[derive(Default)]
    struct StubSource {
        fail: bool,
        pipelines: Vec<Pipeline>,
    }

    #[async_trait]
    impl DataSource for StubSource {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_my_work_items(&self) -> Result<Vec<WorkItem>, ClientError> {
            Ok(vec![])
        }

        async fn fetch_builds(&self, query: &BuildQuery) -> Result<Vec<Build>, ClientError> {
            if self.fail {
                return Err(ClientError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }
            let result = query.result.clone().unwrap_or_else(|| "succeeded".into());
            Ok(vec![Build {
                id: 1,
                build_number: "101".into(),
                result,
                ..Default::default()
            }])
        }

        async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>, ClientError> {
            Ok(self.pipelines.clone())
        }

        async fn fetch_repositories(&self) -> Result<Vec<Repository>, ClientError> {
            Ok(vec![])
        }

        async fn fetch_active_pull_requests(
            &self,
            _limit: usize,
        ) -> Result<Vec<PullRequest>, ClientError> {
            Ok(vec![])
        }

        async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
            Ok(vec![])
        }
    }

    fn agent(source: StubSource) -> Agent {
        Agent::new(Arc::new(source))
    }

    #[test]
    fn test_intent_matching() {
        let agent = agent(StubSource::default());
        let cases = [
            ("What work items are assigned to me?", Intent::MyWorkItems),
            ("show me FAILED builds", Intent::FailedBuilds),
            ("what's running", Intent::RunningBuilds),
            ("show builds", Intent::RecentBuilds),
            ("list all pipelines", Intent::ListPipelines),
            ("get repos", Intent::ListRepos),
            ("open PRs", Intent::ActivePullRequests),
            ("show pull requests", Intent::ActivePullRequests),
            ("What PRs are open?", Intent::ActivePullRequests),
            ("list projects", Intent::ListProjects),
            ("help", Intent::Help),
            ("make coffee", Intent::Unknown),
        ];
        for (query, intent) in cases {
            assert_eq!(agent.match_intent(query), intent, "{}", query);
        }
    }

    #[test]
    fn test_help_suggestions_are_understood() {
        let agent = agent(StubSource::default());
        let expected = [
            Intent::MyWorkItems,
            Intent::FailedBuilds,
            Intent::ListPipelines,
            Intent::ActivePullRequests,
        ];
        assert_eq!(HELP_SUGGESTIONS.len(), expected.len());
        for (query, intent) in HELP_SUGGESTIONS.iter().zip(expected) {
            assert_eq!(agent.match_intent(query), intent, "{}", query);
        }
    }

    #[tokio::test]
    async fn test_empty_query() {
        let result = agent(StubSource::default()).ask("   ").await;
        assert!(result.success);
        assert_eq!(result.message, "Please ask me something!");
        assert_eq!(result.suggestions, vec!["Try: 'help'"]);
    }

    #[tokio::test]
    async fn test_unknown_query_suggests_help() {
        let result = agent(StubSource::default()).ask("make coffee").await;
        assert!(result.success);
        assert!(result.data.is_none());
        assert_eq!(result.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_builds_query() {
        let result = agent(StubSource::default()).ask("failed builds").await;
        assert_eq!(result.message, "Found 1 failed build(s):");
        match result.data {
            Some(QueryData::Builds(builds)) => assert_eq!(builds[0].result, "failed"),
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_errors_become_failed_results() {
        let source = StubSource {
            fail: true,
            ..Default::default()
        };
        let result = agent(source).ask("recent builds").await;
        assert!(!result.success);
        assert_eq!(result.message, "Error: API error (status 500): boom");
    }

    #[tokio::test]
    async fn test_empty_collections() {
        let agent = agent(StubSource::default());
        assert_eq!(
            agent.ask("my work items").await.message,
            "No work items assigned to you."
        );
        assert_eq!(
            agent.ask("pending reviews").await.message,
            "No active pull requests."
        );
        assert_eq!(
            agent.ask("list pipelines").await.message,
            "Found 0 pipeline(s):"
        );
    }

    #[test]
    fn test_format_result_lines() {
        let data = QueryData::Pipelines(vec![Pipeline {
            id: 4,
            name: "deploy".into(),
            folder: "infra".into(),
        }]);
        assert_eq!(format_result(&data), "  🔧 [4] infra/deploy\n");

        let long = "x".repeat(80);
        let prs = QueryData::PullRequests(vec![PullRequest {
            pull_request_id: 9,
            title: long,
            is_draft: true,
            ..Default::default()
        }]);
        let line = format_result(&prs);
        assert!(line.starts_with("  📝 #9 "));
        assert!(line.trim_end().ends_with("..."));
        let prefix = "  📝 #9 ".chars().count();
        assert_eq!(line.trim_end().chars().count(), prefix + 50);
    }
}
