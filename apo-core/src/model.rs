//! Azure DevOps records as returned by the REST API.
//!
//! Field names follow the wire format (camelCase). Only the fields the
//! dashboard renders are modelled; everything else is ignored on decode.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type WorkItemId = u64;

const BRANCH_PREFIX: &str = "refs/heads/";

fn short_branch(reference: &str) -> &str {
    reference.strip_prefix(BRANCH_PREFIX).unwrap_or(reference)
}

/// A user identity (creator, requester, assignee).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub unique_name: String,
}

impl Identity {
    pub fn short_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.unique_name
        } else {
            &self.display_name
        }
    }
}

/// A work item: everything interesting lives in the loosely typed `fields` map.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub rev: u32,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub url: String,
}

impl WorkItem {
    /// Read a field as text. Identity fields resolve to their display name.
    pub fn field(&self, name: &str) -> String {
        match self.fields.get(name) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Object(map)) => map
                .get("displayName")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }

    pub fn title(&self) -> String {
        self.field("System.Title")
    }

    pub fn state(&self) -> String {
        self.field("System.State")
    }

    pub fn kind(&self) -> String {
        self.field("System.WorkItemType")
    }

    pub fn assigned_to(&self) -> String {
        self.field("System.AssignedTo")
    }

    pub fn created_date(&self) -> String {
        self.field("System.CreatedDate")
    }

    pub fn description(&self) -> String {
        self.field("System.Description")
    }

    pub fn icon(&self) -> &'static str {
        match self.kind().to_lowercase().as_str() {
            "bug" => "🐛",
            "user story" | "story" => "📖",
            "task" => "✅",
            "epic" => "🏔️",
            "feature" => "⭐",
            _ => "📋",
        }
    }

    pub fn state_icon(&self) -> &'static str {
        match self.state().to_lowercase().as_str() {
            "new" => "🆕",
            "active" | "in progress" => "🔄",
            "resolved" => "✔️",
            "closed" | "done" => "✅",
            _ => "•",
        }
    }
}

/// Reference returned by a WIQL query; the full item is fetched in a batch.
#[derive(Clone, Debug, Deserialize)]
pub struct WorkItemRef {
    pub id: WorkItemId,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WiqlResult {
    pub work_items: Vec<WorkItemRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildDefinition {
    pub id: u64,
    pub name: String,
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Build {
    pub id: u64,
    pub build_number: String,
    /// notStarted, inProgress, completed
    pub status: String,
    /// succeeded, failed, canceled (empty while running)
    pub result: String,
    pub queue_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub definition: BuildDefinition,
    pub requested_by: Identity,
    pub source_branch: String,
}

impl Build {
    pub fn icon(&self) -> &'static str {
        match self.result.to_lowercase().as_str() {
            "succeeded" => "✅",
            "failed" => "❌",
            "canceled" => "⏹️",
            _ => "🔄",
        }
    }

    pub fn branch(&self) -> &str {
        short_branch(&self.source_branch)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pipeline {
    pub id: u64,
    pub name: String,
    pub folder: String,
}

impl Pipeline {
    /// Folder-qualified name; the root folder is reported as `\` or `/`.
    pub fn full_path(&self) -> String {
        match self.folder.as_str() {
            "" | "\\" | "/" => self.name.clone(),
            folder => format!("{}/{}", folder, self.name),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub state: String,
    pub visibility: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub remote_url: String,
    pub web_url: String,
    pub default_branch: String,
    /// Size in kilobytes as reported by the service.
    pub size: u64,
}

impl Repository {
    pub fn default_branch_name(&self) -> &str {
        short_branch(&self.default_branch)
    }

    pub fn size_formatted(&self) -> String {
        if self.size < 1024 {
            return format!("{} KB", self.size);
        }
        let mb = self.size as f64 / 1024.0;
        if mb < 1024.0 {
            format!("{:.1} MB", mb)
        } else {
            format!("{:.2} GB", mb / 1024.0)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepoRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reviewer {
    pub id: String,
    pub display_name: String,
    pub unique_name: String,
    /// 10 approved, 5 approved with suggestions, 0 no vote, -5 waiting, -10 rejected
    pub vote: i32,
}

impl Reviewer {
    pub fn vote_status(&self) -> &'static str {
        match self.vote {
            10 => "Approved",
            5 => "Approved with suggestions",
            0 => "No vote",
            -5 => "Waiting for author",
            -10 => "Rejected",
            _ => "Unknown",
        }
    }

    pub fn vote_icon(&self) -> &'static str {
        match self.vote {
            10 => "✅",
            5 => "👍",
            0 => "⏳",
            -5 => "⏸️",
            -10 => "❌",
            _ => "•",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PullRequest {
    pub pull_request_id: u64,
    pub title: String,
    pub description: String,
    /// active, abandoned, completed
    pub status: String,
    pub created_by: Identity,
    pub creation_date: Option<DateTime<Utc>>,
    pub source_ref_name: String,
    pub target_ref_name: String,
    pub merge_status: String,
    pub is_draft: bool,
    pub repository: RepoRef,
    pub reviewers: Vec<Reviewer>,
}

impl PullRequest {
    pub fn source_branch(&self) -> &str {
        short_branch(&self.source_ref_name)
    }

    pub fn target_branch(&self) -> &str {
        short_branch(&self.target_ref_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    pub fn icon(&self) -> &'static str {
        if self.is_draft { "📝" } else { "🔀" }
    }
}

/// The `{count, value}` envelope wrapping every collection response.
#[derive(Clone, Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListEnvelope<T> {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub value: Vec<T>,
}
