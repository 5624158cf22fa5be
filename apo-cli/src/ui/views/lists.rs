use apo_core::model::{Pipeline, PullRequest, Repository, WorkItem};
use apo_core::state::DataSnapshot;

use super::{View, ViewId};
use crate::terminal::Key;
use crate::ui::frame::Frame;
use crate::ui::widgets::{List, ListItem};

const LIST_COL: u16 = 2;

/// A filterable list over one snapshot category.
///
/// Items are rebuilt from the snapshot whenever its refresh generation moves
/// on. Enter is left to the controller, which opens a detail view for the
/// categories that have one.
pub struct ListView<T> {
    id: ViewId,
    title: &'static str,
    list: List<T>,
    build: fn(&DataSnapshot) -> Vec<ListItem<T>>,
    synced: Option<u64>,
}

impl<T: Clone> ListView<T> {
    fn new(
        id: ViewId,
        title: &'static str,
        list_title: &'static str,
        build: fn(&DataSnapshot) -> Vec<ListItem<T>>,
    ) -> Self {
        Self {
            id,
            title,
            list: List::new(list_title),
            build,
            synced: None,
        }
    }

    /// Pull fresh items if the snapshot has changed since the last sync.
    pub fn sync(&mut self, snapshot: &DataSnapshot) {
        if self.synced != Some(snapshot.generation) {
            self.list.set_items((self.build)(snapshot));
            self.synced = Some(snapshot.generation);
        }
    }

    pub fn selected(&self) -> Option<&T> {
        self.list.selected_item().map(|item| &item.data)
    }

    #[cfg(test)]
    pub fn list(&self) -> &List<T> {
        &self.list
    }
}

impl ListView<WorkItem> {
    pub fn boards() -> Self {
        Self::new(ViewId::Boards, "Boards", "📋 Work Items", |snapshot| {
            snapshot
                .work_items
                .iter()
                .map(|item| ListItem {
                    id: item.id.to_string(),
                    icon: item.icon(),
                    label: format!("#{} {} [{}]", item.id, item.title(), item.state()),
                    sublabel: None,
                    data: item.clone(),
                })
                .collect()
        })
    }
}

impl ListView<Pipeline> {
    pub fn pipelines() -> Self {
        Self::new(ViewId::Pipelines, "Pipelines", "🔧 Pipelines", |snapshot| {
            snapshot
                .pipelines
                .iter()
                .map(|p| ListItem {
                    id: p.id.to_string(),
                    icon: "🔧",
                    label: format!("[{}] {}", p.id, p.full_path()),
                    sublabel: None,
                    data: p.clone(),
                })
                .collect()
        })
    }
}

impl ListView<Repository> {
    pub fn repos() -> Self {
        Self::new(ViewId::Repos, "Repos", "📁 Repositories", |snapshot| {
            snapshot
                .repositories
                .iter()
                .map(|r| ListItem {
                    id: r.id.clone(),
                    icon: "📁",
                    label: format!("{} ({})", r.name, r.default_branch_name()),
                    sublabel: Some(r.size_formatted()),
                    data: r.clone(),
                })
                .collect()
        })
    }
}

impl ListView<PullRequest> {
    pub fn pull_requests() -> Self {
        Self::new(ViewId::PullRequests, "PRs", "🔀 Pull Requests", |snapshot| {
            snapshot
                .pull_requests
                .iter()
                .map(|pr| ListItem {
                    id: pr.pull_request_id.to_string(),
                    icon: pr.icon(),
                    label: format!(
                        "#{} {} ({}→{})",
                        pr.pull_request_id,
                        pr.title,
                        pr.source_branch(),
                        pr.target_branch()
                    ),
                    sublabel: None,
                    data: pr.clone(),
                })
                .collect()
        })
    }
}

impl<T: Clone> View for ListView<T> {
    fn id(&self) -> ViewId {
        self.id
    }

    fn title(&self) -> &str {
        self.title
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        snapshot: &DataSnapshot,
        start_row: u16,
        width: u16,
        height: u16,
    ) {
        self.sync(snapshot);
        self.list.render(frame, start_row, LIST_COL, width, height);
    }

    fn handle_key(&mut self, key: Key) -> bool {
        self.list.handle_key(key)
    }

    fn is_filter_mode(&self) -> bool {
        self.list.is_filter_mode()
    }
}
