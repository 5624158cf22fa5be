//! Views and the registry the controller switches between.

mod copilot;
mod dashboard;
mod details;
mod lists;

use apo_core::model::{Pipeline, PullRequest, Repository, WorkItem};
use apo_core::state::DataSnapshot;

use crate::query::QueryService;
use crate::terminal::{CursorControl, Key};
use crate::ui::frame::Frame;

pub use copilot::CopilotView;
pub use dashboard::DashboardView;
pub use details::{DetailContext, PrDetailView, WorkItemDetailView};
pub use lists::ListView;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewId {
    Dashboard,
    Boards,
    Pipelines,
    Repos,
    PullRequests,
    Copilot,
    WorkItemDetail,
    PrDetail,
}

impl ViewId {
    pub fn is_detail(self) -> bool {
        matches!(self, ViewId::WorkItemDetail | ViewId::PrDetail)
    }

    /// Global shortcut keys for the top-level views.
    pub fn from_shortcut(c: char) -> Option<ViewId> {
        match c {
            '1' => Some(ViewId::Dashboard),
            '2' => Some(ViewId::Boards),
            '3' => Some(ViewId::Pipelines),
            '4' => Some(ViewId::Repos),
            '5' => Some(ViewId::PullRequests),
            '/' | ':' => Some(ViewId::Copilot),
            _ => None,
        }
    }
}

pub trait View {
    fn id(&self) -> ViewId;

    fn title(&self) -> &str;

    /// Draw into the content rectangle starting at `start_row`, spanning the
    /// full `width` and `height` rows. Called with the snapshot read lock held.
    fn render(
        &mut self,
        frame: &mut Frame,
        snapshot: &DataSnapshot,
        start_row: u16,
        width: u16,
        height: u16,
    );

    /// Returns true when the key was consumed.
    fn handle_key(&mut self, key: Key) -> bool;

    fn on_enter(&mut self, _cursor: &mut dyn CursorControl) {}

    fn on_exit(&mut self, _cursor: &mut dyn CursorControl) {}

    fn is_filter_mode(&self) -> bool {
        false
    }
}

/// Owns one instance of every view.
pub struct Views {
    dashboard: DashboardView,
    boards: ListView<WorkItem>,
    pipelines: ListView<Pipeline>,
    repos: ListView<Repository>,
    pull_requests: ListView<PullRequest>,
    copilot: CopilotView,
    work_item_detail: WorkItemDetailView,
    pr_detail: PrDetailView,
}

impl Views {
    pub fn new(context: DetailContext, query: Box<dyn QueryService>) -> Self {
        Self {
            dashboard: DashboardView::new(),
            boards: ListView::boards(),
            pipelines: ListView::pipelines(),
            repos: ListView::repos(),
            pull_requests: ListView::pull_requests(),
            copilot: CopilotView::new(query),
            work_item_detail: WorkItemDetailView::new(context.clone()),
            pr_detail: PrDetailView::new(context),
        }
    }

    pub fn get(&self, id: ViewId) -> &dyn View {
        match id {
            ViewId::Dashboard => &self.dashboard,
            ViewId::Boards => &self.boards,
            ViewId::Pipelines => &self.pipelines,
            ViewId::Repos => &self.repos,
            ViewId::PullRequests => &self.pull_requests,
            ViewId::Copilot => &self.copilot,
            ViewId::WorkItemDetail => &self.work_item_detail,
            ViewId::PrDetail => &self.pr_detail,
        }
    }

    pub fn get_mut(&mut self, id: ViewId) -> &mut dyn View {
        match id {
            ViewId::Dashboard => &mut self.dashboard,
            ViewId::Boards => &mut self.boards,
            ViewId::Pipelines => &mut self.pipelines,
            ViewId::Repos => &mut self.repos,
            ViewId::PullRequests => &mut self.pull_requests,
            ViewId::Copilot => &mut self.copilot,
            ViewId::WorkItemDetail => &mut self.work_item_detail,
            ViewId::PrDetail => &mut self.pr_detail,
        }
    }

    pub fn selected_work_item(&self) -> Option<&WorkItem> {
        self.boards.selected()
    }

    pub fn selected_pull_request(&self) -> Option<&PullRequest> {
        self.pull_requests.selected()
    }

    pub fn show_work_item(&mut self, item: WorkItem) {
        self.work_item_detail.set_work_item(item);
    }

    pub fn show_pull_request(&mut self, pr: PullRequest) {
        self.pr_detail.set_pull_request(pr);
    }
}
