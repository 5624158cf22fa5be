use apo_core::state::DataSnapshot;

use super::{View, ViewId};
use crate::terminal::Key;
use crate::ui::frame::Frame;
use crate::ui::style::{Attr, style, truncate};

/// Overview: my work items and recent builds side by side, active pull
/// requests below.
#[derive(Debug, Default)]
pub struct DashboardView;

impl DashboardView {
    pub fn new() -> Self {
        Self
    }
}

fn heading(frame: &mut Frame, row: u16, col: u16, text: &str) {
    frame.print_at(row, col, &style(text, &[Attr::Bold, Attr::FgYellow]));
}

fn placeholder(frame: &mut Frame, row: u16, col: u16, text: &str) {
    frame.print_at(row, col, &style(text, &[Attr::Dim]));
}

impl View for DashboardView {
    fn id(&self) -> ViewId {
        ViewId::Dashboard
    }

    fn title(&self) -> &str {
        "Dashboard"
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        snapshot: &DataSnapshot,
        start_row: u16,
        width: u16,
        height: u16,
    ) {
        let col_width = width.saturating_sub(4) / 2;
        let half = height.saturating_sub(2) / 2;
        let label_width = col_width.saturating_sub(15) as usize;
        let right_col = col_width + 3;
        let per_column = half.saturating_sub(1) as usize;

        heading(frame, start_row, 2, "📋 My Work Items");
        let mut row = start_row + 1;
        for item in snapshot.work_items.iter().take(per_column) {
            let title = truncate(&item.title(), label_width);
            let line = format!("{} #{} {}", item.icon(), item.id, title);
            frame.print_at(row, 2, &line);
            row += 1;
        }
        if snapshot.work_items.is_empty() {
            placeholder(frame, row, 4, "No work items");
        }

        heading(frame, start_row, right_col, "🔧 Recent Builds");
        row = start_row + 1;
        for build in snapshot.builds.iter().take(per_column) {
            let line = format!(
                "{} #{} {}",
                build.icon(),
                build.build_number,
                truncate(&build.definition.name, label_width)
            );
            frame.print_at(row, right_col, &line);
            row += 1;
        }
        if snapshot.builds.is_empty() {
            placeholder(frame, row, right_col + 2, "No builds");
        }

        heading(frame, start_row + half + 1, 2, "🔀 Active Pull Requests");
        row = start_row + half + 2;
        let pr_rows = half.saturating_sub(2) as usize;
        for pr in snapshot.pull_requests.iter().take(pr_rows) {
            let line = format!(
                "{} #{} {}",
                pr.icon(),
                pr.pull_request_id,
                truncate(&pr.title, width.saturating_sub(20) as usize)
            );
            frame.print_at(row, 2, &line);
            row += 1;
        }
        if snapshot.pull_requests.is_empty() {
            placeholder(frame, row, 4, "No active PRs");
        }

        if snapshot.has_failures() {
            let failed: Vec<&str> = snapshot.failed.iter().map(|c| c.label()).collect();
            let warning = format!("⚠ Could not refresh: {}", failed.join(", "));
            placeholder(
                frame,
                start_row + height.saturating_sub(1),
                2,
                &truncate(&warning, width.saturating_sub(4) as usize),
            );
        }
    }

    fn handle_key(&mut self, _key: Key) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apo_core::model::{Build, BuildDefinition, PullRequest};
    use apo_core::state::DataCategory;

    #[test]
    fn test_empty_placeholders() {
        let mut frame = Frame::new(40, 120);
        DashboardView::new().render(&mut frame, &DataSnapshot::new(), 5, 120, 33);
        let text = frame.plain_text();
        assert!(text.contains("No work items"));
        assert!(text.contains("No builds"));
        assert!(text.contains("No active PRs"));
        assert!(!text.contains("Could not refresh"));
    }

    #[test]
    fn test_sections_and_failures() {
        let mut snapshot = DataSnapshot::new();
        snapshot.builds = vec![Build {
            build_number: "20240301.4".into(),
            result: "failed".into(),
            definition: BuildDefinition {
                name: "web-ci".into(),
                ..Default::default()
            },
            ..Default::default()
        }];
        snapshot.pull_requests = vec![PullRequest {
            pull_request_id: 12,
            title: "Cache tokens".into(),
            ..Default::default()
        }];
        snapshot.failed.insert(DataCategory::WorkItems);

        let mut frame = Frame::new(40, 120);
        DashboardView::new().render(&mut frame, &snapshot, 5, 120, 33);
        let text = frame.plain_text();
        assert!(text.contains("❌ #20240301.4 web-ci"));
        assert!(text.contains("🔀 #12 Cache tokens"));
        assert!(text.contains("⚠ Could not refresh: work items"));
    }

    #[test]
    fn test_ignores_keys() {
        assert!(!DashboardView::new().handle_key(Key::Enter));
    }
}
