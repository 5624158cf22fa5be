//! Read-only detail pages for a single work item or pull request.

use chrono::{DateTime, Utc};

use apo_core::model::{PullRequest, WorkItem};
use apo_core::state::DataSnapshot;

use super::{View, ViewId};
use crate::terminal::Key;
use crate::ui::frame::Frame;
use crate::ui::style::{Attr, display_width, style, truncate};

/// Organization and project used to build web links.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetailContext {
    pub organization: String,
    pub project: String,
}

impl DetailContext {
    pub fn work_item_url(&self, id: u64) -> String {
        format!(
            "https://dev.azure.com/{}/{}/_workitems/edit/{}",
            self.organization, self.project, id
        )
    }

    pub fn pull_request_url(&self, repository: &str, id: u64) -> String {
        format!(
            "https://dev.azure.com/{}/{}/_git/{}/pullrequest/{}",
            self.organization, self.project, repository, id
        )
    }
}

pub struct WorkItemDetailView {
    context: DetailContext,
    item: Option<WorkItem>,
}

impl WorkItemDetailView {
    pub fn new(context: DetailContext) -> Self {
        Self {
            context,
            item: None,
        }
    }

    pub fn set_work_item(&mut self, item: WorkItem) {
        self.item = Some(item);
    }
}

fn section_rule(frame: &mut Frame, row: u16, label: &str, width: u16) {
    frame.print_at(row, 2, &style(label, &[Attr::Dim]));
    let rule = "─".repeat(width.saturating_sub(20) as usize);
    frame.print(&style(&rule, &[Attr::Dim]));
}

fn url_line(frame: &mut Frame, row: u16, url: &str, width: u16) {
    let text = format!("URL: {}", truncate(url, width.saturating_sub(10) as usize));
    frame.print_at(row, 2, &style(&text, &[Attr::Dim]));
}

impl View for WorkItemDetailView {
    fn id(&self) -> ViewId {
        ViewId::WorkItemDetail
    }

    fn title(&self) -> &str {
        "Work Item"
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        _snapshot: &DataSnapshot,
        start_row: u16,
        width: u16,
        height: u16,
    ) {
        let Some(item) = &self.item else {
            return;
        };
        let header = format!("{} {} #{}", item.icon(), item.kind(), item.id);
        frame.print_at(start_row, 2, &style(&header, &[Attr::Bold, Attr::FgCyan]));
        let title = truncate(&item.title(), width.saturating_sub(4) as usize);
        frame.print_at(start_row + 2, 2, &style(&title, &[Attr::Bold]));

        let state = item.state();
        frame.print_at(start_row + 4, 2, &style("State: ", &[Attr::Dim]));
        frame.print(&style(
            &format!("{} {}", item.state_icon(), state),
            &[Attr::Bold, Attr::FgYellow],
        ));

        let row = start_row + 6;
        frame.print_at(row, 2, &style("Assigned To: ", &[Attr::Dim]));
        frame.print(&truncate(&item.assigned_to(), 30));
        frame.print_at(row, width / 2, &style("Created: ", &[Attr::Dim]));
        frame.print(&format_date(&item.created_date()));

        let desc_row = start_row + 9;
        section_rule(frame, desc_row, "─── Description ", width);

        let description = strip_html(&item.description());
        if description.is_empty() {
            frame.print_at(desc_row + 1, 4, &style("No description.", &[Attr::Dim]));
        } else {
            let bottom = start_row + height.saturating_sub(2);
            let lines = wrap_text(&description, width.saturating_sub(6) as usize);
            for (row, line) in (desc_row + 1..bottom).zip(lines.iter()) {
                frame.print_at(row, 4, line);
            }
        }

        let url = self.context.work_item_url(item.id);
        url_line(frame, start_row + height.saturating_sub(2), &url, width);
    }

    /// Back navigation is the controller's job.
    fn handle_key(&mut self, _key: Key) -> bool {
        false
    }
}

pub struct PrDetailView {
    context: DetailContext,
    pr: Option<PullRequest>,
}

impl PrDetailView {
    pub fn new(context: DetailContext) -> Self {
        Self { context, pr: None }
    }

    pub fn set_pull_request(&mut self, pr: PullRequest) {
        self.pr = Some(pr);
    }
}

impl View for PrDetailView {
    fn id(&self) -> ViewId {
        ViewId::PrDetail
    }

    fn title(&self) -> &str {
        "Pull Request"
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        _snapshot: &DataSnapshot,
        start_row: u16,
        width: u16,
        height: u16,
    ) {
        let Some(pr) = &self.pr else {
            return;
        };

        let header = format!("{} Pull Request #{}", pr.icon(), pr.pull_request_id);
        frame.print_at(start_row, 2, &style(&header, &[Attr::Bold, Attr::FgCyan]));
        let title = truncate(&pr.title, width.saturating_sub(4) as usize);
        frame.print_at(start_row + 2, 2, &style(&title, &[Attr::Bold]));

        let status_color = if pr.status == "abandoned" {
            Attr::FgRed
        } else {
            Attr::FgGreen
        };
        frame.print_at(start_row + 4, 2, &style("Status: ", &[Attr::Dim]));
        let status = pr.status.to_uppercase();
        frame.print(&style(&status, &[Attr::Bold, status_color]));

        frame.print_at(start_row + 6, 2, &style("Branch: ", &[Attr::Dim]));
        frame.print(&style(pr.source_branch(), &[Attr::FgCyan]));
        frame.print(&style(" → ", &[Attr::Dim]));
        frame.print(&style(pr.target_branch(), &[Attr::FgGreen]));

        frame.print_at(start_row + 8, 2, &style("Created By: ", &[Attr::Dim]));
        frame.print(pr.created_by.short_name());
        frame.print_at(start_row + 8, width / 2, &style("Created: ", &[Attr::Dim]));
        frame.print(&format_timestamp(pr.creation_date));

        let rev_row = start_row + 10;
        section_rule(frame, rev_row, "─── Reviewers ", width);

        if pr.reviewers.is_empty() {
            frame.print_at(rev_row + 1, 4, &style("No reviewers", &[Attr::Dim]));
        } else {
            let bottom = start_row + height.saturating_sub(4);
            for (row, reviewer) in (rev_row + 1..bottom).zip(pr.reviewers.iter()) {
                let line = format!(
                    "{} {} - {}",
                    reviewer.vote_icon(),
                    reviewer.display_name,
                    reviewer.vote_status()
                );
                frame.print_at(row, 4, &line);
            }
        }

        let context = &self.context;
        let url = context.pull_request_url(&pr.repository.name, pr.pull_request_id);
        url_line(frame, start_row + height.saturating_sub(2), &url, width);
    }

    fn handle_key(&mut self, _key: Key) -> bool {
        false
    }
}

/// Drop tags and decode the two entities the service commonly emits.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Greedy word wrap; a single word longer than `width` gets its own line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return lines;
    };

    let mut current = first.to_string();
    for word in words {
        if display_width(&current) + 1 + display_width(word) <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// RFC 3339 text as `Jan 2, 2006`; unparseable input keeps its first ten characters.
pub fn format_date(text: &str) -> String {
    if text.is_empty() {
        return "-".to_string();
    }
    match DateTime::parse_from_rfc3339(text) {
        Ok(dt) => dt.format("%b %-d, %Y").to_string(),
        Err(_) => text.chars().take(10).collect(),
    }
}

pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%b %-d, %Y %H:%M").to_string(),
        None => "-".to_string(),
    }
}
