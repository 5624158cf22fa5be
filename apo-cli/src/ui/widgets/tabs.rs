use crate::ui::frame::Frame;
use crate::ui::style::{Attr, style};
use crate::ui::views::ViewId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tab {
    pub view: ViewId,
    pub name: &'static str,
    pub key: char,
    pub icon: &'static str,
}

/// Horizontal tab strip with exactly one active entry.
#[derive(Clone, Debug)]
pub struct TabBar {
    tabs: Vec<Tab>,
    active: usize,
}

impl TabBar {
    pub fn new(tabs: Vec<Tab>) -> Self {
        Self { tabs, active: 0 }
    }

    /// The six top-level views in shortcut order.
    pub fn standard() -> Self {
        Self::new(vec![
            Tab {
                view: ViewId::Dashboard,
                name: "Dashboard",
                key: '1',
                icon: "🏠",
            },
            Tab {
                view: ViewId::Boards,
                name: "Boards",
                key: '2',
                icon: "📋",
            },
            Tab {
                view: ViewId::Pipelines,
                name: "Pipelines",
                key: '3',
                icon: "🔧",
            },
            Tab {
                view: ViewId::Repos,
                name: "Repos",
                key: '4',
                icon: "📁",
            },
            Tab {
                view: ViewId::PullRequests,
                name: "PRs",
                key: '5',
                icon: "🔀",
            },
            Tab {
                view: ViewId::Copilot,
                name: "Copilot",
                key: '/',
                icon: "🤖",
            },
        ])
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    #[cfg(test)]
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.active = index;
        }
    }

    pub fn set_active_by_id(&mut self, view: ViewId) {
        if let Some(index) = self.tabs.iter().position(|t| t.view == view) {
            self.set_active(index);
        }
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    pub fn next(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + 1) % self.tabs.len();
        }
    }

    pub fn render(&self, frame: &mut Frame, row: u16, col: u16, width: u16) {
        let mut line = String::from(" ");
        for (i, tab) in self.tabs.iter().enumerate() {
            let text = format!(" {} {} [{}] ", tab.icon, tab.name, tab.key);
            if i == self.active {
                line.push_str(&style(&text, &[Attr::Bold, Attr::Reverse]));
            } else {
                line.push_str(&style(&text, &[Attr::Dim]));
            }
            if i + 1 < self.tabs.len() {
                line.push('│');
            }
        }
        frame.print_at(row, col, &line);

        let rule = "─".repeat(width.saturating_sub(col) as usize);
        frame.print_at(row + 1, col, &style(&rule, &[Attr::Dim]));
    }
}
