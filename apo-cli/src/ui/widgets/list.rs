use apo_core::filter::TextFilter;

use crate::terminal::Key;
use crate::ui::frame::Frame;
use crate::ui::style::{Attr, pad, style, truncate};

/// Rows taken by the title line, the rule under it and the bottom margin.
const CHROME_ROWS: u16 = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem<T> {
    pub id: String,
    pub icon: &'static str,
    pub label: String,
    pub sublabel: Option<String>,
    pub data: T,
}

/// Scrollable list with an optional substring filter over item labels.
///
/// While the filter query is non-empty, navigation runs over the matching
/// indices only. The selection is always valid for that active sequence, and
/// the scroll offset never exceeds `max(0, visible - page_height)`.
#[derive(Clone, Debug)]
pub struct List<T> {
    title: String,
    items: Vec<ListItem<T>>,
    filter: TextFilter,
    filtered: Option<Vec<usize>>,
    filter_mode: bool,
    selected: usize,
    scroll: usize,
    page_height: usize,
}

impl<T> List<T> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
            filter: TextFilter::new(),
            filtered: None,
            filter_mode: false,
            selected: 0,
            scroll: 0,
            page_height: 0,
        }
    }

    /// Replace the items, keeping the current filter and clamping the selection.
    pub fn set_items(&mut self, items: Vec<ListItem<T>>) {
        self.items = items;
        self.refilter();
        let len = self.active_len();
        self.selected = self.selected.min(len.saturating_sub(1));
        self.clamp_scroll();
    }

    #[cfg(test)]
    pub fn items(&self) -> &[ListItem<T>] {
        &self.items
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of items in the active (filtered or full) sequence.
    pub fn active_len(&self) -> usize {
        match &self.filtered {
            Some(indices) => indices.len(),
            None => self.items.len(),
        }
    }

    fn item_index(&self, position: usize) -> Option<usize> {
        match &self.filtered {
            Some(indices) => indices.get(position).copied(),
            None => (position < self.items.len()).then_some(position),
        }
    }

    /// Position of the selection within the active sequence.
    pub fn selected_index(&self) -> Option<usize> {
        (self.selected < self.active_len()).then_some(self.selected)
    }

    pub fn selected_item(&self) -> Option<&ListItem<T>> {
        self.selected_index()
            .and_then(|pos| self.item_index(pos))
            .and_then(|idx| self.items.get(idx))
    }

    #[cfg(test)]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    #[cfg(test)]
    pub fn page_height(&self) -> usize {
        self.page_height
    }

    /// Normally derived from the render height; exposed for layout-free use.
    pub fn set_page_height(&mut self, height: usize) {
        self.page_height = height;
        self.clamp_scroll();
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.adjust_scroll();
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.active_len() {
            self.selected += 1;
            self.adjust_scroll();
        }
    }

    pub fn move_to_top(&mut self) {
        self.selected = 0;
        self.scroll = 0;
    }

    pub fn move_to_bottom(&mut self) {
        let len = self.active_len();
        if len > 0 {
            self.selected = len - 1;
            self.adjust_scroll();
        }
    }

    pub fn is_filter_mode(&self) -> bool {
        self.filter_mode
    }

    #[cfg(test)]
    pub fn filter_query(&self) -> &str {
        self.filter.query()
    }

    /// Entering keeps the query; leaving always clears it.
    pub fn toggle_filter_mode(&mut self) {
        self.filter_mode = !self.filter_mode;
        if !self.filter_mode {
            self.clear_filter();
        }
    }

    #[cfg(test)]
    pub fn set_filter(&mut self, query: &str) {
        self.filter.set(query);
        self.apply_filter();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
        self.apply_filter();
    }

    pub fn pop_filter_char(&mut self) {
        if self.filter.pop() {
            self.apply_filter();
        }
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.filtered = None;
        self.selected = 0;
        self.scroll = 0;
    }

    fn refilter(&mut self) {
        if self.filter.is_empty() {
            self.filtered = None;
            return;
        }
        let labels = self.items.iter().map(|item| item.label.as_str());
        self.filtered = Some(self.filter.matching_indices(labels));
    }

    fn apply_filter(&mut self) {
        self.refilter();
        self.selected = 0;
        self.scroll = 0;
    }

    fn adjust_scroll(&mut self) {
        if self.page_height == 0 {
            return;
        }
        if self.selected < self.scroll {
            self.scroll = self.selected;
        }
        if self.selected >= self.scroll + self.page_height {
            self.scroll = self.selected + 1 - self.page_height;
        }
    }

    fn clamp_scroll(&mut self) {
        let max_scroll = self.active_len().saturating_sub(self.page_height);
        self.scroll = self.scroll.min(max_scroll);
        self.adjust_scroll();
    }

    /// Navigation and filter editing shared by every list view.
    ///
    /// Returns false for keys the list does not use, including Enter outside
    /// filter mode, so the caller can act on the selection.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if self.filter_mode {
            return match key {
                Key::Enter | Key::Escape => {
                    self.toggle_filter_mode();
                    true
                }
                Key::Backspace => {
                    self.pop_filter_char();
                    true
                }
                Key::Char(c) => {
                    self.push_filter_char(c);
                    true
                }
                _ => false,
            };
        }

        match key {
            Key::Up | Key::Char('k') => self.move_up(),
            Key::Down | Key::Char('j') => self.move_down(),
            Key::Char('g') => self.move_to_top(),
            Key::Char('G') => self.move_to_bottom(),
            Key::Char('f') | Key::Char('/') => self.toggle_filter_mode(),
            _ => return false,
        }
        true
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        start_row: u16,
        start_col: u16,
        width: u16,
        height: u16,
    ) {
        self.set_page_height(height.saturating_sub(CHROME_ROWS) as usize);

        let title = match &self.filtered {
            Some(indices) => format!(
                "{} (filtered: {}/{})",
                self.title,
                indices.len(),
                self.items.len()
            ),
            None => format!("{} ({})", self.title, self.items.len()),
        };
        let title = style(&title, &[Attr::Bold, Attr::FgYellow]);
        frame.print_at(start_row, start_col, &title);

        if self.filter_mode {
            frame.move_to(start_row, width.saturating_sub(30).max(start_col));
            frame.print(&style("🔍 ", &[Attr::Dim]));
            frame.print(self.filter.query());
            frame.print(&style("█", &[Attr::Blink]));
        }

        let inner = width.saturating_sub(start_col) as usize;
        let rule = "─".repeat(inner.saturating_sub(1));
        frame.print_at(start_row + 1, start_col, &style(&rule, &[Attr::Dim]));

        let active_len = self.active_len();
        let visible_end = (self.scroll + self.page_height).min(active_len);
        let mut row = start_row + 2;

        for pos in self.scroll..visible_end {
            let Some(item) = self.item_index(pos).and_then(|idx| self.items.get(idx)) else {
                continue;
            };
            let text = match &item.sublabel {
                Some(sub) => format!("{}  {}", item.label, sub),
                None => item.label.clone(),
            };
            let text = truncate(&text, inner.saturating_sub(10));
            let line = format!("{} {}", item.icon, text);
            if pos == self.selected {
                let line = pad(&line, inner.saturating_sub(1));
                frame.print_at(row, start_col, &style(&line, &[Attr::Reverse]));
            } else {
                frame.print_at(row, start_col, &line);
            }
            row += 1;
        }

        if active_len == 0 {
            frame.print_at(row, start_col + 2, &style("No items", &[Attr::Dim]));
        }

        if self.scroll > 0 {
            frame.print_at(
                start_row + 2,
                width.saturating_sub(2),
                &style("▲", &[Attr::FgYellow]),
            );
        }
        if visible_end < active_len {
            frame.print_at(
                start_row + self.page_height as u16 + 1,
                width.saturating_sub(2),
                &style("▼", &[Attr::FgYellow]),
            );
        }
    }
}
