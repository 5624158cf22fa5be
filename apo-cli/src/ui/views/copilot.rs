use apo_core::agent::format_result;
use apo_core::state::DataSnapshot;

use super::{View, ViewId};
use crate::query::QueryService;
use crate::terminal::{CursorControl, Key};
use crate::ui::frame::Frame;
use crate::ui::style::{Attr, style, truncate};
use crate::ui::widgets::TextInput;

const PROMPT: &str = "apo> ";
const SUGGESTION_PREFIX: &str = "💡 ";
const HEADING: &str = "🤖 Copilot - Ask me about Azure DevOps";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Line {
    User(String),
    Reply(String),
}

/// Conversational view: free-text questions answered by the query service.
pub struct CopilotView {
    input: TextInput,
    query: Box<dyn QueryService>,
    history: Vec<Line>,
}

impl CopilotView {
    pub fn new(query: Box<dyn QueryService>) -> Self {
        Self {
            input: TextInput::new(PROMPT),
            query,
            history: Vec::new(),
        }
    }

    fn submit(&mut self) {
        let question = self.input.value().trim().to_string();
        if question.is_empty() {
            return;
        }
        self.input.clear();

        let result = self.query.ask(&question);
        tracing::info!(success = result.success, "copilot query answered");

        self.history.push(Line::User(question));
        self.history.push(Line::Reply(result.message));
        for suggestion in result.suggestions {
            let line = format!("{}{}", SUGGESTION_PREFIX, suggestion);
            self.history.push(Line::Reply(line));
        }
        if let Some(data) = &result.data {
            self.history.extend(
                format_result(data)
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(|line| Line::Reply(line.to_string())),
            );
        }
    }
}

impl View for CopilotView {
    fn id(&self) -> ViewId {
        ViewId::Copilot
    }

    fn title(&self) -> &str {
        "Copilot"
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        _snapshot: &DataSnapshot,
        start_row: u16,
        width: u16,
        height: u16,
    ) {
        let heading = style(HEADING, &[Attr::Bold, Attr::FgCyan]);
        frame.print_at(start_row, 2, &heading);
        let rule = "─".repeat(width.saturating_sub(4) as usize);
        frame.print_at(start_row + 1, 2, &style(&rule, &[Attr::Dim]));

        if self.history.is_empty() {
            frame.print_at(
                start_row + 3,
                2,
                &style("Try: \"What work items are assigned to me?\"", &[Attr::Dim]),
            );
        } else {
            let max_lines = height.saturating_sub(6) as usize;
            let skip = self.history.len().saturating_sub(max_lines);
            let wide = width.saturating_sub(6) as usize;
            let reply_width = width.saturating_sub(4) as usize;
            for (row, line) in (start_row + 2..).zip(self.history.iter().skip(skip)) {
                let text = match line {
                    Line::User(q) => {
                        let q = format!("> {}", truncate(q, wide));
                        style(&q, &[Attr::FgCyan, Attr::Bold])
                    }
                    Line::Reply(r) if r.starts_with(SUGGESTION_PREFIX) => {
                        style(&format!("  {}", truncate(r, wide)), &[Attr::Dim])
                    }
                    Line::Reply(r) => style(&truncate(r, reply_width), &[Attr::FgGreen]),
                };
                frame.print_at(row, 2, &text);
            }
        }

        let input_row = start_row + height.saturating_sub(2);
        let input_width = width.saturating_sub(4);
        self.input.render(frame, input_row, 2, input_width);
    }

    fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::Enter => self.submit(),
            Key::Backspace => self.input.backspace(),
            Key::Char(c) => self.input.insert_char(c),
            _ => return false,
        }
        true
    }

    fn on_enter(&mut self, cursor: &mut dyn CursorControl) {
        self.input.activate();
        cursor.set_cursor_visible(true);
    }

    fn on_exit(&mut self, cursor: &mut dyn CursorControl) {
        self.input.deactivate();
        cursor.set_cursor_visible(false);
    }
}
