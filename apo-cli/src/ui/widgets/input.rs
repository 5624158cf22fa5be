use crate::ui::frame::Frame;
use crate::ui::style::{Attr, pad, style};

const CURSOR_GLYPH: &str = "█";

/// Single-line text field with a prompt.
#[derive(Clone, Debug, Default)]
pub struct TextInput {
    prompt: String,
    value: String,
    active: bool,
}

impl TextInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn insert_char(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn render(&self, frame: &mut Frame, row: u16, col: u16, width: u16) {
        frame.print_at(row, col, &pad("", width as usize));
        frame.move_to(row, col);
        frame.print(&style(&self.prompt, &[Attr::FgGreen, Attr::Bold]));
        frame.print(&self.value);
        if self.active {
            frame.print(&style(CURSOR_GLYPH, &[Attr::Blink]));
        }
    }
}
