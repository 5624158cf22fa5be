use crossterm::Command;
use crossterm::{cursor, terminal};

/// One full-screen repaint, built up in memory and written by
/// [`crate::terminal::Terminal::present`].
///
/// Coordinates are 1-indexed (row 1, column 1 is the top-left cell).
#[derive(Debug)]
pub struct Frame {
    buf: String,
    rows: u16,
    cols: u16,
}

impl Frame {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            buf: String::with_capacity(rows as usize * cols as usize),
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn clear(&mut self) {
        let _ = terminal::Clear(terminal::ClearType::All).write_ansi(&mut self.buf);
        self.move_to(1, 1);
    }

    pub fn move_to(&mut self, row: u16, col: u16) {
        let to = cursor::MoveTo(col.saturating_sub(1), row.saturating_sub(1));
        let _ = to.write_ansi(&mut self.buf);
    }

    pub fn print(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    pub fn print_at(&mut self, row: u16, col: u16, text: &str) {
        self.move_to(row, col);
        self.print(text);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Printed text with all escape sequences removed; handy for assertions.
    #[cfg(test)]
    pub fn plain_text(&self) -> String {
        let mut out = String::with_capacity(self.buf.len());
        let mut chars = self.buf.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '\x1b' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'[') {
                chars.next();
                // CSI: parameters until a final byte in '@'..='~'
                let final_byte = chars.by_ref().find(|c| ('@'..='~').contains(c));
                if matches!(final_byte, Some('H') | Some('J')) {
                    out.push('\n');
                }
            }
        }
        out
    }
}
