//! Raw terminal driver: mode switching, size discovery, cursor control,
//! full-frame presentation and single-keystroke decoding.

use std::io::{self, Read, Write};

use crossterm::{cursor, execute, terminal};

use crate::ui::frame::Frame;

pub const FALLBACK_ROWS: u16 = 40;
pub const FALLBACK_COLS: u16 = 120;

/// One decoded keystroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    /// Ctrl+C
    Interrupt,
}

/// Decode the bytes delivered by a single read (1 to 3 bytes).
///
/// Returns `None` only for an empty read.
pub fn decode_key(bytes: &[u8]) -> Option<Key> {
    let first = *bytes.first()?;

    if bytes.len() == 1 {
        return Some(match first {
            3 => Key::Interrupt,
            9 => Key::Tab,
            13 => Key::Enter,
            27 => Key::Escape,
            127 => Key::Backspace,
            b => Key::Char(b as char),
        });
    }

    if bytes.len() >= 3 && first == 27 && bytes[1] == b'[' {
        match bytes[2] {
            b'A' => return Some(Key::Up),
            b'B' => return Some(Key::Down),
            b'C' => return Some(Key::Right),
            b'D' => return Some(Key::Left),
            _ => {}
        }
    }

    Some(Key::Char(first as char))
}

/// Anything that can toggle the visible cursor. Views receive this in their
/// enter/exit hooks instead of the whole terminal.
pub trait CursorControl {
    fn set_cursor_visible(&mut self, visible: bool);
}

pub struct Terminal {
    out: io::Stdout,
}

impl Terminal {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }

    pub fn enable_raw_mode(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, terminal::EnterAlternateScreen, cursor::Hide)
    }

    pub fn disable_raw_mode(&mut self) -> io::Result<()> {
        execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// (rows, columns), falling back to 40x120 when the size is unknown.
    pub fn query_size(&self) -> (u16, u16) {
        match terminal::size() {
            Ok((cols, rows)) if cols > 0 && rows > 0 => (rows, cols),
            _ => (FALLBACK_ROWS, FALLBACK_COLS),
        }
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        execute!(
            self.out,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        execute!(self.out, cursor::Hide)
    }

    pub fn show_cursor(&mut self) -> io::Result<()> {
        execute!(self.out, cursor::Show)
    }

    /// Write a fully rendered frame in one go.
    pub fn present(&mut self, frame: &Frame) -> io::Result<()> {
        self.out.write_all(frame.as_str().as_bytes())?;
        self.out.flush()
    }

    /// Block until one keystroke is available.
    pub fn read_key(&mut self) -> io::Result<Key> {
        let mut buf = [0u8; 3];
        let n = io::stdin().read(&mut buf)?;
        decode_key(&buf[..n]).ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorControl for Terminal {
    fn set_cursor_visible(&mut self, visible: bool) {
        let result = if visible {
            self.show_cursor()
        } else {
            self.hide_cursor()
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, visible, "failed to toggle cursor");
        }
    }
}

/// Restores the terminal when dropped, whether the loop returned normally or
/// with an error.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable(term: &mut Terminal) -> io::Result<Self> {
        term.enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    if let Err(e) = Terminal::new().disable_raw_mode() {
        tracing::warn!(error = %e, "failed to restore terminal");
    }
}

/// Panics unwind through a thread that may not own the guard, so restore the
/// terminal before the default hook prints the message.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        previous(info);
    }));
}
