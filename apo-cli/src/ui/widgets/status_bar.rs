use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::ui::frame::Frame;
use crate::ui::style::{Attr, display_width, pad, style};

/// How long a transient message stays visible.
pub const MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Two-row footer: transient message and last refresh on the first row,
/// help text on a blue band below.
#[derive(Clone, Debug, Default)]
pub struct StatusBar {
    message: Option<(String, Instant)>,
    last_refresh: Option<DateTime<Local>>,
    help: String,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.set_message_at(message, Instant::now());
    }

    pub fn set_message_at(&mut self, message: impl Into<String>, at: Instant) {
        self.message = Some((message.into(), at));
    }

    pub fn set_last_refresh(&mut self, at: DateTime<Local>) {
        self.last_refresh = Some(at);
    }

    pub fn set_help(&mut self, help: impl Into<String>) {
        self.help = help.into();
    }

    /// The message, if it is still fresh at `now`.
    pub fn visible_message(&self, now: Instant) -> Option<&str> {
        let (msg, at) = self.message.as_ref()?;
        let fresh = now.saturating_duration_since(*at) < MESSAGE_TTL;
        (fresh && !msg.is_empty()).then_some(msg.as_str())
    }

    pub fn render(&self, frame: &mut Frame, row: u16, width: u16) {
        self.render_at(frame, row, width, Instant::now());
    }

    pub fn render_at(&self, frame: &mut Frame, row: u16, width: u16, now: Instant) {
        frame.print_at(row, 1, &style(&"─".repeat(width as usize), &[Attr::Dim]));

        if let Some(msg) = self.visible_message(now) {
            frame.print_at(row, 3, &style(&format!(" {} ", msg), &[Attr::FgYellow]));
        }

        if let Some(at) = self.last_refresh {
            let refresh = format!("Last refresh: {}", at.format("%H:%M:%S"));
            let col = width
                .saturating_sub(display_width(&refresh) as u16 + 2)
                .max(1);
            frame.print_at(row, col, &style(&refresh, &[Attr::Dim]));
        }

        let help = pad(&self.help, width as usize);
        frame.print_at(row + 1, 1, &style(&help, &[Attr::BgBlue, Attr::FgWhite]));
    }
}
