//! Text attributes and width-aware layout helpers.
//!
//! Widths are terminal display columns, so emoji and CJK count as two.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const RESET: &str = "\x1b[0m";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attr {
    Bold,
    Dim,
    Blink,
    Reverse,
    FgRed,
    FgGreen,
    FgYellow,
    FgCyan,
    FgWhite,
    BgBlue,
}

impl Attr {
    pub fn code(self) -> &'static str {
        match self {
            Attr::Bold => "\x1b[1m",
            Attr::Dim => "\x1b[2m",
            Attr::Blink => "\x1b[5m",
            Attr::Reverse => "\x1b[7m",
            Attr::FgRed => "\x1b[31m",
            Attr::FgGreen => "\x1b[32m",
            Attr::FgYellow => "\x1b[33m",
            Attr::FgCyan => "\x1b[36m",
            Attr::FgWhite => "\x1b[37m",
            Attr::BgBlue => "\x1b[44m",
        }
    }
}

pub fn style(text: &str, attrs: &[Attr]) -> String {
    if attrs.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + attrs.len() * 5 + RESET.len());
    for attr in attrs {
        out.push_str(attr.code());
    }
    out.push_str(text);
    out.push_str(RESET);
    out
}

pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Longest prefix that fits in `max` columns.
fn take_columns(text: &str, max: usize) -> (&str, usize) {
    let mut used = 0;
    for (idx, c) in text.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max {
            return (&text[..idx], used);
        }
        used += w;
    }
    (text, used)
}

/// Exactly `width` columns: truncated, or right-padded with spaces.
pub fn pad(text: &str, width: usize) -> String {
    let (head, used) = take_columns(text, width);
    let mut out = String::with_capacity(head.len() + width - used);
    out.push_str(head);
    out.extend(std::iter::repeat_n(' ', width - used));
    out
}

/// At most `max` columns, ending in `...` when something was cut.
pub fn truncate(text: &str, max: usize) -> String {
    if display_width(text) <= max {
        return text.to_string();
    }
    if max <= 3 {
        return take_columns(text, max).0.to_string();
    }
    let (head, _) = take_columns(text, max - 3);
    format!("{}...", head)
}

/// `text` centered in `width` columns (left offset only, no trailing pad).
pub fn center_offset(text: &str, width: usize) -> usize {
    width.saturating_sub(display_width(text)) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_wraps_with_reset() {
        assert_eq!(style("hi", &[]), "hi");
        assert_eq!(
            style("hi", &[Attr::Bold, Attr::FgRed]),
            "\x1b[1m\x1b[31mhi\x1b[0m"
        );
    }

    #[test]
    fn test_pad_exact_width() {
        assert_eq!(pad("abc", 5), "abc  ");
        assert_eq!(pad("abcdef", 4), "abcd");
        assert_eq!(pad("", 3), "   ");
    }

    #[test]
    fn test_pad_wide_chars() {
        // a wide char that would straddle the edge is replaced by padding
        let padded = pad("ab🔀", 3);
        assert_eq!(padded, "ab ");
        assert_eq!(display_width(&pad("🔀x", 6)), 6);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("hello", 0), "");
    }

    #[test]
    fn test_truncate_never_splits_chars() {
        let text = "héllo wörld ünïcode";
        for max in 0..25 {
            let cut = truncate(text, max);
            assert!(display_width(&cut) <= max);
            assert!(text.starts_with(cut.trim_end_matches('.')));
        }
        assert_eq!(truncate("📋📋📋📋", 5), "📋...");
    }

    #[test]
    fn test_center_offset() {
        assert_eq!(center_offset("abcd", 10), 3);
        assert_eq!(center_offset("too long", 4), 0);
    }
}
