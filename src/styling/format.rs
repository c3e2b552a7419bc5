//! Gutter formatting for quoted content
//!
//! Provides functions for formatting commands and configuration with visual gutters.

use anstyle::{AnsiColor, Color, Style};
use unicode_width::UnicodeWidthStr;

/// Default terminal width fallback if detection fails
const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// Width overhead added by format_with_gutter(): 1 column gutter + 2 columns padding.
pub const GUTTER_OVERHEAD: usize = 3;

fn strip_ansi_codes(s: &str) -> String {
    strip_ansi_escapes::strip_str(s)
}

/// Calculate visual width of a string, ignoring ANSI escape codes.
pub fn visual_width(s: &str) -> usize {
    strip_ansi_codes(s).width()
}

/// Get terminal width, defaulting to 80 if detection fails.
///
/// Checks COLUMNS environment variable first (for testing and scripts),
/// then falls back to actual terminal size detection.
pub fn get_terminal_width() -> usize {
    if let Ok(cols) = std::env::var("COLUMNS")
        && let Ok(width) = cols.parse::<usize>()
    {
        return width;
    }

    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

/// Truncate a (possibly ANSI-styled) string to a maximum visual width, word-agnostic.
pub fn truncate_visible(text: &str, max_width: usize) -> String {
    if visual_width(text) <= max_width {
        return text.to_string();
    }
    let target = max_width.saturating_sub(1);
    let mut width = 0;
    let mut out = String::new();
    for ch in strip_ansi_codes(text).chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w > target {
            break;
        }
        width += w;
        out.push(ch);
    }
    format!("{}…", out.trim_end())
}

/// Wraps text at word boundaries to fit within the specified width.
///
/// Width calculation ignores ANSI escape codes to handle colored output correctly.
pub(super) fn wrap_text_at_width(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let text_width = visual_width(text);
    if text_width <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = visual_width(word);

        if current_line.is_empty() {
            current_line = word.to_string();
            current_width = word_width;
        } else {
            let new_width = current_width + 1 + word_width;
            if new_width <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
                current_width = new_width;
            } else {
                lines.push(current_line);
                current_line = word.to_string();
                current_width = word_width;
            }
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Formats text with a gutter (single-space with background color) on each line.
///
/// This creates a subtle visual separator for quoted content like commands or
/// configuration. Text is automatically word-wrapped at terminal width.
pub fn format_with_gutter(content: &str, left_margin: &str, max_width: Option<usize>) -> String {
    let gutter = Style::new().bg_color(Some(Color::Ansi(AnsiColor::Black)));
    let mut output = String::new();

    let term_width = max_width.unwrap_or_else(get_terminal_width);
    let left_margin_width = left_margin.width();
    let available_width = term_width.saturating_sub(3 + left_margin_width);

    for line in content.lines() {
        for wrapped_line in wrap_text_at_width(line, available_width) {
            output.push_str(&format!(
                "{left_margin}{gutter} {gutter:#}  {wrapped_line}\n"
            ));
        }
    }

    output
}

/// Formats a shell command with gutter (no syntax highlighting).
pub fn format_bash_with_gutter(content: &str, left_margin: &str) -> String {
    let gutter = Style::new().bg_color(Some(Color::Ansi(AnsiColor::Black)));
    let mut output = String::new();

    let term_width = get_terminal_width();
    let left_margin_width = left_margin.width();
    let available_width = term_width.saturating_sub(3 + left_margin_width);

    let mut wrapped_lines = Vec::new();
    for line in content.lines() {
        wrapped_lines.extend(wrap_text_at_width(line, available_width));
    }

    for line in &wrapped_lines {
        output.push_str(&format!("{left_margin}{gutter} {gutter:#}  "));
        output.push_str(line);
        output.push_str(&format!("{}", anstyle::Reset));
        output.push('\n');
    }

    output
}
