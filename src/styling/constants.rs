//! Semantic color/emoji constants shared by error, hint, and status output.

use anstyle::{AnsiColor, Color, Style};

pub const ERROR: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
pub const ERROR_EMOJI: &str = "❌";

pub const WARNING: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
pub const WARNING_EMOJI: &str = "🟡";

pub const HINT: Style = Style::new().dimmed();
pub const HINT_BOLD: Style = Style::new().dimmed().bold();
pub const HINT_EMOJI: &str = "💡";

pub const SUCCESS_EMOJI: &str = "✅";
pub const PROGRESS_EMOJI: &str = "🚧";
pub const INFO_EMOJI: &str = "ℹ️";

pub const GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
pub const GREEN_BOLD: Style = Style::new()
    .fg_color(Some(Color::Ansi(AnsiColor::Green)))
    .bold();
pub const CYAN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
pub const DIM: Style = Style::new().dimmed();
