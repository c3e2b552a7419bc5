//! Consolidated styling module for terminal output.
//!
//! This module uses the anstyle ecosystem:
//! - anstream for auto-detecting color support
//! - anstyle for composable styling
//! - Semantic style constants for domain-specific use
//!
//! ## stdout vs stderr principle
//!
//! - **stdout**: ALL command output (messages, errors, warnings, directives, data)
//! - **stderr**: ALL child process output (git, npm, user commands)
//! - **Exception**: Interactive prompts use stderr so they appear even when stdout is redirected
//!
//! Use `println!` for all command output. Use `eprintln!` only for interactive prompts.

mod constants;
mod format;
mod hyperlink;
mod line;

// Re-exports from anstream (auto-detecting output)
pub use anstream::{eprint, eprintln, print, println, stderr, stdout};

// Re-exports from anstyle (for composition)
pub use anstyle::Style as AnstyleStyle;

// Re-export our public types
pub use constants::*;
pub use format::{
    GUTTER_OVERHEAD, format_bash_with_gutter, format_with_gutter, get_terminal_width,
    truncate_visible, visual_width,
};
pub use hyperlink::hyperlink_stdout;
pub use line::{StyledLine, StyledString};

// Re-export for tests
#[cfg(test)]
use format::wrap_text_at_width;
// ============================================================================
// Tests
// ============================================================================
