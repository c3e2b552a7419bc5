//! Data Model Guards (§4.B): pure validators used by the worktree lifecycle
//! manager and the process-wide context.

use crate::error::WsError;

/// Reserved worktree/branch names that can never be used for a managed worktree.
pub const RESERVED_NAMES: &[&str] = &["root", "main", "master", "..", "/"];

/// `validate_worktree_name(s)`: non-empty; no path separator; not in the
/// reserved set; no parent-directory traversal.
pub fn validate_worktree_name(name: &str) -> Result<(), WsError> {
    if name.is_empty() {
        return Err(WsError::validation("worktree name cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(WsError::validation(
            "worktree name cannot contain a path separator",
        ));
    }
    if name.split(['/', '\\']).any(|part| part == "..") || name == ".." {
        return Err(WsError::validation(
            "worktree name cannot contain '..' (parent-directory traversal)",
        ));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(WsError::validation(format!(
            "'{name}' is a reserved name and cannot be used for a worktree"
        )));
    }
    Ok(())
}

/// Deterministic normalization for worktree directory names: lower-case,
/// non-alphanumeric runs collapse to a single `-`, leading/trailing `-` trimmed.
///
/// Idempotent: `sanitize_worktree_name(sanitize_worktree_name(x)) == sanitize_worktree_name(x)`.
pub fn sanitize_worktree_name(s: &str) -> String {
    collapse_non_alphanumeric(s)
}

/// Deterministic normalization for VCS branch names. Differs from worktree
/// sanitization because branch names permit characters (like `/`) that
/// directory names should not; here we only replace path separators.
pub fn sanitize_branch_name(s: &str) -> String {
    s.replace(['/', '\\'], "-")
}

fn collapse_non_alphanumeric(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_dash = false;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Strip a leading or trailing standalone word "plan" (and surrounding
/// separators) from a plan file's stem, per §4.D step 1.
pub fn strip_plan_word(stem: &str) -> String {
    let parts: Vec<&str> = stem.split(['-', '_', ' ']).filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return stem.to_string();
    }
    let mut parts = parts;
    if parts.first().is_some_and(|p| p.eq_ignore_ascii_case("plan")) {
        parts.remove(0);
    } else if parts.last().is_some_and(|p| p.eq_ignore_ascii_case("plan")) {
        parts.pop();
    }
    parts.join("-")
}
