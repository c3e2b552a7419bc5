//! Display Layer (§4.I): pure functions from data to strings. No function
//! here touches the filesystem, the VCS, or styling policy beyond color/emoji
//! that callers can ignore for plain output.

use crate::model::{ChecksStatus, PrState};
use crate::navigation::{StackEntry, TreeNode};
use crate::status::{PrStatus, WorktreeStatus};
use crate::styling::{DIM, GREEN_BOLD, HINT, WARNING};

/// Render the `tree` forest (§4.E) with box-drawing connectors. Roots
/// themselves carry no connector; their children start the `├─`/`└─`
/// chain, and each deeper level adds three spaces of indent (`│  ` when
/// the ancestor at that level has further siblings below it).
pub fn render_tree(roots: &[TreeNode]) -> String {
    let mut out = String::new();
    for root in roots {
        push_node_line(root, "", out_marker(root), &mut out);
        render_children(&root.children, "", &mut out);
    }
    out
}

fn render_children(children: &[TreeNode], prefix: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let connector = if is_last { "└─ " } else { "├─ " };
        let line_prefix = format!("{prefix}{connector}");
        push_node_line(child, &line_prefix, out_marker(child), out);
        let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
        render_children(&child.children, &child_prefix, out);
    }
}

fn out_marker(node: &TreeNode) -> String {
    if node.is_current {
        format!("{GREEN_BOLD}*{GREEN_BOLD:#} ")
    } else {
        String::new()
    }
}

fn push_node_line(node: &TreeNode, prefix: &str, marker: String, out: &mut String) {
    out.push_str(prefix);
    out.push_str(&marker);
    out.push_str(&node.branch);
    out.push_str(&format!(" [@{}]", node.worktree_name));
    out.push('\n');
}

/// Render one worktree's stack slice (§4.E "list --stacks"). `pr_badge`
/// supplies a pre-rendered badge per branch name, or `None` when
/// `show_pr_info` is off.
pub fn render_stack_slice(entries: &[StackEntry], pr_badge: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::new();
    for entry in entries {
        let glyph = if entry.is_current { "●" } else { "○" };
        out.push_str("  ");
        out.push_str(glyph);
        out.push(' ');
        out.push_str(&entry.branch);
        if let Some(badge) = pr_badge(&entry.branch) {
            out.push(' ');
            out.push_str(&badge);
        }
        out.push('\n');
    }
    out
}

/// Render a PR badge: state emoji, number, and (optionally) a checks glyph.
pub fn render_pr_badge(pr: &PrStatus, show_checks: bool) -> String {
    let state_emoji = match pr.state {
        PrState::Open => {
            if pr.is_draft {
                "📝"
            } else {
                "🟢"
            }
        }
        PrState::Merged => "🟣",
        PrState::Closed => "🔴",
    };
    let mut badge = format!("{state_emoji} #{}", pr.number);
    if show_checks {
        let checks_emoji = match pr.checks_passing {
            ChecksStatus::Passing => "✅",
            ChecksStatus::Failing => "❌",
            ChecksStatus::Unknown => "❓",
        };
        badge.push(' ');
        badge.push_str(checks_emoji);
    }
    badge
}

/// Render a full `status` result (§4.F) as human-readable text.
pub fn render_status(status: &WorktreeStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} [{}]\n", status.worktree.name, status.worktree.path.display()));

    match &status.git {
        Some(git) => {
            out.push_str(&format!("  branch: {}\n", git.branch));
            out.push_str(&format!("  ahead/behind: +{}/-{}\n", git.ahead, git.behind));
            let dirty = git.files.staged.len() + git.files.modified.len() + git.files.untracked.len();
            if dirty == 0 {
                out.push_str("  working tree: clean\n");
            } else {
                out.push_str(&format!(
                    "  working tree: {} staged, {} modified, {} untracked\n",
                    git.files.staged.len(),
                    git.files.modified.len(),
                    git.files.untracked.len()
                ));
            }
            if !git.recent_commits.is_empty() {
                out.push_str("  recent commits:\n");
                for commit in &git.recent_commits {
                    out.push_str(&format!(
                        "    {DIM}{}{DIM:#} {} ({}, {})\n",
                        commit.short_sha, commit.message, commit.author, commit.relative_date
                    ));
                }
            }
        }
        None => out.push_str(&format!("  {WARNING}git status unavailable{WARNING:#}\n")),
    }

    if let Some(pr) = &status.pr {
        out.push_str(&format!(
            "  pr: {}  {}\n",
            render_pr_badge(pr, true),
            pr.url
        ));
        if pr.ready_to_merge {
            out.push_str("  ready to merge\n");
        }
    }

    if let Some(stack) = &status.stack {
        let parent = stack.parent.as_deref().unwrap_or("(none)");
        out.push_str(&format!(
            "  stack: parent={parent} children={} trunk={}\n",
            stack.children.join(","),
            stack.is_trunk
        ));
    }

    if let Some(plan) = &status.plan {
        out.push_str(&format!("  plan: {HINT}{}{HINT:#} — {}\n", plan.title, plan.summary));
    }

    if !status.related_worktrees.is_empty() {
        out.push_str("  related worktrees:\n");
        for related in &status.related_worktrees {
            out.push_str(&format!(
                "    {} [{}]\n",
                related.name,
                related.branch.as_deref().unwrap_or("(detached)")
            ));
        }
    }

    out
}
