//! Status Aggregation Pipeline (§4.F).
//!
//! Runs independent collectors concurrently, each bounded by its own
//! wall-clock timeout, and merges whatever they produce into a single
//! [`WorktreeStatus`]. A collector that panics, times out, or is simply
//! unavailable for this worktree contributes nothing — it never fails the
//! whole command (§4.F "Orchestration").

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::context::WorkstackContext;
use crate::model::{ChecksStatus, CommitLogEntry, PrState, WorkingTreeFiles};

/// Default per-collector wall-clock budget (§4.F).
pub const DEFAULT_COLLECTOR_TIMEOUT: Duration = Duration::from_secs(3);

/// Default number of recent commits the git status collector reports (§4.F).
pub const DEFAULT_RECENT_COMMITS: usize = 5;

/// Git working-tree dirtiness, ahead/behind, and recent history (§4.F #1).
#[derive(Debug, Clone)]
pub struct GitStatus {
    pub branch: String,
    pub files: WorkingTreeFiles,
    pub ahead: u32,
    pub behind: u32,
    pub recent_commits: Vec<CommitLogEntry>,
}

/// PR state for the worktree's current branch plus the derived
/// `ready_to_merge` flag (§4.F #2).
#[derive(Debug, Clone)]
pub struct PrStatus {
    pub number: u64,
    pub state: PrState,
    pub url: String,
    pub is_draft: bool,
    pub checks_passing: ChecksStatus,
    pub ready_to_merge: bool,
}

/// This branch's place in the stacked-diff graph (§4.F #3).
#[derive(Debug, Clone)]
pub struct StackPosition {
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub is_trunk: bool,
}

/// Parsed `.PLAN.md` summary (§4.F #4).
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub title: String,
    pub summary: String,
    pub lines: Vec<String>,
}

/// Identity facts about the worktree the status is for (always present).
#[derive(Debug, Clone)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub name: String,
    pub is_root: bool,
}

/// One other worktree in the same repository, for `related_worktrees`.
#[derive(Debug, Clone)]
pub struct RelatedWorktree {
    pub path: PathBuf,
    pub name: String,
    pub branch: Option<String>,
}

/// The merged result of one `status` invocation. Each optional field is
/// `None` exactly when its collector was unavailable, timed out, or panicked.
#[derive(Debug, Clone)]
pub struct WorktreeStatus {
    pub worktree: WorktreeInfo,
    pub git: Option<GitStatus>,
    pub pr: Option<PrStatus>,
    pub stack: Option<StackPosition>,
    pub plan: Option<PlanSummary>,
    pub related_worktrees: Vec<RelatedWorktree>,
}

/// Run the built-in collectors for `worktree_path` and merge their results.
///
/// `repo_root` is the root worktree's path (used for VCS operations that
/// need to run against the shared object database, e.g. the branch-graph
/// cache lookup). `is_root` marks whether `worktree_path` is the root
/// worktree. `timeout` overrides [`DEFAULT_COLLECTOR_TIMEOUT`] (e.g. for
/// tests that want deterministic timeout behavior without a real 3s wait).
pub fn collect(
    ctx: &WorkstackContext,
    repo_root: &Path,
    worktree_path: &Path,
    is_root: bool,
    timeout: Duration,
) -> WorktreeStatus {
    let name = if is_root {
        "root".to_string()
    } else {
        worktree_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    let git_handle = {
        let ctx = ctx.clone();
        let worktree_path = worktree_path.to_path_buf();
        spawn_with_timeout(timeout, move || collect_git(&ctx, &worktree_path))
    };
    let pr_handle = {
        let ctx = ctx.clone();
        let repo_root = repo_root.to_path_buf();
        let worktree_path = worktree_path.to_path_buf();
        spawn_with_timeout(timeout, move || collect_pr(&ctx, &repo_root, &worktree_path))
    };
    let stack_handle = {
        let ctx = ctx.clone();
        let repo_root = repo_root.to_path_buf();
        let worktree_path = worktree_path.to_path_buf();
        spawn_with_timeout(timeout, move || collect_stack(&ctx, &repo_root, &worktree_path))
    };
    let plan_handle = {
        let worktree_path = worktree_path.to_path_buf();
        spawn_with_timeout(timeout, move || collect_plan(&worktree_path))
    };

    let git = git_handle.join();
    let pr = pr_handle.join();
    let stack = stack_handle.join();
    let plan = plan_handle.join();

    let related_worktrees = collect_related(ctx, repo_root, worktree_path);

    WorktreeStatus {
        worktree: WorktreeInfo {
            path: worktree_path.to_path_buf(),
            name,
            is_root,
        },
        git: git.flatten(),
        pr: pr.flatten(),
        stack: stack.flatten(),
        plan: plan.flatten(),
        related_worktrees,
    }
}

/// Run `f` on a detached thread and wait up to `timeout` for a result.
///
/// A panic inside `f` is caught before it crosses the channel and surfaces
/// as `None`, matching the "panics... become absent results" contract
/// (§4.F, §9). The thread is genuinely detached (not scoped): a `f` that
/// ignores the timeout and blocks forever leaks its thread until it
/// eventually finishes on its own, but the *caller* never blocks past
/// `timeout` — collectors are read-only, so a leaked thread is harmless.
fn spawn_with_timeout<T, F>(timeout: Duration, f: F) -> CollectorHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> Option<T> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
        let _ = tx.send(result.unwrap_or(None));
    });
    CollectorHandle { rx, timeout }
}

struct CollectorHandle<T> {
    rx: crossbeam_channel::Receiver<T>,
    timeout: Duration,
}

impl<T> CollectorHandle<T> {
    /// `None` on timeout (logged at `warn`, per §A "Ambient stack").
    fn join(self) -> Option<T> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("status collector timed out after {:?}", self.timeout);
                None
            }
        }
    }
}

fn collect_git(ctx: &WorkstackContext, worktree_path: &Path) -> Option<GitStatus> {
    let branch = ctx.vcs.current_branch(worktree_path).ok().flatten()?;
    let files = ctx.vcs.working_tree_files(worktree_path).ok()?;
    let (ahead, behind) = ctx.vcs.ahead_behind(worktree_path).ok()?;
    let recent_commits = ctx
        .vcs
        .recent_commits(worktree_path, DEFAULT_RECENT_COMMITS)
        .unwrap_or_default();
    Some(GitStatus {
        branch,
        files,
        ahead,
        behind,
        recent_commits,
    })
}

fn collect_pr(ctx: &WorkstackContext, repo_root: &Path, worktree_path: &Path) -> Option<PrStatus> {
    let global = ctx.global_config.load().ok()?;
    if !global.show_pr_info || !worktree_path.exists() {
        return None;
    }
    let branch = ctx.vcs.current_branch(worktree_path).ok().flatten()?;

    // Prefer the stacked-diff tool's cache to avoid a slow network call (§4.F #2).
    let info = ctx
        .stacked
        .cached_pr_info(repo_root, &branch)
        .ok()
        .flatten()
        .or_else(|| ctx.pr_host.pr_for_branch(repo_root, &branch).ok().flatten())?;

    let ready_to_merge =
        info.state == PrState::Open && !info.is_draft && !matches!(info.checks_passing, ChecksStatus::Failing);
    Some(PrStatus {
        number: info.number,
        state: info.state,
        url: info.url,
        is_draft: info.is_draft,
        checks_passing: info.checks_passing,
        ready_to_merge,
    })
}

fn collect_stack(ctx: &WorkstackContext, repo_root: &Path, worktree_path: &Path) -> Option<StackPosition> {
    let global = ctx.global_config.load().ok()?;
    if !global.use_graphite {
        return None;
    }
    let branch = ctx.vcs.current_branch(worktree_path).ok().flatten()?;
    let common = ctx.vcs.common_dir(repo_root).ok()?;
    let graph = match crate::branch_graph::load(&common).ok()? {
        crate::branch_graph::LoadResult::Present(g) => g,
        crate::branch_graph::LoadResult::Missing => return None,
    };
    let node = graph.get(&branch)?;
    Some(StackPosition {
        parent: node.parent.clone(),
        children: node.children.clone(),
        is_trunk: crate::branch_graph::is_trunk(&graph, &branch),
    })
}

const PLAN_FILE_NAME: &str = ".PLAN.md";
const PLAN_SUMMARY_MAX_CHARS: usize = 100;
const PLAN_CAPTURE_LINES: usize = 5;

fn collect_plan(worktree_path: &Path) -> Option<PlanSummary> {
    let contents = std::fs::read_to_string(worktree_path.join(PLAN_FILE_NAME)).ok()?;
    Some(parse_plan(&contents))
}

/// Strip YAML front matter (a leading `---` block), extract the first
/// heading as `title`, capture up to [`PLAN_CAPTURE_LINES`] lines, and
/// compose `summary` from the first non-heading, non-blank lines, truncated
/// to [`PLAN_SUMMARY_MAX_CHARS`] with an ellipsis (§4.F #4).
fn parse_plan(contents: &str) -> PlanSummary {
    let body = strip_front_matter(contents);
    let mut lines_iter = body.lines();

    let mut title = String::new();
    let mut body_lines = Vec::new();
    for line in lines_iter.by_ref() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(heading) = trimmed.strip_prefix('#') {
            title = heading.trim_start_matches('#').trim().to_string();
        } else {
            body_lines.push(trimmed.to_string());
        }
        if !title.is_empty() || !body_lines.is_empty() {
            break;
        }
    }
    for line in lines_iter {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        body_lines.push(trimmed.to_string());
        if body_lines.len() >= PLAN_CAPTURE_LINES {
            break;
        }
    }

    let joined = body_lines.join(" ");
    let summary = truncate_with_ellipsis(&joined, PLAN_SUMMARY_MAX_CHARS);

    PlanSummary {
        title,
        summary,
        lines: body_lines,
    }
}

fn strip_front_matter(contents: &str) -> &str {
    let Some(rest) = contents.strip_prefix("---\n") else {
        return contents;
    };
    match rest.find("\n---\n") {
        Some(idx) => &rest[idx + 5..],
        None => contents,
    }
}

fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn collect_related(ctx: &WorkstackContext, repo_root: &Path, worktree_path: &Path) -> Vec<RelatedWorktree> {
    let Ok(worktrees) = ctx.vcs.list_worktrees(repo_root) else {
        return Vec::new();
    };
    worktrees
        .into_iter()
        .filter(|w| w.path != worktree_path && w.path.exists())
        .map(|w| RelatedWorktree {
            name: w.name(),
            branch: w.branch.clone(),
            path: w.path,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::fakes::{FakeGlobalConfigOps, FakePrHostOps, FakeShellOps, FakeStackedDiffOps, FakeVcsOps};
    use crate::ops::PrInfo;
    use std::time::Duration;

    fn test_context(vcs: FakeVcsOps, global: crate::config::GlobalConfig) -> WorkstackContext {
        WorkstackContext {
            vcs: Arc::new(vcs),
            pr_host: Arc::new(FakePrHostOps::new()),
            stacked: Arc::new(FakeStackedDiffOps::new()),
            global_config: Arc::new(FakeGlobalConfigOps::seeded(global)),
            shell: Arc::new(FakeShellOps::new()),
            dry_run: false,
        }
    }

    #[test]
    fn test_collect_merges_git_status() {
        let vcs = FakeVcsOps::new();
        vcs.checkout_branch(Path::new("/ws/repo/feature"), "feature").unwrap();
        vcs.set_ahead_behind("/ws/repo/feature", 2, 1);
        let ctx = test_context(vcs, crate::config::GlobalConfig::default());

        let status = collect(
            &ctx,
            Path::new("/repo"),
            Path::new("/ws/repo/feature"),
            false,
            Duration::from_secs(1),
        );

        assert_eq!(status.worktree.name, "feature");
        let git = status.git.expect("git collector should have run");
        assert_eq!(git.branch, "feature");
        assert_eq!((git.ahead, git.behind), (2, 1));
    }

    #[test]
    fn test_collect_pr_prefers_stacked_diff_cache() {
        let vcs = FakeVcsOps::new();
        vcs.checkout_branch(Path::new("/ws/repo/feature"), "feature").unwrap();
        let mut global = crate::config::GlobalConfig::default();
        global.show_pr_info = true;
        let ctx = WorkstackContext {
            vcs: Arc::new(vcs),
            pr_host: Arc::new(FakePrHostOps::new()),
            stacked: {
                let s = FakeStackedDiffOps::new();
                s.set_cached_pr(
                    "feature",
                    PrInfo {
                        number: 42,
                        state: PrState::Open,
                        title: "t".into(),
                        url: "https://example.invalid/42".into(),
                        is_draft: false,
                        checks_passing: ChecksStatus::Passing,
                        owner: "o".into(),
                        repo: "r".into(),
                    },
                );
                Arc::new(s)
            },
            global_config: Arc::new(FakeGlobalConfigOps::seeded(global)),
            shell: Arc::new(FakeShellOps::new()),
            dry_run: false,
        };

        let status = collect(
            &ctx,
            Path::new("/repo"),
            Path::new("/ws/repo/feature"),
            false,
            Duration::from_secs(1),
        );
        let pr = status.pr.expect("pr collector should have run");
        assert_eq!(pr.number, 42);
        assert!(pr.ready_to_merge);
    }

    #[test]
    fn test_pr_collector_unavailable_when_show_pr_info_false() {
        let vcs = FakeVcsOps::new();
        vcs.checkout_branch(Path::new("/ws/repo/feature"), "feature").unwrap();
        let mut global = crate::config::GlobalConfig::default();
        global.show_pr_info = false;
        let ctx = test_context(vcs, global);
        let status = collect(
            &ctx,
            Path::new("/repo"),
            Path::new("/ws/repo/feature"),
            false,
            Duration::from_secs(1),
        );
        assert!(status.pr.is_none());
    }

    #[test]
    fn test_slow_collector_times_out_without_blocking() {
        // A git collector that never returns in time must not hold up the
        // overall result past the timeout (§4.F "Cancellation & timeout").
        let start = std::time::Instant::now();
        let handle: CollectorHandle<()> = spawn_with_timeout(Duration::from_millis(50), || {
            std::thread::sleep(Duration::from_secs(5));
            Some(())
        });
        let result = handle.join();
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_parse_plan_extracts_title_and_summary() {
        let md = "---\nfoo: bar\n---\n# My Plan\n\nFirst line of detail.\nSecond line.\n";
        let plan = parse_plan(md);
        assert_eq!(plan.title, "My Plan");
        assert!(plan.summary.contains("First line of detail."));
    }

    #[test]
    fn test_parse_plan_truncates_summary() {
        let long = "x".repeat(200);
        let md = format!("# T\n\n{long}\n");
        let plan = parse_plan(&md);
        assert!(plan.summary.ends_with('…'));
        assert!(plan.summary.chars().count() <= PLAN_SUMMARY_MAX_CHARS);
    }
}
