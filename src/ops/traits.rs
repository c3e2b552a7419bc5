//! Interface definitions for the Operations Abstraction Layer (§4.A).

use std::path::{Path, PathBuf};

use crate::error::WsError;
use crate::model::{ChecksStatus, CommitDescriptor, CommitLogEntry, PrState, WorkingTreeFiles, WorktreeRef};

/// How a new worktree's branch should be sourced (§4.D "add worktree").
#[derive(Debug, Clone)]
pub enum AddWorktreeSource {
    /// Check out an existing branch.
    ExistingBranch(String),
    /// Create `branch`, optionally based on `base` (defaults to HEAD of the source dir).
    NewBranch { branch: String, base: Option<String> },
    /// Check out an arbitrary ref (commit-ish) in detached state at first, then
    /// create the branch from it.
    Ref(String),
    /// Create a worktree in detached HEAD state.
    Detached,
}

/// Status of an in-progress VCS-native rebase, as reported by `rebase_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseGitStatus {
    None,
    InProgress,
    Conflicted,
}

/// Outcome of driving one rebase step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseOutcome {
    Clean,
    Conflicted,
}

/// **VcsOps** (§4.A): every interaction with the version-control CLI.
pub trait VcsOps: Send + Sync {
    fn list_worktrees(&self, repo_path: &Path) -> Result<Vec<WorktreeRef>, WsError>;

    /// Current branch checked out in `dir`; `None` for detached HEAD.
    fn current_branch(&self, dir: &Path) -> Result<Option<String>, WsError>;

    /// Detect the default branch: inspect remote HEAD, fall back to whichever
    /// of `main`/`master` exists, else fail.
    fn default_branch(&self, repo_path: &Path) -> Result<String, WsError>;

    /// The VCS "common directory" for `path` — used to locate the cached
    /// branch graph and to identify which worktrees share a repository.
    fn common_dir(&self, path: &Path) -> Result<PathBuf, WsError>;

    fn add_worktree(
        &self,
        repo_path: &Path,
        worktree_path: &Path,
        source: &AddWorktreeSource,
    ) -> Result<(), WsError>;

    fn move_worktree(&self, repo_path: &Path, from: &Path, to: &Path) -> Result<(), WsError>;

    fn remove_worktree(&self, repo_path: &Path, worktree_path: &Path, force: bool) -> Result<(), WsError>;

    fn checkout_branch(&self, dir: &Path, branch: &str) -> Result<(), WsError>;

    fn delete_branch(&self, repo_path: &Path, branch: &str, force: bool) -> Result<(), WsError>;

    fn prune(&self, repo_path: &Path) -> Result<(), WsError>;

    /// `None` if `branch` is not checked out anywhere.
    fn worktree_for_branch(&self, repo_path: &Path, branch: &str) -> Result<Option<PathBuf>, WsError>;

    fn has_staged_changes(&self, dir: &Path) -> Result<bool, WsError>;

    fn is_clean(&self, dir: &Path) -> Result<bool, WsError>;

    fn branch_exists(&self, repo_path: &Path, branch: &str) -> Result<bool, WsError>;

    fn merge_base(&self, dir: &Path, a: &str, b: &str) -> Result<String, WsError>;

    /// Commits in `(base, tip]`, ordered oldest-first (rebase order).
    fn commit_range(&self, dir: &Path, base: &str, tip: &str) -> Result<Vec<CommitDescriptor>, WsError>;

    fn conflicted_files(&self, dir: &Path) -> Result<Vec<String>, WsError>;

    /// Stage a path relative to `dir` (used by rebase conflict resolution
    /// after a strategy has rewritten a conflicted file).
    fn stage_path(&self, dir: &Path, relative_path: &str) -> Result<(), WsError>;

    fn rev_parse(&self, dir: &Path, reference: &str) -> Result<String, WsError>;

    fn rebase_start(&self, dir: &Path, onto: &str) -> Result<RebaseOutcome, WsError>;
    fn rebase_continue(&self, dir: &Path) -> Result<RebaseOutcome, WsError>;
    fn rebase_abort(&self, dir: &Path) -> Result<(), WsError>;
    fn rebase_status(&self, dir: &Path) -> Result<RebaseGitStatus, WsError>;

    /// Fast-forward `branch` in `repo_path` to `new_tip` (used by rebase `apply`).
    fn fast_forward_branch(&self, repo_path: &Path, branch: &str, new_tip: &str) -> Result<(), WsError>;

    /// Staged/modified/untracked file paths (§4.F git status collector).
    fn working_tree_files(&self, dir: &Path) -> Result<WorkingTreeFiles, WsError>;

    /// `(ahead, behind)` versus the current branch's upstream; `(0, 0)` if
    /// there is no upstream (§4.F git status collector).
    fn ahead_behind(&self, dir: &Path) -> Result<(u32, u32), WsError>;

    /// The most recent `limit` commits reachable from HEAD (§4.F git status collector).
    fn recent_commits(&self, dir: &Path, limit: usize) -> Result<Vec<CommitLogEntry>, WsError>;
}

/// A single pull request's state as reported by the PR host or stacked-diff cache.
#[derive(Debug, Clone)]
pub struct PrInfo {
    pub number: u64,
    pub state: PrState,
    pub title: String,
    pub url: String,
    pub is_draft: bool,
    pub checks_passing: ChecksStatus,
    pub owner: String,
    pub repo: String,
}

/// **PrHostOps** (§4.A): read-only access to the PR-hosting service's CLI.
pub trait PrHostOps: Send + Sync {
    fn pr_for_branch(&self, repo_path: &Path, branch: &str) -> Result<Option<PrInfo>, WsError>;
}

/// **StackedDiffOps** (§4.A): the external stacked-diff tool.
pub trait StackedDiffOps: Send + Sync {
    fn pr_url(&self, owner: &str, repo: &str, number: u64) -> String;

    fn sync(&self, repo_root: &Path, force: bool) -> Result<(), WsError>;

    /// Extended PR info the stacked-diff tool already caches locally, to
    /// avoid a slow network call (§4.F PR collector).
    fn cached_pr_info(&self, repo_path: &Path, branch: &str) -> Result<Option<PrInfo>, WsError>;

    /// Delete `branch` and any child-stack branches known to the tool (§4.D `rm -s`).
    fn delete_stack(&self, repo_path: &Path, branch: &str) -> Result<(), WsError>;
}

/// **GlobalConfigOps** (§4.A): persistence of the global config.
pub trait GlobalConfigOps: Send + Sync {
    fn load(&self) -> Result<crate::config::GlobalConfig, WsError>;

    /// Atomically persist `config` in its entirety (the "set any subset of
    /// settings atomically" contract is satisfied by callers mutating a
    /// loaded copy and calling `save`).
    fn save(&self, config: &crate::config::GlobalConfig) -> Result<(), WsError>;

    fn exists(&self) -> bool;

    fn path(&self) -> PathBuf;
}

/// **ShellOps** (§4.A): shell detection and PATH lookups.
pub trait ShellOps: Send + Sync {
    /// `(name, rc_file_path)`, or `None` if no shell could be detected.
    fn detect_shell(&self) -> Option<(String, PathBuf)>;

    /// Absolute path to `tool` if it is on PATH.
    fn find_tool(&self, tool: &str) -> Option<PathBuf>;
}
