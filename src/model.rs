//! Core entities (§3): `WorktreeRef`, `BranchGraph`, `PullRequest`, `RebaseStack`.

use std::path::PathBuf;

/// A checked-out copy of the repository at a specific path. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeRef {
    pub path: PathBuf,
    /// Absent means detached HEAD.
    pub branch: Option<String>,
    pub is_root: bool,
}

impl WorktreeRef {
    /// Directory name of a managed worktree (last path component), or `"root"`
    /// for the root worktree.
    pub fn name(&self) -> String {
        if self.is_root {
            return "root".to_string();
        }
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One branch's record inside a [`BranchGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    pub name: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub is_trunk_marker: bool,
}

/// A directed forest over branch names (§3, §4.C).
#[derive(Debug, Clone, Default)]
pub struct BranchGraph {
    nodes: std::collections::HashMap<String, BranchNode>,
}

impl BranchGraph {
    pub fn new(nodes: std::collections::HashMap<String, BranchNode>) -> Self {
        Self { nodes }
    }

    pub fn get(&self, name: &str) -> Option<&BranchNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

/// Tri-state CI check status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksStatus {
    Passing,
    Failing,
    Unknown,
}

/// A pull request associated with a branch (§3).
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub state: PrState,
    pub url: String,
    pub is_draft: bool,
    pub checks_passing: ChecksStatus,
    pub owner: String,
    pub repo: String,
}

impl PullRequest {
    /// `ready_to_merge = (state=OPEN ∧ ¬draft ∧ checks_passing ∈ {true, unknown})` (§4.F).
    pub fn ready_to_merge(&self) -> bool {
        self.state == PrState::Open
            && !self.is_draft
            && !matches!(self.checks_passing, ChecksStatus::Failing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseStatus {
    Created,
    Conflicted,
    Resolved,
    Applied,
    Aborted,
}

/// A commit carried along during a rebase preview, in rebase order.
#[derive(Debug, Clone)]
pub struct CommitDescriptor {
    pub sha: String,
    pub short_sha: String,
    pub message: String,
}

/// One entry of the git status collector's recent-commits list (§4.F).
#[derive(Debug, Clone)]
pub struct CommitLogEntry {
    pub short_sha: String,
    pub message: String,
    pub author: String,
    pub relative_date: String,
}

/// Staged/modified/untracked file paths from a working tree (§4.F git status collector).
#[derive(Debug, Clone, Default)]
pub struct WorkingTreeFiles {
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
}

/// A scratch rebase scaffold under `<repo_root>/<stack_location>/<source_branch>/` (§3, §4.G).
#[derive(Debug, Clone)]
pub struct RebaseStack {
    pub source_branch: String,
    pub target_branch: String,
    pub merge_base: String,
    pub commits_to_rebase: Vec<CommitDescriptor>,
    pub status: RebaseStatus,
    pub working_copy: PathBuf,
    /// The live source branch's tip SHA recorded at `preview` time, used to
    /// detect divergence before `apply`.
    pub recorded_source_tip: String,
}
