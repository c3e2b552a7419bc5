//! In-memory fakes for the Operations Abstraction Layer, used by unit tests
//! across `worktree.rs`, `navigation.rs`, `status.rs`, and `rebase.rs`
//! instead of shelling out to real subprocesses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::GlobalConfig;
use crate::error::WsError;
use crate::model::{CommitDescriptor, CommitLogEntry, WorkingTreeFiles, WorktreeRef};

use super::traits::{
    AddWorktreeSource, GlobalConfigOps, PrHostOps, PrInfo, RebaseGitStatus, RebaseOutcome,
    ShellOps, StackedDiffOps, VcsOps,
};

/// Fake [`VcsOps`] backed by plain in-memory state — no real git repository
/// is touched.
#[derive(Default)]
pub struct FakeVcsOps {
    state: Mutex<FakeVcsState>,
}

#[derive(Default)]
struct FakeVcsState {
    worktrees: Vec<WorktreeRef>,
    current_branch: HashMap<PathBuf, Option<String>>,
    default_branch: String,
    common_dir: PathBuf,
    branches: HashMap<String, String>,
    staged: HashMap<PathBuf, bool>,
    clean: HashMap<PathBuf, bool>,
    conflicts: HashMap<PathBuf, Vec<String>>,
    rebase_status: HashMap<PathBuf, RebaseGitStatus>,
    working_tree_files: HashMap<PathBuf, WorkingTreeFiles>,
    ahead_behind: HashMap<PathBuf, (u32, u32)>,
    recent_commits: HashMap<PathBuf, Vec<CommitLogEntry>>,
    commit_ranges: HashMap<PathBuf, Vec<CommitDescriptor>>,
    rebase_outcome: HashMap<PathBuf, RebaseOutcome>,
}

impl FakeVcsOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_worktree(self, wt: WorktreeRef) -> Self {
        self.state.lock().unwrap().worktrees.push(wt);
        self
    }

    pub fn set_default_branch(&self, name: impl Into<String>) {
        self.state.lock().unwrap().default_branch = name.into();
    }

    pub fn set_common_dir(&self, dir: impl Into<PathBuf>) {
        self.state.lock().unwrap().common_dir = dir.into();
    }

    pub fn set_branch(&self, name: impl Into<String>, tip: impl Into<String>) {
        self.state.lock().unwrap().branches.insert(name.into(), tip.into());
    }

    pub fn set_clean(&self, dir: impl Into<PathBuf>, clean: bool) {
        self.state.lock().unwrap().clean.insert(dir.into(), clean);
    }

    pub fn set_conflicts(&self, dir: impl Into<PathBuf>, files: Vec<String>) {
        self.state.lock().unwrap().conflicts.insert(dir.into(), files);
    }

    pub fn set_working_tree_files(&self, dir: impl Into<PathBuf>, files: WorkingTreeFiles) {
        self.state.lock().unwrap().working_tree_files.insert(dir.into(), files);
    }

    pub fn set_ahead_behind(&self, dir: impl Into<PathBuf>, ahead: u32, behind: u32) {
        self.state.lock().unwrap().ahead_behind.insert(dir.into(), (ahead, behind));
    }

    pub fn set_recent_commits(&self, dir: impl Into<PathBuf>, commits: Vec<CommitLogEntry>) {
        self.state.lock().unwrap().recent_commits.insert(dir.into(), commits);
    }

    pub fn set_commit_range(&self, dir: impl Into<PathBuf>, commits: Vec<CommitDescriptor>) {
        self.state.lock().unwrap().commit_ranges.insert(dir.into(), commits);
    }

    pub fn set_rebase_outcome(&self, dir: impl Into<PathBuf>, outcome: RebaseOutcome) {
        self.state.lock().unwrap().rebase_outcome.insert(dir.into(), outcome);
    }

    pub fn set_rebase_status(&self, dir: impl Into<PathBuf>, status: RebaseGitStatus) {
        self.state.lock().unwrap().rebase_status.insert(dir.into(), status);
    }
}

impl VcsOps for FakeVcsOps {
    fn list_worktrees(&self, _repo_path: &Path) -> Result<Vec<WorktreeRef>, WsError> {
        Ok(self.state.lock().unwrap().worktrees.clone())
    }

    fn current_branch(&self, dir: &Path) -> Result<Option<String>, WsError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .current_branch
            .get(dir)
            .cloned()
            .flatten())
    }

    fn default_branch(&self, _repo_path: &Path) -> Result<String, WsError> {
        let state = self.state.lock().unwrap();
        if state.default_branch.is_empty() {
            return Err(WsError::not_found("no default branch configured in fake"));
        }
        Ok(state.default_branch.clone())
    }

    fn common_dir(&self, _path: &Path) -> Result<PathBuf, WsError> {
        Ok(self.state.lock().unwrap().common_dir.clone())
    }

    fn add_worktree(
        &self,
        _repo_path: &Path,
        worktree_path: &Path,
        source: &AddWorktreeSource,
    ) -> Result<(), WsError> {
        let branch = match source {
            AddWorktreeSource::ExistingBranch(b) => Some(b.clone()),
            AddWorktreeSource::NewBranch { branch, .. } => Some(branch.clone()),
            AddWorktreeSource::Ref(_) | AddWorktreeSource::Detached => None,
        };
        self.state.lock().unwrap().worktrees.push(WorktreeRef {
            path: worktree_path.to_path_buf(),
            branch,
            is_root: false,
        });
        Ok(())
    }

    fn move_worktree(&self, _repo_path: &Path, from: &Path, to: &Path) -> Result<(), WsError> {
        let mut state = self.state.lock().unwrap();
        if let Some(wt) = state.worktrees.iter_mut().find(|w| w.path == from) {
            wt.path = to.to_path_buf();
        }
        Ok(())
    }

    fn remove_worktree(&self, _repo_path: &Path, worktree_path: &Path, _force: bool) -> Result<(), WsError> {
        self.state.lock().unwrap().worktrees.retain(|w| w.path != worktree_path);
        Ok(())
    }

    fn checkout_branch(&self, dir: &Path, branch: &str) -> Result<(), WsError> {
        self.state
            .lock()
            .unwrap()
            .current_branch
            .insert(dir.to_path_buf(), Some(branch.to_string()));
        Ok(())
    }

    fn delete_branch(&self, _repo_path: &Path, branch: &str, _force: bool) -> Result<(), WsError> {
        self.state.lock().unwrap().branches.remove(branch);
        Ok(())
    }

    fn prune(&self, _repo_path: &Path) -> Result<(), WsError> {
        Ok(())
    }

    fn worktree_for_branch(&self, _repo_path: &Path, branch: &str) -> Result<Option<PathBuf>, WsError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .worktrees
            .iter()
            .find(|w| w.branch.as_deref() == Some(branch))
            .map(|w| w.path.clone()))
    }

    fn has_staged_changes(&self, dir: &Path) -> Result<bool, WsError> {
        Ok(self.state.lock().unwrap().staged.get(dir).copied().unwrap_or(false))
    }

    fn is_clean(&self, dir: &Path) -> Result<bool, WsError> {
        Ok(self.state.lock().unwrap().clean.get(dir).copied().unwrap_or(true))
    }

    fn branch_exists(&self, _repo_path: &Path, branch: &str) -> Result<bool, WsError> {
        Ok(self.state.lock().unwrap().branches.contains_key(branch))
    }

    fn merge_base(&self, _dir: &Path, _a: &str, _b: &str) -> Result<String, WsError> {
        Ok("0000000".to_string())
    }

    fn commit_range(&self, dir: &Path, _base: &str, _tip: &str) -> Result<Vec<CommitDescriptor>, WsError> {
        Ok(self.state.lock().unwrap().commit_ranges.get(dir).cloned().unwrap_or_default())
    }

    fn conflicted_files(&self, dir: &Path) -> Result<Vec<String>, WsError> {
        Ok(self.state.lock().unwrap().conflicts.get(dir).cloned().unwrap_or_default())
    }

    fn stage_path(&self, dir: &Path, relative_path: &str) -> Result<(), WsError> {
        let mut state = self.state.lock().unwrap();
        if let Some(files) = state.conflicts.get_mut(dir) {
            files.retain(|f| f != relative_path);
        }
        Ok(())
    }

    fn rev_parse(&self, _dir: &Path, reference: &str) -> Result<String, WsError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .branches
            .get(reference)
            .cloned()
            .unwrap_or_else(|| reference.to_string()))
    }

    fn rebase_start(&self, dir: &Path, _onto: &str) -> Result<RebaseOutcome, WsError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .rebase_outcome
            .get(dir)
            .copied()
            .unwrap_or(RebaseOutcome::Clean))
    }

    fn rebase_continue(&self, dir: &Path) -> Result<RebaseOutcome, WsError> {
        let mut state = self.state.lock().unwrap();
        state.conflicts.remove(dir);
        Ok(RebaseOutcome::Clean)
    }

    fn rebase_abort(&self, _dir: &Path) -> Result<(), WsError> {
        Ok(())
    }

    fn rebase_status(&self, dir: &Path) -> Result<RebaseGitStatus, WsError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .rebase_status
            .get(dir)
            .copied()
            .unwrap_or(RebaseGitStatus::None))
    }

    fn fast_forward_branch(&self, _repo_path: &Path, branch: &str, new_tip: &str) -> Result<(), WsError> {
        self.state.lock().unwrap().branches.insert(branch.to_string(), new_tip.to_string());
        Ok(())
    }

    fn working_tree_files(&self, dir: &Path) -> Result<WorkingTreeFiles, WsError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .working_tree_files
            .get(dir)
            .cloned()
            .unwrap_or_default())
    }

    fn ahead_behind(&self, dir: &Path) -> Result<(u32, u32), WsError> {
        Ok(self.state.lock().unwrap().ahead_behind.get(dir).copied().unwrap_or((0, 0)))
    }

    fn recent_commits(&self, dir: &Path, limit: usize) -> Result<Vec<CommitLogEntry>, WsError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .recent_commits
            .get(dir)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .collect())
    }
}

/// Fake [`PrHostOps`] returning canned per-branch PR info.
#[derive(Default)]
pub struct FakePrHostOps {
    prs: Mutex<HashMap<String, PrInfo>>,
}

impl FakePrHostOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pr(&self, branch: impl Into<String>, info: PrInfo) {
        self.prs.lock().unwrap().insert(branch.into(), info);
    }
}

impl PrHostOps for FakePrHostOps {
    fn pr_for_branch(&self, _repo_path: &Path, branch: &str) -> Result<Option<PrInfo>, WsError> {
        Ok(self.prs.lock().unwrap().get(branch).cloned())
    }
}

/// Fake [`StackedDiffOps`] with an in-memory parent map instead of a real
/// `.graphite_cache_persist` file.
#[derive(Default)]
pub struct FakeStackedDiffOps {
    synced: Mutex<bool>,
    cached: Mutex<HashMap<String, PrInfo>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeStackedDiffOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cached_pr(&self, branch: impl Into<String>, info: PrInfo) {
        self.cached.lock().unwrap().insert(branch.into(), info);
    }

    pub fn was_synced(&self) -> bool {
        *self.synced.lock().unwrap()
    }

    pub fn deleted_branches(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl StackedDiffOps for FakeStackedDiffOps {
    fn pr_url(&self, owner: &str, repo: &str, number: u64) -> String {
        format!("https://example.invalid/{owner}/{repo}/pull/{number}")
    }

    fn sync(&self, _repo_root: &Path, _force: bool) -> Result<(), WsError> {
        *self.synced.lock().unwrap() = true;
        Ok(())
    }

    fn cached_pr_info(&self, _repo_path: &Path, branch: &str) -> Result<Option<PrInfo>, WsError> {
        Ok(self.cached.lock().unwrap().get(branch).cloned())
    }

    fn delete_stack(&self, _repo_path: &Path, branch: &str) -> Result<(), WsError> {
        self.deleted.lock().unwrap().push(branch.to_string());
        Ok(())
    }
}

/// Fake [`GlobalConfigOps`] holding the config purely in memory.
pub struct FakeGlobalConfigOps {
    config: Mutex<Option<GlobalConfig>>,
    path: PathBuf,
}

impl Default for FakeGlobalConfigOps {
    fn default() -> Self {
        Self {
            config: Mutex::new(None),
            path: PathBuf::from("/fake/config.toml"),
        }
    }
}

impl FakeGlobalConfigOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(config: GlobalConfig) -> Self {
        Self {
            config: Mutex::new(Some(config)),
            path: PathBuf::from("/fake/config.toml"),
        }
    }
}

impl GlobalConfigOps for FakeGlobalConfigOps {
    fn load(&self) -> Result<GlobalConfig, WsError> {
        Ok(self.config.lock().unwrap().clone().unwrap_or_default())
    }

    fn save(&self, config: &GlobalConfig) -> Result<(), WsError> {
        *self.config.lock().unwrap() = Some(config.clone());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.config.lock().unwrap().is_some()
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}

/// Fake [`ShellOps`] returning canned values instead of inspecting the real
/// environment.
pub struct FakeShellOps {
    pub shell: Option<(String, PathBuf)>,
    pub tools: HashMap<String, PathBuf>,
}

impl Default for FakeShellOps {
    fn default() -> Self {
        Self {
            shell: Some(("bash".to_string(), PathBuf::from("/home/user/.bashrc"))),
            tools: HashMap::new(),
        }
    }
}

impl FakeShellOps {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShellOps for FakeShellOps {
    fn detect_shell(&self) -> Option<(String, PathBuf)> {
        self.shell.clone()
    }

    fn find_tool(&self, tool: &str) -> Option<PathBuf> {
        self.tools.get(tool).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_vcs_add_and_list_worktree() {
        let vcs = FakeVcsOps::new();
        vcs.add_worktree(
            Path::new("/repo"),
            Path::new("/ws/repo/feature"),
            &AddWorktreeSource::NewBranch {
                branch: "feature".to_string(),
                base: None,
            },
        )
        .unwrap();
        let worktrees = vcs.list_worktrees(Path::new("/repo")).unwrap();
        assert_eq!(worktrees.len(), 1);
        assert_eq!(worktrees[0].branch.as_deref(), Some("feature"));
    }

    #[test]
    fn test_fake_vcs_remove_worktree() {
        let vcs = FakeVcsOps::new().with_worktree(WorktreeRef {
            path: PathBuf::from("/ws/repo/feature"),
            branch: Some("feature".to_string()),
            is_root: false,
        });
        vcs.remove_worktree(Path::new("/repo"), Path::new("/ws/repo/feature"), false)
            .unwrap();
        assert!(vcs.list_worktrees(Path::new("/repo")).unwrap().is_empty());
    }

    #[test]
    fn test_fake_stacked_diff_sync_and_delete() {
        let stacked = FakeStackedDiffOps::new();
        assert!(!stacked.was_synced());
        stacked.sync(Path::new("/repo"), false).unwrap();
        assert!(stacked.was_synced());
        stacked.delete_stack(Path::new("/repo"), "feature").unwrap();
        assert_eq!(stacked.deleted_branches(), vec!["feature".to_string()]);
    }

    #[test]
    fn test_fake_global_config_roundtrip() {
        let ops = FakeGlobalConfigOps::new();
        assert!(!ops.exists());
        let mut config = ops.load().unwrap();
        config.use_graphite = true;
        ops.save(&config).unwrap();
        assert!(ops.exists());
        assert!(ops.load().unwrap().use_graphite);
    }
}
