//! Dry-run decorators (§4.A): delegate read methods directly; for every
//! mutating method, print `[DRY RUN] Would <describe action>` and return a
//! success-shaped no-op result.

use std::path::{Path, PathBuf};

use crate::config::GlobalConfig;
use crate::error::WsError;
use crate::model::{CommitDescriptor, CommitLogEntry, WorkingTreeFiles, WorktreeRef};
use crate::styling::println;

use super::traits::{
    AddWorktreeSource, GlobalConfigOps, RebaseGitStatus, RebaseOutcome, ShellOps, StackedDiffOps,
    VcsOps,
};

fn announce(action: impl std::fmt::Display) {
    println!("[DRY RUN] Would {action}");
}

/// Dry-run decorator over [`VcsOps`].
pub struct DryRunVcsOps<T: VcsOps> {
    inner: T,
}

impl<T: VcsOps> DryRunVcsOps<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: VcsOps> VcsOps for DryRunVcsOps<T> {
    fn list_worktrees(&self, repo_path: &Path) -> Result<Vec<WorktreeRef>, WsError> {
        self.inner.list_worktrees(repo_path)
    }

    fn current_branch(&self, dir: &Path) -> Result<Option<String>, WsError> {
        self.inner.current_branch(dir)
    }

    fn default_branch(&self, repo_path: &Path) -> Result<String, WsError> {
        self.inner.default_branch(repo_path)
    }

    fn common_dir(&self, path: &Path) -> Result<PathBuf, WsError> {
        self.inner.common_dir(path)
    }

    fn add_worktree(
        &self,
        _repo_path: &Path,
        worktree_path: &Path,
        source: &AddWorktreeSource,
    ) -> Result<(), WsError> {
        announce(format!(
            "run: git worktree add {} ({source:?})",
            worktree_path.display()
        ));
        Ok(())
    }

    fn move_worktree(&self, _repo_path: &Path, from: &Path, to: &Path) -> Result<(), WsError> {
        announce(format!(
            "run: git worktree move {} {}",
            from.display(),
            to.display()
        ));
        Ok(())
    }

    fn remove_worktree(&self, _repo_path: &Path, worktree_path: &Path, force: bool) -> Result<(), WsError> {
        let flag = if force { " --force" } else { "" };
        announce(format!("run: git worktree remove{flag} {}", worktree_path.display()));
        Ok(())
    }

    fn checkout_branch(&self, _dir: &Path, branch: &str) -> Result<(), WsError> {
        announce(format!("run: git checkout {branch}"));
        Ok(())
    }

    fn delete_branch(&self, _repo_path: &Path, branch: &str, force: bool) -> Result<(), WsError> {
        let flag = if force { "-D" } else { "-d" };
        announce(format!("run: git branch {flag} {branch}"));
        Ok(())
    }

    fn prune(&self, _repo_path: &Path) -> Result<(), WsError> {
        announce("run: git worktree prune");
        Ok(())
    }

    fn worktree_for_branch(&self, repo_path: &Path, branch: &str) -> Result<Option<PathBuf>, WsError> {
        self.inner.worktree_for_branch(repo_path, branch)
    }

    fn has_staged_changes(&self, dir: &Path) -> Result<bool, WsError> {
        self.inner.has_staged_changes(dir)
    }

    fn is_clean(&self, dir: &Path) -> Result<bool, WsError> {
        self.inner.is_clean(dir)
    }

    fn branch_exists(&self, repo_path: &Path, branch: &str) -> Result<bool, WsError> {
        self.inner.branch_exists(repo_path, branch)
    }

    fn merge_base(&self, dir: &Path, a: &str, b: &str) -> Result<String, WsError> {
        self.inner.merge_base(dir, a, b)
    }

    fn commit_range(&self, dir: &Path, base: &str, tip: &str) -> Result<Vec<CommitDescriptor>, WsError> {
        self.inner.commit_range(dir, base, tip)
    }

    fn conflicted_files(&self, dir: &Path) -> Result<Vec<String>, WsError> {
        self.inner.conflicted_files(dir)
    }

    fn stage_path(&self, _dir: &Path, relative_path: &str) -> Result<(), WsError> {
        announce(format!("run: git add {relative_path}"));
        Ok(())
    }

    fn rev_parse(&self, dir: &Path, reference: &str) -> Result<String, WsError> {
        self.inner.rev_parse(dir, reference)
    }

    fn rebase_start(&self, _dir: &Path, onto: &str) -> Result<RebaseOutcome, WsError> {
        announce(format!("run: git rebase {onto}"));
        Ok(RebaseOutcome::Clean)
    }

    fn rebase_continue(&self, _dir: &Path) -> Result<RebaseOutcome, WsError> {
        announce("run: git rebase --continue");
        Ok(RebaseOutcome::Clean)
    }

    fn rebase_abort(&self, _dir: &Path) -> Result<(), WsError> {
        announce("run: git rebase --abort");
        Ok(())
    }

    fn rebase_status(&self, dir: &Path) -> Result<RebaseGitStatus, WsError> {
        self.inner.rebase_status(dir)
    }

    fn fast_forward_branch(&self, _repo_path: &Path, branch: &str, new_tip: &str) -> Result<(), WsError> {
        announce(format!("run: git branch -f {branch} {new_tip}"));
        Ok(())
    }

    fn working_tree_files(&self, dir: &Path) -> Result<WorkingTreeFiles, WsError> {
        self.inner.working_tree_files(dir)
    }

    fn ahead_behind(&self, dir: &Path) -> Result<(u32, u32), WsError> {
        self.inner.ahead_behind(dir)
    }

    fn recent_commits(&self, dir: &Path, limit: usize) -> Result<Vec<CommitLogEntry>, WsError> {
        self.inner.recent_commits(dir, limit)
    }
}

/// Dry-run decorator over [`StackedDiffOps`].
pub struct DryRunStackedDiffOps<T: StackedDiffOps> {
    inner: T,
}

impl<T: StackedDiffOps> DryRunStackedDiffOps<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: StackedDiffOps> StackedDiffOps for DryRunStackedDiffOps<T> {
    fn pr_url(&self, owner: &str, repo: &str, number: u64) -> String {
        self.inner.pr_url(owner, repo, number)
    }

    fn sync(&self, repo_root: &Path, force: bool) -> Result<(), WsError> {
        announce(format!(
            "run: gt sync{} in {}",
            if force { " --force" } else { "" },
            repo_root.display()
        ));
        Ok(())
    }

    fn cached_pr_info(
        &self,
        repo_path: &Path,
        branch: &str,
    ) -> Result<Option<super::traits::PrInfo>, WsError> {
        self.inner.cached_pr_info(repo_path, branch)
    }

    fn delete_stack(&self, _repo_path: &Path, branch: &str) -> Result<(), WsError> {
        announce(format!("delete stacked-diff stack rooted at {branch}"));
        Ok(())
    }
}

/// Dry-run decorator over [`GlobalConfigOps`].
pub struct DryRunGlobalConfigOps<T: GlobalConfigOps> {
    inner: T,
}

impl<T: GlobalConfigOps> DryRunGlobalConfigOps<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: GlobalConfigOps> GlobalConfigOps for DryRunGlobalConfigOps<T> {
    fn load(&self) -> Result<GlobalConfig, WsError> {
        self.inner.load()
    }

    fn save(&self, _config: &GlobalConfig) -> Result<(), WsError> {
        announce(format!("write global config to {}", self.inner.path().display()));
        Ok(())
    }

    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn path(&self) -> PathBuf {
        self.inner.path()
    }
}

/// Dry-run decorator over [`ShellOps`] (no mutating methods; pure pass-through).
pub struct DryRunShellOps<T: ShellOps> {
    inner: T,
}

impl<T: ShellOps> DryRunShellOps<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: ShellOps> ShellOps for DryRunShellOps<T> {
    fn detect_shell(&self) -> Option<(String, PathBuf)> {
        self.inner.detect_shell()
    }

    fn find_tool(&self, tool: &str) -> Option<PathBuf> {
        self.inner.find_tool(tool)
    }
}
