//! Shared test harness for `ws` integration tests.
//!
//! `TestRepo` creates an isolated git repository under a temp directory with
//! deterministic commit metadata. Each command is run with
//! `HOME`/`XDG_CONFIG_HOME` pointed at a directory inside the temp dir, so
//! `GlobalConfig::load()`'s platform lookup never touches the real user
//! config.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct TestRepo {
    temp_dir: TempDir,
    root: PathBuf,
    pub worktrees: HashMap<String, PathBuf>,
    home_dir: PathBuf,
    workstacks_root: PathBuf,
}

impl TestRepo {
    /// Create a fresh repo on `main` with one commit.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let root = temp_dir.path().join("repo");
        std::fs::create_dir(&root).expect("failed to create repo dir");
        let root = root.canonicalize().expect("failed to canonicalize repo root");

        let home_dir = temp_dir.path().join("home");
        std::fs::create_dir(&home_dir).expect("failed to create fake HOME");
        let workstacks_root = temp_dir.path().join("worktrees");
        std::fs::create_dir(&workstacks_root).expect("failed to create workstacks root");

        let repo = Self {
            temp_dir,
            root,
            worktrees: HashMap::new(),
            home_dir,
            workstacks_root,
        };

        repo.git(&["init", "-b", "main"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.commit("initial commit");
        repo
    }

    fn configure_git_cmd(cmd: &mut Command) {
        cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
        cmd.env("GIT_CONFIG_SYSTEM", "/dev/null");
        cmd.env("GIT_AUTHOR_DATE", "2026-01-01T00:00:00Z");
        cmd.env("GIT_COMMITTER_DATE", "2026-01-01T00:00:00Z");
        cmd.env("LC_ALL", "C");
        cmd.env("LANG", "C");
    }

    fn git(&self, args: &[&str]) -> String {
        let mut cmd = Command::new("git");
        Self::configure_git_cmd(&mut cmd);
        let output = cmd
            .args(args)
            .current_dir(&self.root)
            .output()
            .expect("failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Run a git command against the root worktree and return its stdout.
    pub fn git_output(&self, args: &[&str]) -> String {
        self.git(args)
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    pub fn workstacks_root(&self) -> &Path {
        &self.workstacks_root
    }

    pub fn worktree_path(&self, name: &str) -> &Path {
        self.worktrees
            .get(name)
            .unwrap_or_else(|| panic!("worktree '{name}' not tracked by TestRepo"))
    }

    /// Write a file and commit it.
    pub fn commit(&self, message: &str) {
        let marker = self.root.join(format!(".marker-{}", self.worktrees.len()));
        std::fs::write(&marker, message).expect("failed to write marker file");
        self.git(&["add", "-A"]);
        self.git(&["commit", "-m", message]);
    }

    /// Write `relpath` inside `dir` (any worktree, not just the root) and
    /// commit it there.
    pub fn commit_in(&self, dir: &Path, relpath: &str, contents: &str, message: &str) {
        let file = dir.join(relpath);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&file, contents).expect("failed to write file");
        let mut add = Command::new("git");
        Self::configure_git_cmd(&mut add);
        let status = add.args(["add", "-A"]).current_dir(dir).status().expect("failed to run git add");
        assert!(status.success());
        let mut commit = Command::new("git");
        Self::configure_git_cmd(&mut commit);
        let status = commit
            .args(["commit", "-m", message])
            .current_dir(dir)
            .status()
            .expect("failed to run git commit");
        assert!(status.success());
    }

    /// Add a worktree at `<workstacks_root>/repo/<name>` on a new branch.
    pub fn add_worktree(&mut self, name: &str, branch: &str) -> PathBuf {
        let dest = self.workstacks_root.join("repo").join(name);
        std::fs::create_dir_all(dest.parent().unwrap()).expect("failed to create parent dir");
        self.git(&[
            "worktree",
            "add",
            "-b",
            branch,
            dest.to_str().expect("non-utf8 path"),
        ]);
        let dest = dest.canonicalize().expect("failed to canonicalize worktree path");
        self.worktrees.insert(name.to_string(), dest.clone());
        dest
    }

    /// Build a `ws` command against this repo, with an isolated `HOME` so
    /// `GlobalConfig::load()` never touches the real user's config, and
    /// `WORKSTACK_WORKSTACKS_ROOT` pointed at this repo's temp worktrees dir.
    pub fn ws_command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ws"));
        Self::configure_git_cmd(&mut cmd);
        for (key, _) in std::env::vars() {
            if key.starts_with("WORKSTACK_") {
                cmd.env_remove(&key);
            }
        }
        cmd.current_dir(&self.root);
        cmd.env("HOME", &self.home_dir);
        cmd.env("XDG_CONFIG_HOME", self.home_dir.join(".config"));
        cmd.env(
            "WORKSTACK_WORKSTACKS_ROOT",
            self.workstacks_root.to_str().expect("non-utf8 path"),
        );
        cmd.env("NO_COLOR", "1");
        cmd
    }

    /// Write the stacked-diff tool's cached branch graph at this repo's
    /// `.git/.graphite_cache_persist` (§4.C).
    pub fn write_branch_graph(&self, json: &str) {
        let git_dir = self.root.join(".git");
        std::fs::write(git_dir.join(".graphite_cache_persist"), json)
            .expect("failed to write branch graph cache");
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Remove a worktree added via [`Self::add_worktree`] directly through
    /// git, bypassing `ws rm` (for scenarios that need the branch free of any
    /// checkout before a later operation, e.g. `git branch -f`).
    pub fn remove_worktree(&mut self, name: &str) {
        let path = self
            .worktrees
            .remove(name)
            .unwrap_or_else(|| panic!("worktree '{name}' not tracked by TestRepo"));
        self.git(&["worktree", "remove", "--force", path.to_str().expect("non-utf8 path")]);
    }
}
