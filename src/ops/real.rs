//! Real implementations of the Operations Layer: shell out to `git`, the
//! PR-host CLI (`gh`), and the stacked-diff CLI (`gt`), grounded in the
//! teacher's `Repository::run_command` subprocess convention.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::GlobalConfig;
use crate::error::WsError;
use crate::model::{ChecksStatus, CommitDescriptor, CommitLogEntry, PrState, WorkingTreeFiles, WorktreeRef};

use super::traits::{
    AddWorktreeSource, GlobalConfigOps, PrHostOps, PrInfo, RebaseGitStatus, RebaseOutcome,
    ShellOps, StackedDiffOps, VcsOps,
};

fn run(dir: &Path, program: &str, args: &[&str]) -> Result<String, WsError> {
    log::debug!("running: {program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| {
            WsError::external(
                format!("failed to spawn `{program}`: {e}"),
                format!("{program} {}", args.join(" ")),
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WsError::External {
            message: stderr.trim().to_string(),
            command: format!("{program} {}", args.join(" ")),
            exit_code: output.status.code(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn git(dir: &Path, args: &[&str]) -> Result<String, WsError> {
    run(dir, "git", args)
}

/// Real `VcsOps`, shelling out to `git`.
pub struct RealVcsOps;

impl VcsOps for RealVcsOps {
    fn list_worktrees(&self, repo_path: &Path) -> Result<Vec<WorktreeRef>, WsError> {
        let out = git(repo_path, &["worktree", "list", "--porcelain"])?;
        let mut refs = Vec::new();
        let mut path: Option<PathBuf> = None;
        let mut branch: Option<String> = None;

        for line in out.lines().chain(std::iter::once("")) {
            if line.is_empty() {
                if let Some(p) = path.take() {
                    refs.push(WorktreeRef {
                        is_root: false,
                        path: p,
                        branch: branch.take(),
                    });
                }
                continue;
            }
            if let Some(p) = line.strip_prefix("worktree ") {
                path = Some(PathBuf::from(p));
            } else if let Some(b) = line.strip_prefix("branch refs/heads/") {
                branch = Some(b.to_string());
            }
        }

        let repo_root = self.common_dir(repo_path).ok().and_then(|common| {
            common
                .parent()
                .filter(|_| !common.ends_with(".git"))
                .map(|p| p.to_path_buf())
        });
        for wt in &mut refs {
            if Some(&wt.path) == repo_root.as_ref() || wt.path == repo_path {
                wt.is_root = true;
            }
        }
        Ok(refs)
    }

    fn current_branch(&self, dir: &Path) -> Result<Option<String>, WsError> {
        let out = git(dir, &["symbolic-ref", "--short", "-q", "HEAD"]);
        match out {
            Ok(s) => Ok(Some(s.trim().to_string())),
            Err(WsError::External { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn default_branch(&self, repo_path: &Path) -> Result<String, WsError> {
        if let Ok(out) = git(repo_path, &["symbolic-ref", "refs/remotes/origin/HEAD"])
            && let Some(name) = out.trim().strip_prefix("refs/remotes/origin/")
        {
            return Ok(name.to_string());
        }
        for candidate in ["main", "master"] {
            if self.branch_exists(repo_path, candidate).unwrap_or(false) {
                return Ok(candidate.to_string());
            }
        }
        Err(WsError::not_found_with_hint(
            "could not determine the default branch",
            "set one up with a remote HEAD, or create a `main`/`master` branch",
        ))
    }

    fn common_dir(&self, path: &Path) -> Result<PathBuf, WsError> {
        let out = git(path, &["rev-parse", "--git-common-dir"])?;
        let raw = PathBuf::from(out.trim());
        Ok(if raw.is_absolute() {
            raw
        } else {
            path.join(raw)
        })
    }

    fn add_worktree(
        &self,
        repo_path: &Path,
        worktree_path: &Path,
        source: &AddWorktreeSource,
    ) -> Result<(), WsError> {
        let path_str = worktree_path.to_string_lossy().into_owned();
        let mut args: Vec<String> = vec!["worktree".into(), "add".into()];
        match source {
            AddWorktreeSource::ExistingBranch(branch) => {
                args.push(path_str);
                args.push(branch.clone());
            }
            AddWorktreeSource::NewBranch { branch, base } => {
                args.push("-b".into());
                args.push(branch.clone());
                args.push(path_str);
                if let Some(base) = base {
                    args.push(base.clone());
                }
            }
            AddWorktreeSource::Ref(reference) => {
                args.push("--detach".into());
                args.push(path_str);
                args.push(reference.clone());
            }
            AddWorktreeSource::Detached => {
                args.push("--detach".into());
                args.push(path_str);
            }
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        git(repo_path, &arg_refs)?;
        Ok(())
    }

    fn move_worktree(&self, repo_path: &Path, from: &Path, to: &Path) -> Result<(), WsError> {
        git(
            repo_path,
            &[
                "worktree",
                "move",
                &from.to_string_lossy(),
                &to.to_string_lossy(),
            ],
        )?;
        Ok(())
    }

    fn remove_worktree(&self, repo_path: &Path, worktree_path: &Path, force: bool) -> Result<(), WsError> {
        let path_str = worktree_path.to_string_lossy().into_owned();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path_str);
        git(repo_path, &args)?;
        Ok(())
    }

    fn checkout_branch(&self, dir: &Path, branch: &str) -> Result<(), WsError> {
        git(dir, &["checkout", branch])?;
        Ok(())
    }

    fn delete_branch(&self, repo_path: &Path, branch: &str, force: bool) -> Result<(), WsError> {
        let flag = if force { "-D" } else { "-d" };
        git(repo_path, &["branch", flag, branch])?;
        Ok(())
    }

    fn prune(&self, repo_path: &Path) -> Result<(), WsError> {
        git(repo_path, &["worktree", "prune"])?;
        Ok(())
    }

    fn worktree_for_branch(&self, repo_path: &Path, branch: &str) -> Result<Option<PathBuf>, WsError> {
        Ok(self
            .list_worktrees(repo_path)?
            .into_iter()
            .find(|w| w.branch.as_deref() == Some(branch))
            .map(|w| w.path))
    }

    fn has_staged_changes(&self, dir: &Path) -> Result<bool, WsError> {
        let out = git(dir, &["diff", "--cached", "--name-only"])?;
        Ok(!out.trim().is_empty())
    }

    fn is_clean(&self, dir: &Path) -> Result<bool, WsError> {
        let out = git(dir, &["status", "--porcelain"])?;
        Ok(out.trim().is_empty())
    }

    fn branch_exists(&self, repo_path: &Path, branch: &str) -> Result<bool, WsError> {
        let out = Command::new("git")
            .args(["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")])
            .current_dir(repo_path)
            .status()
            .map_err(|e| WsError::external(e.to_string(), "git show-ref".into()))?;
        Ok(out.success())
    }

    fn merge_base(&self, dir: &Path, a: &str, b: &str) -> Result<String, WsError> {
        Ok(git(dir, &["merge-base", a, b])?.trim().to_string())
    }

    fn commit_range(&self, dir: &Path, base: &str, tip: &str) -> Result<Vec<CommitDescriptor>, WsError> {
        let range = format!("{base}..{tip}");
        let out = git(
            dir,
            &["log", "--reverse", "--format=%H%x1f%h%x1f%s", &range],
        )?;
        Ok(out
            .lines()
            .filter(|l| !l.is_empty())
            .filter_map(|line| {
                let mut parts = line.splitn(3, '\u{1f}');
                Some(CommitDescriptor {
                    sha: parts.next()?.to_string(),
                    short_sha: parts.next()?.to_string(),
                    message: parts.next().unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    fn conflicted_files(&self, dir: &Path) -> Result<Vec<String>, WsError> {
        let out = git(dir, &["diff", "--name-only", "--diff-filter=U"])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    fn stage_path(&self, dir: &Path, relative_path: &str) -> Result<(), WsError> {
        git(dir, &["add", "--", relative_path])?;
        Ok(())
    }

    fn rev_parse(&self, dir: &Path, reference: &str) -> Result<String, WsError> {
        Ok(git(dir, &["rev-parse", reference])?.trim().to_string())
    }

    fn rebase_start(&self, dir: &Path, onto: &str) -> Result<RebaseOutcome, WsError> {
        match git(dir, &["rebase", onto]) {
            Ok(_) => Ok(RebaseOutcome::Clean),
            Err(WsError::External { .. }) if !self.conflicted_files(dir)?.is_empty() => {
                Ok(RebaseOutcome::Conflicted)
            }
            Err(e) => Err(e),
        }
    }

    fn rebase_continue(&self, dir: &Path) -> Result<RebaseOutcome, WsError> {
        match git(dir, &["rebase", "--continue"]) {
            Ok(_) => Ok(RebaseOutcome::Clean),
            Err(WsError::External { .. }) if !self.conflicted_files(dir)?.is_empty() => {
                Ok(RebaseOutcome::Conflicted)
            }
            Err(e) => Err(e),
        }
    }

    fn rebase_abort(&self, dir: &Path) -> Result<(), WsError> {
        git(dir, &["rebase", "--abort"])?;
        Ok(())
    }

    fn rebase_status(&self, dir: &Path) -> Result<RebaseGitStatus, WsError> {
        if dir.join(".git").join("rebase-merge").exists()
            || dir.join(".git").join("rebase-apply").exists()
        {
            if self.conflicted_files(dir)?.is_empty() {
                Ok(RebaseGitStatus::InProgress)
            } else {
                Ok(RebaseGitStatus::Conflicted)
            }
        } else {
            Ok(RebaseGitStatus::None)
        }
    }

    fn fast_forward_branch(&self, repo_path: &Path, branch: &str, new_tip: &str) -> Result<(), WsError> {
        git(repo_path, &["branch", "-f", branch, new_tip])?;
        Ok(())
    }

    fn working_tree_files(&self, dir: &Path) -> Result<WorkingTreeFiles, WsError> {
        let out = git(dir, &["status", "--porcelain"])?;
        let mut files = WorkingTreeFiles::default();
        for line in out.lines() {
            if line.len() < 3 {
                continue;
            }
            let (status, path) = line.split_at(2);
            let path = path.trim().to_string();
            let staged_code = status.chars().next().unwrap_or(' ');
            let worktree_code = status.chars().nth(1).unwrap_or(' ');
            if status == "??" {
                files.untracked.push(path);
            } else {
                if staged_code != ' ' {
                    files.staged.push(path.clone());
                }
                if worktree_code != ' ' {
                    files.modified.push(path);
                }
            }
        }
        Ok(files)
    }

    fn ahead_behind(&self, dir: &Path) -> Result<(u32, u32), WsError> {
        let out = match git(dir, &["rev-list", "--left-right", "--count", "@{upstream}...HEAD"]) {
            Ok(out) => out,
            Err(WsError::External { .. }) => return Ok((0, 0)),
            Err(e) => return Err(e),
        };
        let mut parts = out.split_whitespace();
        let behind = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let ahead = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        Ok((ahead, behind))
    }

    fn recent_commits(&self, dir: &Path, limit: usize) -> Result<Vec<CommitLogEntry>, WsError> {
        let limit_arg = format!("-{limit}");
        let out = git(
            dir,
            &["log", &limit_arg, "--format=%h%x1f%s%x1f%an%x1f%ar"],
        )?;
        Ok(out
            .lines()
            .filter(|l| !l.is_empty())
            .filter_map(|line| {
                let mut parts = line.splitn(4, '\u{1f}');
                Some(CommitLogEntry {
                    short_sha: parts.next()?.to_string(),
                    message: parts.next()?.to_string(),
                    author: parts.next()?.to_string(),
                    relative_date: parts.next().unwrap_or_default().to_string(),
                })
            })
            .collect())
    }
}

/// Real `PrHostOps`, shelling out to the `gh` CLI.
pub struct RealPrHostOps;

impl PrHostOps for RealPrHostOps {
    fn pr_for_branch(&self, repo_path: &Path, branch: &str) -> Result<Option<PrInfo>, WsError> {
        let out = run(
            repo_path,
            "gh",
            &[
                "pr",
                "view",
                branch,
                "--json",
                "number,state,title,url,isDraft,statusCheckRollup",
            ],
        );
        let raw = match out {
            Ok(s) => s,
            Err(WsError::External { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        #[derive(serde::Deserialize)]
        struct Check {
            conclusion: Option<String>,
            status: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct Resp {
            number: u64,
            state: String,
            title: String,
            url: String,
            #[serde(rename = "isDraft")]
            is_draft: bool,
            #[serde(default, rename = "statusCheckRollup")]
            status_check_rollup: Vec<Check>,
        }

        let parsed: Resp = serde_json::from_str(&raw)
            .map_err(|e| WsError::external(format!("failed to parse `gh` output: {e}"), "gh pr view".into()))?;

        let state = match parsed.state.as_str() {
            "OPEN" => PrState::Open,
            "MERGED" => PrState::Merged,
            _ => PrState::Closed,
        };

        let checks_passing = if parsed.status_check_rollup.is_empty() {
            ChecksStatus::Unknown
        } else if parsed
            .status_check_rollup
            .iter()
            .any(|c| c.conclusion.as_deref() == Some("FAILURE"))
        {
            ChecksStatus::Failing
        } else if parsed
            .status_check_rollup
            .iter()
            .all(|c| c.conclusion.as_deref() == Some("SUCCESS"))
        {
            ChecksStatus::Passing
        } else {
            ChecksStatus::Unknown
        };

        Ok(Some(PrInfo {
            number: parsed.number,
            state,
            title: parsed.title,
            url: parsed.url,
            is_draft: parsed.is_draft,
            checks_passing,
            owner: String::new(),
            repo: String::new(),
        }))
    }
}

/// Real `StackedDiffOps`, shelling out to the `gt` (stacked-diff) CLI.
pub struct RealStackedDiffOps;

impl StackedDiffOps for RealStackedDiffOps {
    fn pr_url(&self, owner: &str, repo: &str, number: u64) -> String {
        format!("https://github.com/{owner}/{repo}/pull/{number}")
    }

    fn sync(&self, repo_root: &Path, force: bool) -> Result<(), WsError> {
        let mut args = vec!["sync"];
        if force {
            args.push("--force");
        }
        run(repo_root, "gt", &args)?;
        Ok(())
    }

    fn cached_pr_info(&self, _repo_path: &Path, _branch: &str) -> Result<Option<PrInfo>, WsError> {
        // The stacked-diff tool's richer local cache format is proprietary;
        // callers fall back to PrHostOps when this returns None.
        Ok(None)
    }

    fn delete_stack(&self, repo_root: &Path, branch: &str) -> Result<(), WsError> {
        run(repo_root, "gt", &["branch", "delete", branch, "--force"])?;
        Ok(())
    }
}

/// Real `GlobalConfigOps`, backed by the TOML file on disk.
pub struct RealGlobalConfigOps;

impl GlobalConfigOps for RealGlobalConfigOps {
    fn load(&self) -> Result<GlobalConfig, WsError> {
        GlobalConfig::load().map_err(|e| WsError::external(e.to_string(), "load global config".into()))
    }

    fn save(&self, config: &GlobalConfig) -> Result<(), WsError> {
        config
            .save()
            .map_err(|e| WsError::external(e.to_string(), "save global config".into()))
    }

    fn exists(&self) -> bool {
        GlobalConfig::exists()
    }

    fn path(&self) -> PathBuf {
        crate::config::global_config_path().unwrap_or_default()
    }
}

/// Real `ShellOps`.
pub struct RealShellOps;

impl ShellOps for RealShellOps {
    fn detect_shell(&self) -> Option<(String, PathBuf)> {
        let shell_path = std::env::var("SHELL").ok()?;
        let name = Path::new(&shell_path).file_name()?.to_str()?.to_string();
        let home = home::home_dir()?;
        let rc = match name.as_str() {
            "bash" => home.join(".bashrc"),
            "zsh" => home.join(".zshrc"),
            "fish" => home.join(".config").join("fish").join("config.fish"),
            _ => return None,
        };
        Some((name, rc))
    }

    fn find_tool(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }
}
