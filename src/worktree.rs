//! Worktree Lifecycle Manager (§4.D): create, rename, move/swap, remove, gc.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RepoConfig;
use crate::context::WorkstackContext;
use crate::error::WsError;
use crate::model::{PrState, WorktreeRef};
use crate::ops::{AddWorktreeSource, PrInfo};
use crate::validate::{sanitize_branch_name, sanitize_worktree_name, strip_plan_word, validate_worktree_name};

const RESERVED_BRANCH_NAMES: &[&str] = &["main", "master"];

fn repo_config_path(workstacks_root: &Path, repo_name: &str) -> PathBuf {
    workstacks_root.join(repo_name).join("config.toml")
}

fn load_repo_config(workstacks_root: &Path, repo_name: &str) -> Result<RepoConfig, WsError> {
    RepoConfig::load(&repo_config_path(workstacks_root, repo_name))
        .map_err(|e| WsError::external(e.to_string(), "load repo config".to_string()))
        .map(|opt| opt.unwrap_or_default())
}

fn write_env_file(
    config: &RepoConfig,
    worktree_path: &Path,
    repo_root: &Path,
    name: &str,
) -> Result<(), WsError> {
    let contents = config.render_env(worktree_path, repo_root, name);
    std::fs::write(worktree_path.join(".env"), contents)
        .map_err(|e| WsError::external(e.to_string(), "write .env".to_string()))
}

/// Options for `create` (§4.D, §6).
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub plan: Option<PathBuf>,
    pub keep_plan: bool,
    pub from_current_branch: bool,
    pub from_branch: Option<String>,
    pub no_post: bool,
}

/// A command whose non-zero exit was reported and continued past (§4.D step 9,
/// Open Question 3).
#[derive(Debug, Clone)]
pub struct PostCreateFailure {
    pub command: String,
    pub exit_code: i32,
    pub stderr_tail: String,
}

pub struct CreateOutcome {
    pub worktree: WorktreeRef,
    pub post_create_failures: Vec<PostCreateFailure>,
}

enum ResolvedSource {
    New { base: String },
    Existing { branch: String },
}

/// Create a new managed worktree. `repo_root` is the root worktree's path;
/// `caller_dir` is the directory the command was invoked from (used to
/// resolve `--from-current-branch` and the staged-changes precondition).
pub fn create(
    ctx: &WorkstackContext,
    repo_root: &Path,
    caller_dir: &Path,
    repo_name: &str,
    opts: CreateOptions,
) -> Result<CreateOutcome, WsError> {
    if opts.keep_plan && opts.plan.is_none() {
        return Err(WsError::usage("--keep-plan requires --plan"));
    }
    if opts.from_current_branch && opts.from_branch.is_some() {
        return Err(WsError::usage(
            "--from-current-branch and --from-branch cannot both be given",
        ));
    }

    // Step 1: worktree name.
    let raw_name = if let Some(plan) = &opts.plan {
        let stem = plan
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        strip_plan_word(&stem)
    } else {
        opts.name
            .clone()
            .ok_or_else(|| WsError::usage("a worktree name is required unless --plan is given"))?
    };
    let worktree_name = sanitize_worktree_name(&raw_name);
    validate_worktree_name(&worktree_name)?;

    // Step 2: branch name.
    let branch_name = opts
        .branch
        .clone()
        .unwrap_or_else(|| sanitize_branch_name(&worktree_name));
    if RESERVED_BRANCH_NAMES.contains(&branch_name.as_str()) {
        return Err(WsError::validation(format!(
            "'{branch_name}' is a reserved branch name"
        )));
    }

    // Step 3: source ref.
    let default_branch = ctx.vcs.default_branch(repo_root)?;
    let resolved = if opts.from_current_branch {
        let current = ctx.vcs.current_branch(caller_dir)?.ok_or_else(|| {
            WsError::precondition("caller's working directory has no checked-out branch")
        })?;
        if current == default_branch {
            return Err(WsError::precondition_with_hint(
                "--from-current-branch was given but the current branch is the default branch",
                "use plain `create` to branch from the default branch, or pass --from-branch explicitly",
            ));
        }
        ResolvedSource::New { base: current }
    } else if let Some(from_branch) = &opts.from_branch {
        if !ctx.vcs.branch_exists(repo_root, from_branch)? {
            return Err(WsError::not_found(format!(
                "branch '{from_branch}' does not exist"
            )));
        }
        if let Some(existing_path) = ctx.vcs.worktree_for_branch(repo_root, from_branch)? {
            return Err(WsError::conflict(format!(
                "branch '{from_branch}' is already checked out in {}",
                existing_path.display()
            )));
        }
        ResolvedSource::Existing {
            branch: from_branch.clone(),
        }
    } else {
        ResolvedSource::New { base: default_branch }
    };

    let global = ctx.global_config.load()?;

    // Step 4: destination path.
    let dest = global.workstacks_root.join(repo_name).join(&worktree_name);
    if dest.exists() {
        return Err(WsError::conflict(format!(
            "a worktree already exists at {}",
            dest.display()
        )));
    }

    // Step 5: staged-changes precondition for stacked-diff adoption.
    if global.use_graphite
        && matches!(resolved, ResolvedSource::Existing { .. })
        && ctx.vcs.has_staged_changes(caller_dir)?
    {
        return Err(WsError::precondition_with_hint(
            "cannot adopt an existing branch into a stack with staged changes present",
            "commit or stash the staged changes first",
        ));
    }

    // Step 6: create the worktree, then prune stale metadata.
    let add_source = match &resolved {
        ResolvedSource::New { base } => AddWorktreeSource::NewBranch {
            branch: branch_name.clone(),
            base: Some(base.clone()),
        },
        ResolvedSource::Existing { branch } => AddWorktreeSource::ExistingBranch(branch.clone()),
    };
    ctx.vcs.add_worktree(repo_root, &dest, &add_source)?;
    ctx.vcs.prune(repo_root)?;

    // Step 7: render .env. `ctx.vcs.add_worktree` above is a no-op under
    // dry-run (handled by the decorator), so `dest` never exists on disk in
    // that mode; writing through it would fail rather than suppress, so
    // steps 7-9 short-circuit here instead (§3 invariant 6).
    let repo_config = load_repo_config(&global.workstacks_root, repo_name)?;
    if ctx.dry_run {
        crate::styling::println!("[DRY RUN] Would write {}", dest.join(".env").display());
        if let Some(plan) = &opts.plan {
            let verb = if opts.keep_plan { "copy" } else { "move" };
            crate::styling::println!(
                "[DRY RUN] Would {verb} {} to {}",
                plan.display(),
                dest.join(".PLAN.md").display()
            );
        }
        return Ok(CreateOutcome {
            worktree: WorktreeRef {
                path: dest,
                branch: Some(match resolved {
                    ResolvedSource::New { .. } => branch_name,
                    ResolvedSource::Existing { branch } => branch,
                }),
                is_root: false,
            },
            post_create_failures: Vec::new(),
        });
    }
    write_env_file(&repo_config, &dest, repo_root, &worktree_name)?;

    // Step 8: plan file.
    if let Some(plan) = &opts.plan {
        let target = dest.join(".PLAN.md");
        if opts.keep_plan {
            std::fs::copy(plan, &target)
                .map_err(|e| WsError::external(e.to_string(), "copy plan file".to_string()))?;
        } else {
            std::fs::rename(plan, &target)
                .map_err(|e| WsError::external(e.to_string(), "move plan file".to_string()))?;
        }
    }

    // Step 9: post-create commands.
    let mut post_create_failures = Vec::new();
    if !opts.no_post
        && let Some(post_create) = &repo_config.post_create
    {
        for command in &post_create.commands {
            let output = std::process::Command::new(&post_create.shell)
                .arg("-c")
                .arg(command)
                .current_dir(&dest)
                .output();
            match output {
                Ok(output) if !output.status.success() => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().into_iter().rev().collect::<Vec<_>>().join("\n");
                    post_create_failures.push(PostCreateFailure {
                        command: command.clone(),
                        exit_code: output.status.code().unwrap_or(1),
                        stderr_tail: tail,
                    });
                }
                Ok(_) => {}
                Err(e) => post_create_failures.push(PostCreateFailure {
                    command: command.clone(),
                    exit_code: 1,
                    stderr_tail: e.to_string(),
                }),
            }
        }
    }

    Ok(CreateOutcome {
        worktree: WorktreeRef {
            path: dest,
            branch: Some(match resolved {
                ResolvedSource::New { .. } => branch_name,
                ResolvedSource::Existing { branch } => branch,
            }),
            is_root: false,
        },
        post_create_failures,
    })
}

/// Rename a managed worktree in place (§4.D "Rename").
pub fn rename(
    ctx: &WorkstackContext,
    repo_root: &Path,
    repo_name: &str,
    old_name: &str,
    new_name: &str,
) -> Result<WorktreeRef, WsError> {
    let new_name = sanitize_worktree_name(new_name);
    validate_worktree_name(&new_name)?;

    let global = ctx.global_config.load()?;
    let repo_dir = global.workstacks_root.join(repo_name);
    let old_path = repo_dir.join(old_name);
    let new_path = repo_dir.join(&new_name);

    if !old_path.exists() {
        return Err(WsError::not_found(format!(
            "no worktree named '{old_name}'"
        )));
    }
    if new_path.exists() {
        return Err(WsError::conflict(format!(
            "a worktree already exists at {}",
            new_path.display()
        )));
    }

    ctx.vcs.move_worktree(repo_root, &old_path, &new_path)?;

    // `move_worktree` is a no-op under dry-run, so `new_path` never lands on
    // disk in that mode; regenerating `.env` there would fail rather than
    // suppress (§3 invariant 6).
    if ctx.dry_run {
        crate::styling::println!("[DRY RUN] Would write {}", new_path.join(".env").display());
        return Ok(WorktreeRef {
            branch: None,
            path: new_path,
            is_root: false,
        });
    }

    let branch = ctx.vcs.current_branch(&new_path)?;
    let repo_config = load_repo_config(&global.workstacks_root, repo_name)?;
    write_env_file(&repo_config, &new_path, repo_root, &new_name)?;

    Ok(WorktreeRef {
        path: new_path,
        branch,
        is_root: false,
    })
}

/// Specifies which worktree is the source of a `move`/`swap` (§4.D, §6).
#[derive(Debug, Clone)]
pub enum MoveSource {
    Current,
    Branch(String),
    Worktree(String),
}

/// Specifies the target of a `move`/`swap`.
#[derive(Debug, Clone)]
pub enum MoveTarget {
    Worktree(String),
    Root,
}

fn resolve_move_source(
    ctx: &WorkstackContext,
    repo_root: &Path,
    caller_dir: &Path,
    repo_name: &str,
    source: &MoveSource,
) -> Result<WorktreeRef, WsError> {
    let worktrees = ctx.vcs.list_worktrees(repo_root)?;
    match source {
        MoveSource::Current => worktrees
            .into_iter()
            .find(|w| w.path == caller_dir)
            .ok_or_else(|| WsError::not_found("caller's directory is not a managed worktree")),
        MoveSource::Branch(branch) => worktrees
            .into_iter()
            .find(|w| w.branch.as_deref() == Some(branch.as_str()))
            .ok_or_else(|| WsError::not_found(format!("branch '{branch}' has no worktree"))),
        MoveSource::Worktree(name) => {
            let global = ctx.global_config.load()?;
            let path = global.workstacks_root.join(repo_name).join(name);
            worktrees
                .into_iter()
                .find(|w| w.path == path)
                .ok_or_else(|| WsError::not_found(format!("no worktree named '{name}'")))
        }
    }
}

fn resolve_move_target_path(
    ctx: &WorkstackContext,
    repo_root: &Path,
    repo_name: &str,
    target: &MoveTarget,
) -> Result<PathBuf, WsError> {
    match target {
        MoveTarget::Root => Ok(repo_root.to_path_buf()),
        MoveTarget::Worktree(name) => {
            let global = ctx.global_config.load()?;
            Ok(global.workstacks_root.join(repo_name).join(name))
        }
    }
}

/// Move or swap a worktree's branch to a new location (§4.D "Move/swap").
///
/// `swap_ref_name` overrides the name of the temporary holding path used
/// while exchanging two worktrees (`--ref` in §6); a name is generated if
/// absent.
pub fn move_or_swap(
    ctx: &WorkstackContext,
    repo_root: &Path,
    caller_dir: &Path,
    repo_name: &str,
    source: MoveSource,
    target: MoveTarget,
    force: bool,
    swap_ref_name: Option<String>,
) -> Result<(), WsError> {
    let source_wt = resolve_move_source(ctx, repo_root, caller_dir, repo_name, &source)?;
    if source_wt.branch.is_none() {
        return Err(WsError::precondition("cannot move a detached worktree"));
    }

    let target_path = resolve_move_target_path(ctx, repo_root, repo_name, &target)?;
    if source_wt.path == target_path {
        return Err(WsError::usage(
            "source and target resolve to the same worktree",
        ));
    }

    let worktrees = ctx.vcs.list_worktrees(repo_root)?;
    let target_wt = worktrees.into_iter().find(|w| w.path == target_path);

    match target_wt {
        Some(existing) if existing.branch.is_some() => {
            if !force {
                return Err(WsError::precondition_with_hint(
                    "target worktree has a branch checked out; this is a swap",
                    "pass --force to confirm the swap",
                ));
            }
            let tmp_name = swap_ref_name.unwrap_or_else(|| format!(".swap-tmp-{}", std::process::id()));
            let tmp_path = target_path
                .parent()
                .unwrap_or(repo_root)
                .join(tmp_name);
            ctx.vcs.move_worktree(repo_root, &target_path, &tmp_path)?;
            ctx.vcs.move_worktree(repo_root, &source_wt.path, &target_path)?;
            ctx.vcs.move_worktree(repo_root, &tmp_path, &source_wt.path)?;
        }
        _ => {
            ctx.vcs.move_worktree(repo_root, &source_wt.path, &target_path)?;
        }
    }
    Ok(())
}

/// Remove a managed worktree (§4.D "Remove").
pub fn remove(
    ctx: &WorkstackContext,
    repo_root: &Path,
    repo_name: &str,
    name: &str,
    force: bool,
    delete_stack: bool,
) -> Result<(), WsError> {
    if matches!(name, "root" | ".." | "/") || name.contains('/') || name.contains('\\') {
        return Err(WsError::validation(format!(
            "'{name}' cannot be removed"
        )));
    }

    let global = ctx.global_config.load()?;
    let path = global.workstacks_root.join(repo_name).join(name);
    let worktrees = ctx.vcs.list_worktrees(repo_root)?;
    let target = worktrees
        .into_iter()
        .find(|w| w.path == path)
        .ok_or_else(|| WsError::not_found(format!("no worktree named '{name}'")))?;

    if !force && !ctx.dry_run && !confirm_removal(name, &target.path)? {
        crate::styling::println!("not removing '{name}'");
        return Ok(());
    }

    ctx.vcs.remove_worktree(repo_root, &target.path, force)?;

    if delete_stack && let Some(branch) = &target.branch {
        if global.use_graphite {
            ctx.stacked.delete_stack(repo_root, branch)?;
        } else {
            ctx.vcs.delete_branch(repo_root, branch, force)?;
        }
    }
    Ok(())
}

/// Ask on stderr whether to remove `name` at `path`, per §4.D "Remove":
/// "Without force, confirm interactively; on 'no', leave the worktree
/// untouched." Mirrors the teacher's own `prompt_for_approval` idiom
/// (bold `[y/N]`, read a line from stdin, anything but `y`/`yes` is "no").
fn confirm_removal(name: &str, path: &Path) -> Result<bool, WsError> {
    use crate::styling::{AnstyleStyle, eprint, eprintln};
    use std::io::{self, Write};

    let bold = AnstyleStyle::new().bold();

    eprintln!("Remove worktree '{name}' at {}?", path.display());
    eprint!("{bold}[y/N]{bold:#} ");
    io::stderr()
        .flush()
        .map_err(|e| WsError::external(format!("failed to write prompt: {e}"), "prompt"))?;

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .map_err(|e| WsError::external(format!("failed to read confirmation: {e}"), "prompt"))?;

    let response = response.trim();
    Ok(response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes"))
}

/// A managed worktree whose PR is merged or closed, surfaced by `gc` (§4.D
/// "Garbage-collect"). Never auto-deleted.
pub struct GcCandidate {
    pub worktree: WorktreeRef,
    pub pr: PrInfo,
    pub removal_command: String,
}

/// Enumerate managed worktrees whose PR is MERGED or CLOSED.
pub fn gc(ctx: &WorkstackContext, repo_root: &Path, repo_name: &str) -> Result<Vec<GcCandidate>, WsError> {
    let global = ctx.global_config.load()?;
    let managed_root = global.workstacks_root.join(repo_name);
    let worktrees = ctx.vcs.list_worktrees(repo_root)?;

    let mut candidates = Vec::new();
    for wt in worktrees {
        if wt.is_root || wt.branch.is_none() || !wt.path.starts_with(&managed_root) {
            continue;
        }
        let branch = wt.branch.as_deref().unwrap();
        let pr = ctx
            .stacked
            .cached_pr_info(repo_root, branch)?
            .map(Ok)
            .unwrap_or_else(|| {
                ctx.pr_host
                    .pr_for_branch(repo_root, branch)
                    .map(|opt| opt.unwrap_or_else(|| default_pr_info(branch)))
            })?;
        if matches!(pr.state, PrState::Merged | PrState::Closed) {
            let removal_command = format!("ws rm {} -f", wt.name());
            candidates.push(GcCandidate {
                worktree: wt,
                pr,
                removal_command,
            });
        }
    }
    Ok(candidates)
}

fn default_pr_info(branch: &str) -> PrInfo {
    PrInfo {
        number: 0,
        state: PrState::Open,
        title: String::new(),
        url: String::new(),
        is_draft: false,
        checks_passing: crate::model::ChecksStatus::Unknown,
        owner: String::new(),
        repo: branch.to_string(),
    }
}
