//! Rebase Orchestrator (§4.G): drives one rebase of `source_branch` onto
//! `target_branch` through an isolated scratch worktree, grounded in the
//! `(none) -> created/conflicted -> resolved -> applied` state machine and
//! the conflict-marker resolution behavior exercised by
//! `tests/core/test_conflict_resolver.py`.
//!
//! ```text
//! (none) --preview--> created -------> resolved --apply--> applied
//!                       |                  ^
//!                       |                  |
//!                       +--conflict-----> conflicted
//!                                          |
//!                                          +--abort--> (none)
//! ```

use std::path::{Path, PathBuf};

use crate::context::WorkstackContext;
use crate::error::WsError;
use crate::model::{CommitDescriptor, RebaseStack, RebaseStatus};
use crate::ops::AddWorktreeSource;
use crate::validate::sanitize_branch_name;

const META_FILE_NAME: &str = ".workstack-rebase-meta.toml";

/// A conflicted file's resolution strategy (§4.G `resolve`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictStrategy {
    Ours,
    Theirs,
}

/// Result of running the `test` phase's command inside the scratch worktree.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub command: String,
    pub passed: bool,
    pub output: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct RebaseMeta {
    source_branch: String,
    target_branch: String,
    merge_base: String,
    recorded_source_tip: String,
    status: String,
    scratch_branch: String,
}

fn status_to_str(status: RebaseStatus) -> &'static str {
    match status {
        RebaseStatus::Created => "created",
        RebaseStatus::Conflicted => "conflicted",
        RebaseStatus::Resolved => "resolved",
        RebaseStatus::Applied => "applied",
        RebaseStatus::Aborted => "aborted",
    }
}

fn status_from_str(s: &str) -> RebaseStatus {
    match s {
        "conflicted" => RebaseStatus::Conflicted,
        "resolved" => RebaseStatus::Resolved,
        "applied" => RebaseStatus::Applied,
        "aborted" => RebaseStatus::Aborted,
        _ => RebaseStatus::Created,
    }
}

fn scratch_branch_name(source_branch: &str) -> String {
    format!("workstack-rebase/{}", sanitize_branch_name(source_branch))
}

fn stack_root(repo_root: &Path, stack_location: &str) -> PathBuf {
    repo_root.join(stack_location)
}

fn scratch_dir(repo_root: &Path, stack_location: &str, source_branch: &str) -> PathBuf {
    stack_root(repo_root, stack_location).join(sanitize_branch_name(source_branch))
}

fn meta_path(scratch: &Path) -> PathBuf {
    scratch.join(META_FILE_NAME)
}

fn load_meta(scratch: &Path) -> Option<RebaseMeta> {
    let contents = std::fs::read_to_string(meta_path(scratch)).ok()?;
    toml::from_str(&contents).ok()
}

fn save_meta(scratch: &Path, meta: &RebaseMeta) -> Result<(), WsError> {
    let contents = toml::to_string_pretty(meta)
        .map_err(|e| WsError::corruption(format!("failed to serialize rebase metadata: {e}")))?;
    std::fs::write(meta_path(scratch), contents)
        .map_err(|e| WsError::external(format!("failed to write rebase metadata: {e}"), "write"))
}

/// `preview` (§4.G). `force` discards an existing scratch stack for
/// `source_branch` first, otherwise an existing stack is returned unchanged
/// (idempotent, per §8 "round-trip & idempotence").
pub fn preview(
    ctx: &WorkstackContext,
    repo_root: &Path,
    source_branch: &str,
    target_branch: &str,
    force: bool,
) -> Result<RebaseStack, WsError> {
    let global = ctx.global_config.load()?;
    let scratch = scratch_dir(repo_root, &global.rebase.stack_location, source_branch);

    if scratch.exists() {
        if !force {
            if let Some(meta) = load_meta(&scratch) {
                return Ok(rebuild_stack(ctx, &scratch, &meta)?);
            }
        }
        abort(ctx, repo_root, source_branch)?;
    }

    let recorded_source_tip = ctx.vcs.rev_parse(repo_root, source_branch)?;
    let merge_base = ctx.vcs.merge_base(repo_root, source_branch, target_branch)?;
    let commits_to_rebase = ctx.vcs.commit_range(repo_root, &merge_base, source_branch)?;

    let scratch_branch = scratch_branch_name(source_branch);
    std::fs::create_dir_all(stack_root(repo_root, &global.rebase.stack_location))
        .map_err(|e| WsError::external(format!("failed to create rebase stack directory: {e}"), "mkdir"))?;
    ctx.vcs.add_worktree(
        repo_root,
        &scratch,
        &AddWorktreeSource::NewBranch {
            branch: scratch_branch.clone(),
            base: Some(source_branch.to_string()),
        },
    )?;

    let outcome = ctx.vcs.rebase_start(&scratch, target_branch)?;
    let status = match outcome {
        crate::ops::RebaseOutcome::Clean => RebaseStatus::Created,
        crate::ops::RebaseOutcome::Conflicted => RebaseStatus::Conflicted,
    };

    let meta = RebaseMeta {
        source_branch: source_branch.to_string(),
        target_branch: target_branch.to_string(),
        merge_base: merge_base.clone(),
        recorded_source_tip,
        status: status_to_str(status).to_string(),
        scratch_branch,
    };
    save_meta(&scratch, &meta)?;

    Ok(RebaseStack {
        source_branch: source_branch.to_string(),
        target_branch: target_branch.to_string(),
        merge_base,
        commits_to_rebase,
        status,
        working_copy: scratch,
        recorded_source_tip: meta.recorded_source_tip,
    })
}

fn rebuild_stack(ctx: &WorkstackContext, scratch: &Path, meta: &RebaseMeta) -> Result<RebaseStack, WsError> {
    let merge_base = meta.merge_base.clone();
    let commits_to_rebase = ctx
        .vcs
        .commit_range(scratch, &merge_base, &meta.scratch_branch)
        .unwrap_or_default();
    Ok(RebaseStack {
        source_branch: meta.source_branch.clone(),
        target_branch: meta.target_branch.clone(),
        merge_base,
        commits_to_rebase,
        status: status_from_str(&meta.status),
        working_copy: scratch.to_path_buf(),
        recorded_source_tip: meta.recorded_source_tip.clone(),
    })
}

/// `resolve` (§4.G): apply `strategy` to every currently conflicted file in
/// the scratch worktree, then stage it and re-scan for remaining markers.
pub fn resolve(
    ctx: &WorkstackContext,
    repo_root: &Path,
    source_branch: &str,
    strategy: ConflictStrategy,
) -> Result<RebaseStack, WsError> {
    let global = ctx.global_config.load()?;
    let scratch = scratch_dir(repo_root, &global.rebase.stack_location, source_branch);
    let meta = load_meta(&scratch)
        .ok_or_else(|| WsError::not_found(format!("no rebase stack found for '{source_branch}'")))?;

    let conflicted = ctx.vcs.conflicted_files(&scratch)?;
    if conflicted.is_empty() {
        return rebuild_stack(ctx, &scratch, &meta);
    }

    for relative in &conflicted {
        let path = scratch.join(relative);
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| WsError::external(format!("failed to read {relative}: {e}"), "read"))?;
        let resolved = match strategy {
            ConflictStrategy::Ours => resolve_keep_ours(&contents),
            ConflictStrategy::Theirs => resolve_keep_theirs(&contents),
        };
        std::fs::write(&path, &resolved)
            .map_err(|e| WsError::external(format!("failed to write {relative}: {e}"), "write"))?;
        if has_conflict_markers(&resolved) {
            return Err(WsError::conflict(format!(
                "conflict markers remain in {relative} after applying strategy"
            )));
        }
        ctx.vcs.stage_path(&scratch, relative)?;
    }

    let still_conflicted = ctx.vcs.conflicted_files(&scratch)?;
    let outcome = if still_conflicted.is_empty() {
        ctx.vcs.rebase_continue(&scratch)?
    } else {
        crate::ops::RebaseOutcome::Conflicted
    };

    let status = match outcome {
        crate::ops::RebaseOutcome::Clean => RebaseStatus::Resolved,
        crate::ops::RebaseOutcome::Conflicted => RebaseStatus::Conflicted,
    };

    let mut meta = meta;
    meta.status = status_to_str(status).to_string();
    save_meta(&scratch, &meta)?;
    rebuild_stack(ctx, &scratch, &meta)
}

/// Keep every conflict region's "ours" side (between `<<<<<<<` and `=======`),
/// discarding the marker lines and the "theirs" side.
fn resolve_keep_ours(content: &str) -> String {
    resolve_conflicts(content, true)
}

/// Keep every conflict region's "theirs" side (between `=======` and `>>>>>>>`).
fn resolve_keep_theirs(content: &str) -> String {
    resolve_conflicts(content, false)
}

fn resolve_conflicts(content: &str, keep_ours: bool) -> String {
    let mut out = Vec::new();
    let mut in_conflict = false;
    let mut in_ours = false;
    for line in content.lines() {
        if line.starts_with("<<<<<<<") {
            in_conflict = true;
            in_ours = true;
            continue;
        }
        if in_conflict && line.starts_with("=======") {
            in_ours = false;
            continue;
        }
        if in_conflict && line.starts_with(">>>>>>>") {
            in_conflict = false;
            continue;
        }
        if in_conflict {
            if (keep_ours && in_ours) || (!keep_ours && !in_ours) {
                out.push(line);
            }
            continue;
        }
        out.push(line);
    }
    out.join("\n")
}

fn has_conflict_markers(content: &str) -> bool {
    content.lines().any(|l| {
        l.starts_with("<<<<<<<") || l.starts_with("=======") || l.starts_with(">>>>>>>")
    })
}

/// `test` (§4.G): run a command (explicit or auto-detected) in the scratch
/// worktree.
pub fn test(
    ctx: &WorkstackContext,
    repo_root: &Path,
    source_branch: &str,
    command: Option<&str>,
) -> Result<TestResult, WsError> {
    let global = ctx.global_config.load()?;
    let scratch = scratch_dir(repo_root, &global.rebase.stack_location, source_branch);
    if !scratch.exists() {
        return Err(WsError::not_found(format!(
            "no rebase stack found for '{source_branch}'"
        )));
    }

    let command = match command {
        Some(c) => c.to_string(),
        None => detect_test_command(&scratch).ok_or_else(|| {
            WsError::precondition_with_hint(
                "no test command detected",
                "pass --command, or add one of pytest.ini/pyproject.toml/package.json/Cargo.toml/go.mod",
            )
        })?,
    };

    let parts = shlex::split(&command)
        .ok_or_else(|| WsError::usage(format!("could not parse test command: {command}")))?;
    let (program, args) = parts
        .split_first()
        .ok_or_else(|| WsError::usage("empty test command"))?;

    let output = std::process::Command::new(program)
        .args(args)
        .current_dir(&scratch)
        .output()
        .map_err(|e| WsError::external(format!("failed to run test command: {e}"), command.clone()))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(TestResult {
        command,
        passed: output.status.success(),
        output: combined,
    })
}

/// Auto-detection table: known project markers to a default test command.
fn detect_test_command(scratch: &Path) -> Option<String> {
    const MARKERS: &[(&str, &str)] = &[
        ("pytest.ini", "pytest"),
        ("setup.cfg", "pytest"),
        ("pyproject.toml", "pytest"),
        ("package.json", "npm test"),
        ("Cargo.toml", "cargo test"),
        ("go.mod", "go test ./..."),
    ];
    MARKERS
        .iter()
        .find(|(marker, _)| scratch.join(marker).exists())
        .map(|(_, cmd)| cmd.to_string())
}

/// `apply` (§4.G): fast-forward the live `source_branch` to the scratch
/// branch's rebased tip. Refuses unless `force` when the live branch has
/// diverged from what `preview` recorded.
pub fn apply(
    ctx: &WorkstackContext,
    repo_root: &Path,
    source_branch: &str,
    force: bool,
) -> Result<RebaseStack, WsError> {
    let global = ctx.global_config.load()?;
    let scratch = scratch_dir(repo_root, &global.rebase.stack_location, source_branch);
    let meta = load_meta(&scratch)
        .ok_or_else(|| WsError::not_found(format!("no rebase stack found for '{source_branch}'")))?;

    let status = status_from_str(&meta.status);
    if !matches!(status, RebaseStatus::Created | RebaseStatus::Resolved) {
        return Err(WsError::precondition(format!(
            "rebase stack for '{source_branch}' is not ready to apply (state: {})",
            meta.status
        )));
    }

    if !force {
        let live_tip = ctx.vcs.rev_parse(repo_root, source_branch)?;
        if live_tip != meta.recorded_source_tip {
            return Err(WsError::precondition_with_hint(
                format!("'{source_branch}' has moved since `rebase preview` ran"),
                "re-run `rebase preview`, or pass --force to apply anyway",
            ));
        }
        if !ctx.vcs.is_clean(repo_root)? {
            return Err(WsError::precondition_with_hint(
                "the live worktree has uncommitted changes",
                "commit or stash them, or pass --force",
            ));
        }
    }

    let new_tip = ctx.vcs.rev_parse(&scratch, &meta.scratch_branch)?;
    ctx.vcs.fast_forward_branch(repo_root, source_branch, &new_tip)?;

    if !global.rebase.preserve_stacks {
        remove_scratch(ctx, repo_root, &scratch, &meta)?;
    } else {
        let mut meta = meta;
        meta.status = status_to_str(RebaseStatus::Applied).to_string();
        save_meta(&scratch, &meta)?;
    }

    Ok(RebaseStack {
        source_branch: source_branch.to_string(),
        target_branch: meta.target_branch.clone(),
        merge_base: meta.merge_base.clone(),
        commits_to_rebase: Vec::new(),
        status: RebaseStatus::Applied,
        working_copy: scratch,
        recorded_source_tip: new_tip,
    })
}

/// `abort` (§4.G): discard the scratch worktree and its metadata.
pub fn abort(ctx: &WorkstackContext, repo_root: &Path, source_branch: &str) -> Result<(), WsError> {
    let global = ctx.global_config.load()?;
    let scratch = scratch_dir(repo_root, &global.rebase.stack_location, source_branch);
    if !scratch.exists() {
        return Ok(());
    }
    let meta = load_meta(&scratch);
    remove_scratch(ctx, repo_root, &scratch, &meta.unwrap_or(RebaseMeta {
        source_branch: source_branch.to_string(),
        target_branch: String::new(),
        merge_base: String::new(),
        recorded_source_tip: String::new(),
        status: status_to_str(RebaseStatus::Aborted).to_string(),
        scratch_branch: scratch_branch_name(source_branch),
    }))
}

fn remove_scratch(
    ctx: &WorkstackContext,
    repo_root: &Path,
    scratch: &Path,
    meta: &RebaseMeta,
) -> Result<(), WsError> {
    let _ = ctx.vcs.rebase_abort(scratch);
    ctx.vcs.remove_worktree(repo_root, scratch, true)?;
    if std::fs::metadata(scratch).is_ok() {
        std::fs::remove_dir_all(scratch)
            .map_err(|e| WsError::external(format!("failed to remove scratch directory: {e}"), "rm"))?;
    }
    let _ = ctx.vcs.delete_branch(repo_root, &meta.scratch_branch, true);
    Ok(())
}

/// `compare` (§4.G): the commits that would land on `source_branch`, i.e. the
/// delta between the live branch and the scratch's rebased tip.
pub fn compare(
    ctx: &WorkstackContext,
    repo_root: &Path,
    source_branch: &str,
) -> Result<Vec<CommitDescriptor>, WsError> {
    let global = ctx.global_config.load()?;
    let scratch = scratch_dir(repo_root, &global.rebase.stack_location, source_branch);
    let meta = load_meta(&scratch)
        .ok_or_else(|| WsError::not_found(format!("no rebase stack found for '{source_branch}'")))?;
    ctx.vcs.commit_range(&scratch, source_branch, &meta.scratch_branch)
}

/// `status` (§4.G): enumerate existing rebase stacks and their phase.
pub fn status(ctx: &WorkstackContext, repo_root: &Path) -> Result<Vec<RebaseStack>, WsError> {
    let global = ctx.global_config.load()?;
    let root = stack_root(repo_root, &global.rebase.stack_location);
    if !root.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(&root)
        .map_err(|e| WsError::external(format!("failed to read rebase stack directory: {e}"), "readdir"))?;

    let mut stacks = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| WsError::external(format!("failed to read directory entry: {e}"), "readdir"))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(meta) = load_meta(&path) {
            stacks.push(rebuild_stack(ctx, &path, &meta)?);
        }
    }
    stacks.sort_by(|a, b| a.source_branch.cmp(&b.source_branch));
    Ok(stacks)
}
