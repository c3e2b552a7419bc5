//! Stack-aware Navigation Engine (§4.E).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::branch_graph::{self, LoadResult};
use crate::context::WorkstackContext;
use crate::error::WsError;
use crate::model::BranchGraph;

fn require_stacks_enabled(ctx: &WorkstackContext) -> Result<(), WsError> {
    let global = ctx.global_config.load()?;
    if !global.use_graphite {
        return Err(WsError::precondition_with_hint(
            "this command requires the stacked-diff integration",
            "enable it with `config set use_graphite true`",
        ));
    }
    Ok(())
}

fn load_graph(ctx: &WorkstackContext, repo_root: &Path) -> Result<BranchGraph, WsError> {
    let common = ctx.vcs.common_dir(repo_root)?;
    branch_graph::require(&common)
}

/// Where a navigation command wants the caller's shell to end up.
#[derive(Debug, Clone)]
pub struct ActivationTarget {
    pub path: PathBuf,
    pub branch: Option<String>,
}

/// `up` / `down` can also report a boundary condition rather than failing.
#[derive(Debug, Clone)]
pub enum BoundaryOutcome {
    Activated(ActivationTarget),
    AlreadyAtTop,
    AlreadyAtBottom,
}

fn worktree_path_for_branch(
    ctx: &WorkstackContext,
    repo_root: &Path,
    branch: &str,
) -> Result<Option<PathBuf>, WsError> {
    ctx.vcs.worktree_for_branch(repo_root, branch)
}

/// `up` / `switch --up`: move to the current branch's first child (§4.E).
pub fn up(ctx: &WorkstackContext, repo_root: &Path, caller_dir: &Path) -> Result<BoundaryOutcome, WsError> {
    require_stacks_enabled(ctx)?;
    let current = ctx
        .vcs
        .current_branch(caller_dir)?
        .ok_or_else(|| WsError::precondition("caller's worktree is in detached HEAD"))?;
    let graph = load_graph(ctx, repo_root)?;
    let children = graph.get(&current).map(|n| n.children.clone()).unwrap_or_default();
    let Some(child) = children.first() else {
        return Ok(BoundaryOutcome::AlreadyAtTop);
    };
    match worktree_path_for_branch(ctx, repo_root, child)? {
        Some(path) => Ok(BoundaryOutcome::Activated(ActivationTarget {
            path,
            branch: Some(child.clone()),
        })),
        None => Err(WsError::precondition_with_hint(
            format!("'{child}' has no worktree"),
            format!("run `create {child}`"),
        )),
    }
}

/// `down` / `switch --down`: move to the current branch's parent (§4.E).
pub fn down(ctx: &WorkstackContext, repo_root: &Path, caller_dir: &Path) -> Result<BoundaryOutcome, WsError> {
    require_stacks_enabled(ctx)?;
    let current = ctx
        .vcs
        .current_branch(caller_dir)?
        .ok_or_else(|| WsError::precondition("caller's worktree is in detached HEAD"))?;
    let graph = load_graph(ctx, repo_root)?;
    if branch_graph::is_trunk(&graph, &current) {
        return Ok(BoundaryOutcome::AlreadyAtBottom);
    }
    let parent = graph
        .get(&current)
        .and_then(|n| n.parent.clone())
        .ok_or_else(|| WsError::corruption(format!("branch '{current}' has no parent but is not trunk")))?;

    let worktrees = ctx.vcs.list_worktrees(repo_root)?;
    if let Some(root) = worktrees.iter().find(|w| w.is_root)
        && root.branch.as_deref() == Some(parent.as_str())
    {
        return Ok(BoundaryOutcome::Activated(ActivationTarget {
            path: root.path.clone(),
            branch: Some(parent),
        }));
    }
    match worktree_path_for_branch(ctx, repo_root, &parent)? {
        Some(path) => Ok(BoundaryOutcome::Activated(ActivationTarget {
            path,
            branch: Some(parent),
        })),
        None => Err(WsError::precondition_with_hint(
            format!("'{parent}' has no worktree"),
            format!("run `create {parent}`"),
        )),
    }
}

/// `jump BRANCH` (§4.E). May check out `branch` inside the worktree that
/// contains it in its stack but doesn't have it checked out directly.
pub fn jump(ctx: &WorkstackContext, repo_root: &Path, branch: &str) -> Result<ActivationTarget, WsError> {
    require_stacks_enabled(ctx)?;
    let graph = load_graph(ctx, repo_root)?;
    let worktrees: Vec<_> = ctx
        .vcs
        .list_worktrees(repo_root)?
        .into_iter()
        .filter(|w| w.branch.is_some())
        .collect();

    let direct: Vec<_> = worktrees.iter().filter(|w| w.branch.as_deref() == Some(branch)).collect();
    if direct.len() == 1 {
        return Ok(ActivationTarget {
            path: direct[0].path.clone(),
            branch: Some(branch.to_string()),
        });
    }

    let in_stack: Vec<_> = worktrees
        .iter()
        .filter(|w| {
            w.branch
                .as_deref()
                .is_some_and(|b| branch_graph::stack_of(&graph, b).iter().any(|n| n == branch))
        })
        .collect();

    match in_stack.len() {
        0 => Err(WsError::not_found_with_hint(
            format!("'{branch}' was not found in any worktree's stack"),
            "try `create --from-branch`",
        )),
        1 => {
            ctx.vcs.checkout_branch(&in_stack[0].path, branch)?;
            Ok(ActivationTarget {
                path: in_stack[0].path.clone(),
                branch: Some(branch.to_string()),
            })
        }
        _ => Err(WsError::conflict_with_hint(
            format!("'{branch}' exists in multiple worktrees' stacks"),
            "use `switch` to pick one explicitly",
        )),
    }
}

/// One node of the rendered `tree` (§4.E). Only branches with a live worktree
/// are included; a worktree-less intermediate ancestor is skipped and its
/// worktreed descendants attach to the nearest worktreed ancestor instead.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub branch: String,
    pub worktree_name: String,
    pub is_current: bool,
    pub children: Vec<TreeNode>,
}

/// Build the forest for `tree` (§4.E). Requires the cached branch graph.
pub fn build_tree(
    ctx: &WorkstackContext,
    repo_root: &Path,
    caller_dir: &Path,
) -> Result<Vec<TreeNode>, WsError> {
    let common = ctx.vcs.common_dir(repo_root)?;
    let graph = match branch_graph::load(&common)? {
        LoadResult::Present(g) => g,
        LoadResult::Missing => {
            return Err(WsError::precondition_with_hint(
                "no stacked-diff branch cache found",
                "run the stacked-diff tool's sync command first",
            ));
        }
    };
    let worktrees = ctx.vcs.list_worktrees(repo_root)?;
    let current_branch = ctx.vcs.current_branch(caller_dir).ok().flatten();

    let branch_to_worktree: HashMap<String, String> = worktrees
        .iter()
        .filter_map(|w| w.branch.clone().map(|b| (b, w.name())))
        .collect();

    let mut children_of: HashMap<Option<String>, Vec<String>> = HashMap::new();
    for name in graph.names() {
        if !branch_to_worktree.contains_key(name) {
            continue;
        }
        let mut ancestor = graph.get(name).and_then(|n| n.parent.clone());
        let mut nearest = None;
        while let Some(candidate) = ancestor {
            if branch_to_worktree.contains_key(&candidate) {
                nearest = Some(candidate);
                break;
            }
            ancestor = graph.get(&candidate).and_then(|n| n.parent.clone());
        }
        children_of.entry(nearest).or_default().push(name.to_string());
    }

    fn build(
        name: &str,
        children_of: &HashMap<Option<String>, Vec<String>>,
        branch_to_worktree: &HashMap<String, String>,
        current_branch: &Option<String>,
    ) -> TreeNode {
        let mut children: Vec<TreeNode> = children_of
            .get(&Some(name.to_string()))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|c| build(&c, children_of, branch_to_worktree, current_branch))
            .collect();
        children.sort_by(|a, b| a.branch.cmp(&b.branch));
        TreeNode {
            branch: name.to_string(),
            worktree_name: branch_to_worktree.get(name).cloned().unwrap_or_default(),
            is_current: current_branch.as_deref() == Some(name),
            children,
        }
    }

    let mut roots: Vec<TreeNode> = children_of
        .get(&None)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|name| build(&name, &children_of, &branch_to_worktree, &current_branch))
        .collect();
    roots.sort_by(|a, b| a.branch.cmp(&b.branch));
    Ok(roots)
}

/// One row of a `list --stacks` section: a branch name plus whether it's the
/// worktree's current branch (§4.E).
#[derive(Debug, Clone)]
pub struct StackEntry {
    pub branch: String,
    pub is_current: bool,
}

/// Render the stack slice for a single worktree (§4.E "list --stacks"). The
/// root worktree shows only its ancestor chain; other worktrees additionally
/// show worktreed descendants.
pub fn stack_slice(
    ctx: &WorkstackContext,
    repo_root: &Path,
    graph: &BranchGraph,
    worktree_branch: &str,
    is_root: bool,
) -> Result<Vec<StackEntry>, WsError> {
    let mut entries = vec![StackEntry {
        branch: worktree_branch.to_string(),
        is_current: true,
    }];
    entries.extend(
        branch_graph::ancestors_of(graph, worktree_branch)
            .into_iter()
            .map(|branch| StackEntry { branch, is_current: false }),
    );

    if !is_root {
        let worktreed: HashSet<String> = ctx
            .vcs
            .list_worktrees(repo_root)?
            .into_iter()
            .filter_map(|w| w.branch)
            .collect();
        entries.extend(
            branch_graph::descendants_of(graph, worktree_branch)
                .into_iter()
                .filter(|d| worktreed.contains(d))
                .map(|branch| StackEntry { branch, is_current: false }),
        );
    }

    Ok(entries)
}

/// Write the one-line activation script (§4.E, §6) to a freshly created temp
/// file and return its path. The caller's shell wrapper sources and deletes
/// it.
pub fn write_activation_script(target: &Path) -> Result<PathBuf, WsError> {
    let mut file = tempfile::Builder::new()
        .prefix("workstack-activate-")
        .suffix(".sh")
        .tempfile()
        .map_err(|e| WsError::external(e.to_string(), "create activation script".to_string()))?;
    use std::io::Write;
    writeln!(file, "cd '{}'", target.display())
        .map_err(|e| WsError::external(e.to_string(), "write activation script".to_string()))?;
    let (_, path) = file
        .keep()
        .map_err(|e| WsError::external(e.to_string(), "persist activation script".to_string()))?;
    Ok(path)
}
