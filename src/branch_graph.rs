//! Branch-Graph Engine (§4.C).
//!
//! Consumes the cached branch-graph file produced by the stacked-diff tool at
//! `<vcs_common_dir>/.graphite_cache_persist` (name is historical; treated as
//! an opaque path).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::WsError;
use crate::model::{BranchGraph, BranchNode};

#[derive(Debug, Deserialize)]
struct CacheFile {
    branches: Vec<(String, CacheRecord)>,
}

#[derive(Debug, Deserialize)]
struct CacheRecord {
    #[serde(rename = "parentBranchName", default)]
    parent_branch_name: Option<String>,
    #[serde(default)]
    children: Vec<String>,
    #[serde(rename = "validationResult", default)]
    validation_result: Option<String>,
}

/// Name of the cache file under the VCS common directory.
pub const CACHE_FILE_NAME: &str = ".graphite_cache_persist";

/// Result of attempting to load the branch graph: a present graph, or a
/// soft "missing" for most consumers (§4.C `load`).
pub enum LoadResult {
    Present(BranchGraph),
    Missing,
}

/// `load(repo_root) -> BranchGraph | missing`.
///
/// A missing cache is a soft failure. A malformed cache is a **hard**
/// failure: the design deliberately refuses to silently proceed (§4.C, §9).
pub fn load(vcs_common_dir: &Path) -> Result<LoadResult, WsError> {
    let cache_path = vcs_common_dir.join(CACHE_FILE_NAME);
    let contents = match std::fs::read_to_string(&cache_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LoadResult::Missing),
        Err(e) => {
            return Err(WsError::external(
                format!("failed to read branch cache: {e}"),
                cache_path.display().to_string(),
            ));
        }
    };

    let parsed: CacheFile = serde_json::from_str(&contents).map_err(|e| {
        WsError::corruption(format!(
            "malformed branch cache at {}: {e}",
            cache_path.display()
        ))
    })?;

    let mut nodes = HashMap::with_capacity(parsed.branches.len());
    for (name, record) in parsed.branches {
        nodes.insert(
            name.clone(),
            BranchNode {
                name,
                parent: record.parent_branch_name,
                children: record.children,
                is_trunk_marker: record.validation_result.as_deref() == Some("TRUNK"),
            },
        );
    }

    Ok(LoadResult::Present(BranchGraph::new(nodes)))
}

/// Like [`load`], but a missing cache is a hard failure with guidance, for
/// commands that explicitly require the graph (e.g. `tree`, stack-sensitive
/// navigation).
pub fn require(vcs_common_dir: &Path) -> Result<BranchGraph, WsError> {
    match load(vcs_common_dir)? {
        LoadResult::Present(graph) => Ok(graph),
        LoadResult::Missing => Err(WsError::precondition_with_hint(
            "no stacked-diff branch cache found",
            "run the stacked-diff tool's sync command first, or enable it via `config set use_graphite true`",
        )),
    }
}

/// `is_trunk(graph, name) -> bool`: trunk iff the cache record carries the
/// explicit trunk marker OR it has no parent (§3).
pub fn is_trunk(graph: &BranchGraph, name: &str) -> bool {
    match graph.get(name) {
        Some(node) => node.is_trunk_marker || node.parent.is_none(),
        None => false,
    }
}

/// `ancestors_of(graph, name) -> [name]` from immediate parent up to trunk,
/// nearest-first.
pub fn ancestors_of(graph: &BranchGraph, name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = name.to_string();
    while !is_trunk(graph, &current) {
        match graph.get(&current).and_then(|n| n.parent.clone()) {
            Some(parent) => {
                out.push(parent.clone());
                current = parent;
            }
            None => break,
        }
    }
    out
}

/// `descendants_of(graph, name) -> [name]`, full subtree, depth-first,
/// first-child-first.
pub fn descendants_of(graph: &BranchGraph, name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<String> = graph
        .get(name)
        .map(|n| n.children.iter().rev().cloned().collect())
        .unwrap_or_default();
    // Preserve first-child-first depth-first order using an explicit stack
    // pushed in reverse so the first child pops first.
    while let Some(child) = stack.pop() {
        out.push(child.clone());
        if let Some(node) = graph.get(&child) {
            for grandchild in node.children.iter().rev() {
                stack.push(grandchild.clone());
            }
        }
    }
    out
}

/// Deterministically walks the first child at each level until a leaf.
fn first_child_chain(graph: &BranchGraph, name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = name.to_string();
    while let Some(first_child) = graph.get(&current).and_then(|n| n.children.first().cloned()) {
        out.push(first_child.clone());
        current = first_child;
    }
    out
}

/// `stack_of(graph, name) -> [name]`, equals
/// `reverse(ancestors_of(name)) ++ [name] ++ first-child-chain(name)` (§4.C).
pub fn stack_of(graph: &BranchGraph, name: &str) -> Vec<String> {
    let mut ancestors = ancestors_of(graph, name);
    ancestors.reverse();
    ancestors.push(name.to_string());
    ancestors.extend(first_child_chain(graph, name));
    ancestors
}
