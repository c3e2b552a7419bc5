//! Scenarios 2-4 (spec §8): stack-aware navigation and `list --stacks`
//! trunk filtering, grounded in the branch-graph engine (§4.C) and the
//! navigation engine (§4.E).

use crate::common::TestRepo;

const GRAPH_MAIN_A_B: &str = r#"{"branches":[
  ["main",{"parentBranchName":null,"children":["a"],"validationResult":"TRUNK"}],
  ["a",{"parentBranchName":"main","children":["b"]}],
  ["b",{"parentBranchName":"a","children":[]}]
]}"#;

fn enable_stacks(repo: &TestRepo) {
    let out = repo
        .ws_command()
        .args(["config", "set", "use_graphite", "true"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn list_stacks_excludes_worktreeless_branch_from_root_section() {
    let mut repo = TestRepo::new();
    enable_stacks(&repo);
    repo.write_branch_graph(GRAPH_MAIN_A_B);
    // main is already checked out at the root; create a worktree for b only.
    repo.add_worktree("b", "b");
    // `b`'s branch graph parent is `a`, which has no worktree.

    let out = repo.ws_command().args(["list", "--stacks"]).output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);

    let root_section = stdout.split("b:").next().unwrap();
    assert!(
        !root_section.contains(" a\n") && !root_section.contains(" a "),
        "root section must not show branch 'a':\n{stdout}"
    );

    let b_section = stdout.split("b:").nth(1).unwrap();
    assert!(
        b_section.contains(" a\n") || b_section.contains(" a "),
        "b's section must show worktree-less ancestor 'a':\n{stdout}"
    );
}

#[test]
fn up_reports_missing_child_worktree_with_hint() {
    let mut repo = TestRepo::new();
    enable_stacks(&repo);
    repo.write_branch_graph(GRAPH_MAIN_A_B);
    let parent_wt = repo.add_worktree("parent", "a");

    let out = repo
        .ws_command()
        .current_dir(&parent_wt)
        .args(["up"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("'b'"), "expected hint naming 'b':\n{stderr}");
    assert!(stderr.to_lowercase().contains("create"));
}

#[test]
fn jump_to_branch_directly_checked_out_does_not_recheckout() {
    let mut repo = TestRepo::new();
    enable_stacks(&repo);
    repo.write_branch_graph(GRAPH_MAIN_A_B);
    repo.add_worktree("a-wt", "a");
    let b_wt = repo.add_worktree("b-wt", "b");

    let out = repo.ws_command().args(["jump", "b"]).output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.trim().ends_with(b_wt.file_name().unwrap().to_str().unwrap()));
}

#[test]
fn navigation_requires_stacked_diff_enabled() {
    let repo = TestRepo::new();
    let out = repo.ws_command().args(["up"]).output().unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("use_graphite") || stderr.to_lowercase().contains("stacked-diff"));
}
