//! Scenarios 5-6 (spec §8): the rebase orchestrator's scratch-worktree
//! workflow, grounded in §4.G's `(none) -> created/conflicted -> resolved ->
//! applied` state machine (`src/rebase.rs`).

use crate::common::TestRepo;

#[test]
fn rebase_preview_then_apply_fast_forwards_the_live_branch() {
    let mut repo = TestRepo::new();
    let feature_wt = repo.add_worktree("feature", "feature");
    repo.commit_in(&feature_wt, "feature.txt", "feature content\n", "feature commit");
    repo.commit_in(repo.root_path(), "main.txt", "main content\n", "main commit");
    // `git branch -f` refuses to move a branch checked out elsewhere; this
    // scenario applies the rebase result back onto `feature` itself, so the
    // branch must be free of any worktree checkout first.
    repo.remove_worktree("feature");

    let preview = repo
        .ws_command()
        .args(["rebase", "preview", "feature"])
        .output()
        .expect("failed to run rebase preview");
    assert!(preview.status.success(), "{}", String::from_utf8_lossy(&preview.stderr));
    let stdout = String::from_utf8_lossy(&preview.stdout);
    assert!(stdout.contains("1 commits to rebase"), "unexpected preview output:\n{stdout}");

    let apply = repo
        .ws_command()
        .args(["rebase", "apply", "feature", "--force"])
        .output()
        .expect("failed to run rebase apply");
    assert!(apply.status.success(), "{}", String::from_utf8_lossy(&apply.stderr));
    assert!(String::from_utf8_lossy(&apply.stdout).contains("applied"));

    // `feature` now carries both files: its own commit, replayed onto main's
    // advanced tip.
    let files = repo.git_output(&["ls-tree", "-r", "--name-only", "feature"]);
    assert!(files.contains("feature.txt"));
    assert!(files.contains("main.txt"));

    // the default-preserve_stacks=false cleanup removed the scratch worktree
    // and its branch.
    let worktree_list = repo.git_output(&["worktree", "list"]);
    assert!(!worktree_list.contains(".rebase-stack"));
}

#[test]
fn rebase_preview_reports_conflicts_and_resolve_ours_keeps_target_content() {
    let mut repo = TestRepo::new();
    repo.commit_in(repo.root_path(), "README.md", "original\n", "add readme");
    let feature_wt = repo.add_worktree("feature", "feature");
    repo.commit_in(&feature_wt, "README.md", "feature change\n", "feature edits readme");
    repo.commit_in(repo.root_path(), "README.md", "main change\n", "main edits readme");
    repo.remove_worktree("feature");

    let preview = repo
        .ws_command()
        .args(["rebase", "preview", "feature"])
        .output()
        .expect("failed to run rebase preview");
    assert!(preview.status.success(), "{}", String::from_utf8_lossy(&preview.stderr));

    let status = repo
        .ws_command()
        .args(["rebase", "status"])
        .output()
        .expect("failed to run rebase status");
    assert!(status.status.success());
    let status_stdout = String::from_utf8_lossy(&status.stdout);
    assert!(
        status_stdout.contains("feature") && status_stdout.contains("Conflicted"),
        "expected feature to be reported conflicted:\n{status_stdout}"
    );

    let resolve = repo
        .ws_command()
        .args(["rebase", "resolve", "feature", "--strategy", "ours"])
        .output()
        .expect("failed to run rebase resolve");
    assert!(resolve.status.success(), "{}", String::from_utf8_lossy(&resolve.stderr));
    assert!(String::from_utf8_lossy(&resolve.stdout).contains("resolved"));

    // During a rebase, `ours` is the commit already on the target branch
    // (`main`'s edit), and `theirs` is the commit being replayed from
    // `feature`; `--strategy ours` must keep main's content.
    let readme = std::fs::read_to_string(
        repo.root_path().join(".rebase-stack").join("feature").join("README.md"),
    )
    .expect("failed to read resolved README.md");
    assert_eq!(readme, "main change\n");
    assert!(!readme.contains("<<<<<<<"));
    assert!(!readme.contains("======="));
    assert!(!readme.contains(">>>>>>>"));

    let status_after = repo
        .ws_command()
        .args(["rebase", "status"])
        .output()
        .expect("failed to run rebase status");
    let status_after_stdout = String::from_utf8_lossy(&status_after.stdout);
    assert!(
        status_after_stdout.contains("Resolved"),
        "expected feature to be reported resolved:\n{status_after_stdout}"
    );
}
