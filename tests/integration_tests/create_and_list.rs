//! Scenario 1 (spec §8): basic create/list, and the invariants around
//! `.env` rendering and reserved-name/conflict handling.

use crate::common::TestRepo;

#[test]
fn create_writes_env_file_and_lists_worktree() {
    let repo = TestRepo::new();

    let output = repo
        .ws_command()
        .args(["create", "feature-x"])
        .output()
        .expect("failed to run ws create");
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let worktree_path = repo.workstacks_root().join("repo").join("feature-x");
    assert!(worktree_path.join(".env").exists());
    let env_contents = std::fs::read_to_string(worktree_path.join(".env")).unwrap();
    assert!(env_contents.contains("WORKTREE_NAME=\"feature-x\""));
    assert!(env_contents.contains("WORKTREE_PATH="));
    assert!(env_contents.contains("REPO_ROOT="));

    let list_output = repo
        .ws_command()
        .args(["list"])
        .output()
        .expect("failed to run ws list");
    assert!(list_output.status.success());
    let stdout = String::from_utf8_lossy(&list_output.stdout);
    assert!(stdout.contains("feature-x"));
    assert!(stdout.contains("root"));
}

#[test]
fn create_rejects_reserved_worktree_name() {
    let repo = TestRepo::new();
    let output = repo
        .ws_command()
        .args(["create", "main"])
        .output()
        .expect("failed to run ws create");
    assert!(!output.status.success());
}

#[test]
fn create_fails_when_destination_already_exists() {
    let mut repo = TestRepo::new();
    repo.add_worktree("feature-x", "feature-x");

    let output = repo
        .ws_command()
        .args(["create", "feature-x"])
        .output()
        .expect("failed to run ws create");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.to_lowercase().contains("exist"));
}

#[test]
fn create_from_current_branch_on_default_branch_is_rejected() {
    let repo = TestRepo::new();
    let output = repo
        .ws_command()
        .args(["create", "feature-x", "--from-current-branch"])
        .output()
        .expect("failed to run ws create");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("default branch") || stderr.contains("--from-branch"));
}
