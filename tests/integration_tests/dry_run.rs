//! Scenario 7 (spec §8): `--dry-run rm` removes nothing.

use crate::common::TestRepo;

#[test]
fn dry_run_rm_does_not_touch_the_filesystem() {
    let mut repo = TestRepo::new();
    let worktree_path = repo.add_worktree("foo", "foo");
    std::fs::write(worktree_path.join("hello.txt"), "hi").unwrap();

    let output = repo
        .ws_command()
        .args(["--dry-run", "rm", "foo", "-f"])
        .output()
        .expect("failed to run ws rm");
    assert!(
        output.status.success(),
        "dry-run rm failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN") || stdout.to_lowercase().contains("would"));

    assert!(worktree_path.join("hello.txt").exists());
    assert!(worktree_path.exists());
}

#[test]
fn dry_run_create_does_not_create_a_worktree() {
    let repo = TestRepo::new();
    let output = repo
        .ws_command()
        .args(["--dry-run", "create", "feature-x"])
        .output()
        .expect("failed to run ws create");
    assert!(output.status.success());

    let worktree_path = repo.workstacks_root().join("repo").join("feature-x");
    assert!(!worktree_path.exists());
}
