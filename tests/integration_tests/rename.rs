//! §8 "round-trip & idempotence": `rename A B` then `rename B A` is a no-op
//! on the visible worktree set.

use crate::common::TestRepo;

#[test]
fn rename_round_trip_restores_original_name() {
    let mut repo = TestRepo::new();
    repo.add_worktree("alpha", "alpha");

    let out = repo
        .ws_command()
        .args(["rename", "alpha", "beta"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(repo.workstacks_root().join("repo").join("beta").exists());
    assert!(!repo.workstacks_root().join("repo").join("alpha").exists());

    let out = repo
        .ws_command()
        .args(["rename", "beta", "alpha"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(repo.workstacks_root().join("repo").join("alpha").exists());
    assert!(!repo.workstacks_root().join("repo").join("beta").exists());
}

#[test]
fn rename_fails_when_target_already_exists() {
    let mut repo = TestRepo::new();
    repo.add_worktree("alpha", "alpha");
    repo.add_worktree("beta", "beta");

    let out = repo
        .ws_command()
        .args(["rename", "alpha", "beta"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn rename_regenerates_env_with_new_name() {
    let mut repo = TestRepo::new();
    repo.add_worktree("alpha", "alpha");

    let out = repo
        .ws_command()
        .args(["rename", "alpha", "gamma"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let env = std::fs::read_to_string(
        repo.workstacks_root().join("repo").join("gamma").join(".env"),
    )
    .unwrap();
    assert!(env.contains("WORKTREE_NAME=\"gamma\""));
}
