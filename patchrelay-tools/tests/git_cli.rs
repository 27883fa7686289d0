//! `GitCli` against real repositories in temp directories.
//!
//! Tests return early when no `git` binary is on PATH.

use std::fs;
use std::path::Path;
use std::process::Command;

use patchrelay_core::types::{BranchName, WorkTree};
use patchrelay_tools::{GitCli, ToolError, VcsClient};
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run git");
    assert!(
        out.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    git(dir.path(), &["init", "--initial-branch=main"]);
    git(dir.path(), &["config", "user.email", "test@example.test"]);
    git(dir.path(), &["config", "user.name", "Test"]);
    git(dir.path(), &["config", "commit.gpgsign", "false"]);
    fs::write(dir.path().join("README.md"), "# Test\n").unwrap();
    git(dir.path(), &["add", "-A"]);
    git(dir.path(), &["commit", "-m", "initial"]);
    dir
}

fn head_subject(dir: &Path) -> String {
    let out = Command::new("git")
        .args(["log", "-1", "--format=%s"])
        .current_dir(dir)
        .output()
        .expect("git log");
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

#[test]
fn create_branch_and_detect_it() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let tree = WorkTree::superproject(repo.path());
    let vcs = GitCli::default();
    let branch = BranchName("fix-issue-42".to_string());

    assert!(!vcs.local_branch_exists(&tree, &branch).unwrap());
    vcs.create_branch(&tree, &branch).unwrap();
    assert!(vcs.local_branch_exists(&tree, &branch).unwrap());

    let err = vcs.create_branch(&tree, &branch).unwrap_err();
    assert!(matches!(err, ToolError::Failed { .. }), "got: {err}");
}

#[test]
fn status_reflects_changes_and_commit_clears_it() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let tree = WorkTree::subrepo(repo.path());
    let vcs = GitCli::default();

    assert!(vcs.is_clean(&tree).unwrap());
    fs::write(repo.path().join("README.md"), "# Changed\n").unwrap();
    fs::write(repo.path().join("new.txt"), "new\n").unwrap();
    assert!(!vcs.is_clean(&tree).unwrap());

    vcs.stage_all(&tree).unwrap();
    vcs.commit(&tree, "Fix #42: Fix off-by-one").unwrap();
    assert!(vcs.is_clean(&tree).unwrap());
    assert_eq!(head_subject(repo.path()), "Fix #42: Fix off-by-one");
}

#[test]
fn stage_path_only_stages_that_path() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let tree = WorkTree::superproject(repo.path());
    let vcs = GitCli::default();

    fs::create_dir_all(repo.path().join("lib")).unwrap();
    fs::write(repo.path().join("lib").join("pinned.txt"), "a\n").unwrap();
    fs::write(repo.path().join("other.txt"), "b\n").unwrap();

    vcs.stage_path(&tree, Path::new("lib")).unwrap();
    vcs.commit(&tree, "Update lib").unwrap();
    assert!(!vcs.is_clean(&tree).unwrap(), "other.txt must remain untracked");
}

#[test]
fn checkout_unknown_branch_fails() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let tree = WorkTree::superproject(repo.path());
    let err = GitCli::default().checkout(&tree, "no-such-branch").unwrap_err();
    assert!(err.to_string().contains("checkout no-such-branch"));
}

#[test]
fn push_fetch_and_remote_branch_lookup_against_bare_remote() {
    if !git_available() {
        return;
    }
    let remote = TempDir::new().unwrap();
    git(remote.path(), &["init", "--bare", "--initial-branch=main"]);

    let repo = init_repo();
    let remote_url = remote.path().to_string_lossy().to_string();
    git(repo.path(), &["remote", "add", "origin", &remote_url]);
    git(repo.path(), &["push", "origin", "main"]);

    let tree = WorkTree::superproject(repo.path());
    let vcs = GitCli::default();
    let branch = BranchName("fix-issue-7".to_string());

    assert!(!vcs.remote_branch_exists(&tree, "origin", &branch).unwrap());
    vcs.create_branch(&tree, &branch).unwrap();
    vcs.push_upstream(&tree, "origin", &branch).unwrap();
    assert!(vcs.remote_branch_exists(&tree, "origin", &branch).unwrap());

    vcs.checkout(&tree, "main").unwrap();
    vcs.fetch(&tree, "origin", "main").unwrap();
    vcs.pull_ff_only(&tree, "origin", "main").unwrap();
    vcs.update_submodules(&tree).unwrap();
}
