//! `GhCli` and `AgentCli` against stub shell scripts.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use patchrelay_core::config::AgentSettings;
use patchrelay_core::types::{BranchName, IssueNumber, RepoSlug, Reviewer, WorkTree};
use patchrelay_tools::{
    AgentCli, AgentRequest, ChangeProposalAgent, GhCli, IssueTracker, NewPullRequest,
    PullRequestClient, ToolError,
};
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fake_gh(dir: &Path) -> PathBuf {
    let log = dir.join("gh.log");
    write_script(
        dir,
        "gh",
        &format!(
            r#"printf '%s\n' "$*" >> '{log}'
case "$1 $2" in
  "issue view")
    case "$7" in
      title) echo '{{"title":"Fix off-by-one in distance export"}}' ;;
      body) echo '{{"body":""}}' ;;
    esac ;;
  "pr create")
    echo "Creating pull request"
    echo "https://github.com/napistu/napistu-py/pull/77" ;;
  *) exit 1 ;;
esac"#,
            log = log.display()
        ),
    )
}

#[test]
fn gh_issue_title_and_body_are_separate_queries() {
    let dir = TempDir::new().unwrap();
    let gh = GhCli::new(fake_gh(dir.path()).to_string_lossy());
    let repo = RepoSlug::new("napistu", "napistu-py");

    assert_eq!(
        gh.issue_title(&repo, IssueNumber(42)).unwrap(),
        "Fix off-by-one in distance export"
    );
    assert_eq!(gh.issue_body(&repo, IssueNumber(42)).unwrap(), "");

    let log = fs::read_to_string(dir.path().join("gh.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains("issue view 42 --repo napistu/napistu-py --json title"));
}

#[test]
fn gh_pr_create_returns_url_and_passes_reviewer() {
    let dir = TempDir::new().unwrap();
    let gh = GhCli::new(fake_gh(dir.path()).to_string_lossy());
    let tree = WorkTree::subrepo(dir.path());
    let request = NewPullRequest {
        repo: RepoSlug::new("napistu", "napistu-py"),
        base: "main".to_string(),
        head: BranchName("fix-issue-42".to_string()),
        title: "Fix #42".to_string(),
        body: "body".to_string(),
        reviewer: Some(Reviewer("alice".to_string())),
    };

    let pr = gh.create_pull_request(&tree, &request).unwrap();
    assert_eq!(pr.url, "https://github.com/napistu/napistu-py/pull/77");
    assert_eq!(pr.repo, request.repo);

    let log = fs::read_to_string(dir.path().join("gh.log")).unwrap();
    assert!(log.contains("--reviewer alice"));
}

#[test]
fn gh_pr_create_without_url_is_output_error() {
    let dir = TempDir::new().unwrap();
    let gh_path = write_script(dir.path(), "gh", "echo 'nothing useful'");
    let gh = GhCli::new(gh_path.to_string_lossy());
    let request = NewPullRequest {
        repo: RepoSlug::new("napistu", "napistu"),
        base: "main".to_string(),
        head: BranchName("fix-issue-1".to_string()),
        title: "t".to_string(),
        body: "b".to_string(),
        reviewer: None,
    };
    let err = gh
        .create_pull_request(&WorkTree::superproject(dir.path()), &request)
        .unwrap_err();
    assert!(matches!(err, ToolError::Output { .. }), "got: {err}");
}

#[test]
fn gh_failure_surfaces_stderr() {
    let dir = TempDir::new().unwrap();
    let gh_path = write_script(
        dir.path(),
        "gh",
        "echo 'GraphQL: Could not resolve to an issue' >&2; exit 1",
    );
    let gh = GhCli::new(gh_path.to_string_lossy());
    let err = gh
        .issue_title(&RepoSlug::new("napistu", "napistu-py"), IssueNumber(9999))
        .unwrap_err();
    assert!(err.to_string().contains("Could not resolve"));
}

fn agent_request(tree: &Path, scratch: &Path) -> AgentRequest {
    AgentRequest {
        tree: WorkTree::subrepo(tree),
        repo: RepoSlug::new("napistu", "napistu-py"),
        issue: IssueNumber(42),
        conventions: scratch.join("conventions.md"),
        output_dir: scratch.join("output"),
        prompt: "Fix issue #42".to_string(),
    }
}

#[test]
fn agent_writes_into_output_dir_and_reports_success() {
    let bin = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    fs::create_dir_all(scratch.path().join("output")).unwrap();

    // --output-dir is the 8th argument.
    let program = write_script(bin.path(), "agent", r#"echo changed > "$8/fix.py""#);
    let agent = AgentCli::new(AgentSettings {
        program: program.to_string_lossy().into_owned(),
        ..AgentSettings::default()
    });

    let exit = agent
        .propose(&agent_request(tree.path(), scratch.path()))
        .unwrap();
    assert!(exit.success());
    assert!(scratch.path().join("output").join("fix.py").exists());
}

#[test]
fn agent_nonzero_exit_is_reported_not_raised() {
    let bin = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let program = write_script(bin.path(), "agent", "exit 3");
    let agent = AgentCli::new(AgentSettings {
        program: program.to_string_lossy().into_owned(),
        ..AgentSettings::default()
    });

    let exit = agent
        .propose(&agent_request(tree.path(), scratch.path()))
        .unwrap();
    assert_eq!(exit.code, Some(3));
    assert!(!exit.success());
}
