//! GitHub CLI (`gh`) adapter for [`IssueTracker`] and [`PullRequestClient`].

use std::path::Path;

use patchrelay_core::types::{IssueNumber, PullRequestRef, RepoSlug, WorkTree};

use crate::command::{self, owned};
use crate::error::ToolError;
use crate::ports::{IssueTracker, NewPullRequest, PullRequestClient};

/// Runs the `gh` binary.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl GhCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn issue_field(&self, repo: &RepoSlug, issue: IssueNumber, field: &str) -> Result<String, ToolError> {
        let args = issue_view_args(repo, issue, field);
        let stdout = command::run(&self.program, &std::env::temp_dir(), &args)?.into_result()?;
        parse_issue_field(&self.program, &stdout, field)
    }
}

/// `gh issue view <N> --repo <owner/name> --json <field>`
pub fn issue_view_args(repo: &RepoSlug, issue: IssueNumber, field: &str) -> Vec<String> {
    owned(&[
        "issue",
        "view",
        &issue.to_string(),
        "--repo",
        &repo.to_string(),
        "--json",
        field,
    ])
}

/// Extract one string field from `gh … --json <field>` output. A `null`
/// field reads as empty.
pub fn parse_issue_field(program: &str, stdout: &str, field: &str) -> Result<String, ToolError> {
    let value: serde_json::Value =
        serde_json::from_str(stdout.trim()).map_err(|e| ToolError::Output {
            program: program.to_string(),
            message: format!("invalid JSON for field '{field}': {e}"),
        })?;
    match value.get(field) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Null) | None => Ok(String::new()),
        Some(other) => Err(ToolError::Output {
            program: program.to_string(),
            message: format!("field '{field}' is not a string: {other}"),
        }),
    }
}

/// `gh pr create …` arguments, with `--reviewer` only when one is set.
pub fn pr_create_args(request: &NewPullRequest) -> Vec<String> {
    let mut args = owned(&[
        "pr",
        "create",
        "--repo",
        &request.repo.to_string(),
        "--base",
        &request.base,
        "--head",
        request.head.as_str(),
        "--title",
        &request.title,
        "--body",
        &request.body,
    ]);
    if let Some(reviewer) = &request.reviewer {
        args.push("--reviewer".to_string());
        args.push(reviewer.0.clone());
    }
    args
}

/// `gh pr create` prints the new pull request URL as its last line.
pub fn parse_pr_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with("https://") || line.starts_with("http://"))
        .map(str::to_string)
}

impl IssueTracker for GhCli {
    fn issue_title(&self, repo: &RepoSlug, issue: IssueNumber) -> Result<String, ToolError> {
        self.issue_field(repo, issue, "title")
    }

    fn issue_body(&self, repo: &RepoSlug, issue: IssueNumber) -> Result<String, ToolError> {
        self.issue_field(repo, issue, "body")
    }
}

impl PullRequestClient for GhCli {
    fn create_pull_request(
        &self,
        tree: &WorkTree,
        request: &NewPullRequest,
    ) -> Result<PullRequestRef, ToolError> {
        tracing::info!(repo = %request.repo, head = %request.head, "creating pull request");
        let stdout = command::run(&self.program, Path::new(&tree.root), &pr_create_args(request))?
            .into_result()?;
        let url = parse_pr_url(&stdout).ok_or_else(|| ToolError::Output {
            program: self.program.clone(),
            message: format!("no pull request URL in output: {}", stdout.trim()),
        })?;
        Ok(PullRequestRef {
            repo: request.repo.clone(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchrelay_core::types::{BranchName, Reviewer};
    use rstest::rstest;

    fn request(reviewer: Option<&str>) -> NewPullRequest {
        NewPullRequest {
            repo: RepoSlug::new("napistu", "napistu-py"),
            base: "main".to_string(),
            head: BranchName("fix-issue-42".to_string()),
            title: "Fix #42: thing".to_string(),
            body: "body".to_string(),
            reviewer: reviewer.map(|r| Reviewer(r.to_string())),
        }
    }

    #[test]
    fn issue_args_target_repo_and_field() {
        let args = issue_view_args(&RepoSlug::new("napistu", "napistu-py"), IssueNumber(42), "title");
        assert_eq!(
            args,
            ["issue", "view", "42", "--repo", "napistu/napistu-py", "--json", "title"]
        );
    }

    #[test]
    fn parses_title_field() {
        let title = parse_issue_field("gh", r#"{"title":"Fix it"}"#, "title").unwrap();
        assert_eq!(title, "Fix it");
    }

    #[rstest]
    #[case::null(r#"{"body":null}"#, "")]
    #[case::absent("{}", "")]
    #[case::text(r#"{"body":"Steps to reproduce"}"#, "Steps to reproduce")]
    fn body_field_values(#[case] stdout: &str, #[case] expected: &str) {
        assert_eq!(parse_issue_field("gh", stdout, "body").unwrap(), expected);
    }

    #[test]
    fn garbage_is_output_error() {
        let err = parse_issue_field("gh", "not json", "title").unwrap_err();
        assert!(matches!(err, ToolError::Output { .. }));
    }

    #[test]
    fn reviewer_flag_only_when_set() {
        let with = pr_create_args(&request(Some("alice")));
        assert!(with.windows(2).any(|w| w == ["--reviewer", "alice"]));

        let without = pr_create_args(&request(None));
        assert!(!without.iter().any(|a| a == "--reviewer"));
    }

    #[test]
    fn pr_url_is_last_url_line() {
        let out = "Creating pull request for fix-issue-42 into main\n\nhttps://github.com/napistu/napistu-py/pull/77\n";
        assert_eq!(
            parse_pr_url(out).as_deref(),
            Some("https://github.com/napistu/napistu-py/pull/77")
        );
        assert_eq!(parse_pr_url("Warning: 2 uncommitted changes\n"), None);
    }
}
