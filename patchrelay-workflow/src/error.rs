//! Error types for patchrelay-workflow.

use std::path::PathBuf;

use thiserror::Error;

use patchrelay_core::types::{IssueNumber, PullRequestRef, RepoSlug, TreeRole};
use patchrelay_render::RenderError;
use patchrelay_tools::ToolError;

/// Every way a run can stop short of completion.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The conventions document does not exist.
    #[error("conventions file not found at {path}")]
    ConventionsMissing { path: PathBuf },

    /// Empty title, or the tracker refused the lookup.
    #[error("issue #{issue} not found in {repo} or insufficient permission")]
    IssueNotFound { repo: RepoSlug, issue: IssueNumber },

    /// The subrepository checkout is not where it should be.
    #[error("subrepository path {path} does not exist or is not a directory")]
    SubrepoMissing { path: PathBuf },

    /// Every candidate branch name is already taken.
    #[error("no free branch name for '{base}' after {attempts} attempts")]
    BranchNamesExhausted { base: String, attempts: u32 },

    /// A version-control step failed.
    #[error("git {step} failed in {tree}: {source}")]
    Vcs {
        tree: TreeRole,
        step: &'static str,
        #[source]
        source: ToolError,
    },

    /// The agent could not be started.
    #[error("could not start {agent}: {source}")]
    AgentSpawn {
        agent: String,
        #[source]
        source: ToolError,
    },

    /// The agent exited unsuccessfully.
    #[error("{agent} exited with {}", describe_exit(.code))]
    AgentFailed { agent: String, code: Option<i32> },

    /// Creating a pull request failed.
    #[error("failed to create pull request in {repo}: {source}")]
    PullRequest {
        repo: RepoSlug,
        #[source]
        source: ToolError,
    },

    /// The subrepository pull request exists but the superproject side did
    /// not complete. Nothing is rolled back.
    #[error(
        "superproject update failed after {} was opened; finish it manually: {source}",
        .subrepo_pr.url
    )]
    SuperprojectIncomplete {
        subrepo_pr: PullRequestRef,
        #[source]
        source: Box<WorkflowError>,
    },

    /// Template rendering failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Scratch or change-application I/O failure, with path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Run record JSON error.
    #[error("run record JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkflowError {
    /// The orphaned subrepository pull request, when the run failed after it
    /// was created.
    pub fn orphaned_pull_request(&self) -> Option<&PullRequestRef> {
        match self {
            WorkflowError::SuperprojectIncomplete { subrepo_pr, .. } => Some(subrepo_pr),
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Convenience constructor for [`WorkflowError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WorkflowError {
    WorkflowError::Io {
        path: path.into(),
        source,
    }
}

/// Attach tree and step context to a failed VCS call.
pub(crate) fn vcs_err(tree: TreeRole, step: &'static str) -> impl FnOnce(ToolError) -> WorkflowError {
    move |source| WorkflowError::Vcs { tree, step, source }
}
