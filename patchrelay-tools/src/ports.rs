//! Capability interfaces for the external collaborators.
//!
//! The workflow only ever talks to these traits; the CLI adapters in
//! [`crate::git`], [`crate::gh`], and [`crate::agent`] are one implementation,
//! in-memory fakes in tests are another.

use std::path::{Path, PathBuf};

use patchrelay_core::types::{
    BranchName, IssueNumber, PullRequestRef, RepoSlug, Reviewer, WorkTree,
};

use crate::error::ToolError;

/// Version-control operations on an explicit working tree.
pub trait VcsClient {
    fn fetch(&self, tree: &WorkTree, remote: &str, branch: &str) -> Result<(), ToolError>;

    fn checkout(&self, tree: &WorkTree, branch: &str) -> Result<(), ToolError>;

    /// Fast-forward the current branch from `remote/branch`; never merges.
    fn pull_ff_only(&self, tree: &WorkTree, remote: &str, branch: &str) -> Result<(), ToolError>;

    /// Initialise and update all nested submodules to their pinned commits.
    fn update_submodules(&self, tree: &WorkTree) -> Result<(), ToolError>;

    /// Create `branch` from the current HEAD and check it out.
    fn create_branch(&self, tree: &WorkTree, branch: &BranchName) -> Result<(), ToolError>;

    fn local_branch_exists(&self, tree: &WorkTree, branch: &BranchName) -> Result<bool, ToolError>;

    fn remote_branch_exists(
        &self,
        tree: &WorkTree,
        remote: &str,
        branch: &BranchName,
    ) -> Result<bool, ToolError>;

    /// `true` when the working tree has no staged, unstaged, or untracked changes.
    fn is_clean(&self, tree: &WorkTree) -> Result<bool, ToolError>;

    fn stage_all(&self, tree: &WorkTree) -> Result<(), ToolError>;

    /// Stage a single path, relative to the tree root.
    fn stage_path(&self, tree: &WorkTree, path: &Path) -> Result<(), ToolError>;

    fn commit(&self, tree: &WorkTree, message: &str) -> Result<(), ToolError>;

    /// Push `branch` and set upstream tracking.
    fn push_upstream(
        &self,
        tree: &WorkTree,
        remote: &str,
        branch: &BranchName,
    ) -> Result<(), ToolError>;
}

/// Issue lookups. Title and body are separate queries.
pub trait IssueTracker {
    fn issue_title(&self, repo: &RepoSlug, issue: IssueNumber) -> Result<String, ToolError>;

    fn issue_body(&self, repo: &RepoSlug, issue: IssueNumber) -> Result<String, ToolError>;
}

/// Everything needed to open one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub repo: RepoSlug,
    pub base: String,
    pub head: BranchName,
    pub title: String,
    pub body: String,
    pub reviewer: Option<Reviewer>,
}

/// Pull-request creation.
pub trait PullRequestClient {
    /// Create the pull request and return its URL.
    fn create_pull_request(
        &self,
        tree: &WorkTree,
        request: &NewPullRequest,
    ) -> Result<PullRequestRef, ToolError>;
}

/// Inputs for one change-proposal agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    /// Subrepository checkout the agent runs in.
    pub tree: WorkTree,
    pub repo: RepoSlug,
    pub issue: IssueNumber,
    /// Private copy of the conventions document.
    pub conventions: PathBuf,
    /// Directory the agent writes its proposed files into.
    pub output_dir: PathBuf,
    pub prompt: String,
}

/// How the agent process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentExit {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl AgentExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A black-box code generator, judged only by exit status and output dir.
pub trait ChangeProposalAgent {
    /// Name used in user-facing messages and attribution.
    fn display_name(&self) -> &str;

    fn propose(&self, request: &AgentRequest) -> Result<AgentExit, ToolError>;
}
