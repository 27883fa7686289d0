//! `git` CLI adapter for [`VcsClient`].

use std::path::Path;

use patchrelay_core::types::{BranchName, WorkTree};

use crate::command::{self, owned};
use crate::error::ToolError;
use crate::ports::VcsClient;

/// Runs the `git` binary with an explicit working directory per call.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn exec(&self, tree: &WorkTree, args: &[&str]) -> Result<command::CommandOutput, ToolError> {
        command::run(&self.program, &tree.root, &owned(args))
    }

    fn exec_ok(&self, tree: &WorkTree, args: &[&str]) -> Result<String, ToolError> {
        self.exec(tree, args)?.into_result()
    }
}

impl VcsClient for GitCli {
    fn fetch(&self, tree: &WorkTree, remote: &str, branch: &str) -> Result<(), ToolError> {
        tracing::info!(tree = %tree.role, remote, branch, "fetching");
        self.exec_ok(tree, &["fetch", remote, branch]).map(drop)
    }

    fn checkout(&self, tree: &WorkTree, branch: &str) -> Result<(), ToolError> {
        self.exec_ok(tree, &["checkout", branch]).map(drop)
    }

    fn pull_ff_only(&self, tree: &WorkTree, remote: &str, branch: &str) -> Result<(), ToolError> {
        self.exec_ok(tree, &["pull", "--ff-only", remote, branch])
            .map(drop)
    }

    fn update_submodules(&self, tree: &WorkTree) -> Result<(), ToolError> {
        self.exec_ok(tree, &["submodule", "update", "--init", "--recursive"])
            .map(drop)
    }

    fn create_branch(&self, tree: &WorkTree, branch: &BranchName) -> Result<(), ToolError> {
        tracing::info!(tree = %tree.role, branch = %branch, "creating branch");
        self.exec_ok(tree, &["checkout", "-b", branch.as_str()])
            .map(drop)
    }

    fn local_branch_exists(&self, tree: &WorkTree, branch: &BranchName) -> Result<bool, ToolError> {
        let reference = format!("refs/heads/{branch}");
        let result = self.exec(tree, &["show-ref", "--verify", "--quiet", &reference])?;
        Ok(result.success)
    }

    fn remote_branch_exists(
        &self,
        tree: &WorkTree,
        remote: &str,
        branch: &BranchName,
    ) -> Result<bool, ToolError> {
        let stdout = self.exec_ok(tree, &["ls-remote", "--heads", remote, branch.as_str()])?;
        Ok(!stdout.trim().is_empty())
    }

    fn is_clean(&self, tree: &WorkTree) -> Result<bool, ToolError> {
        let stdout = self.exec_ok(tree, &["status", "--porcelain"])?;
        Ok(stdout.trim().is_empty())
    }

    fn stage_all(&self, tree: &WorkTree) -> Result<(), ToolError> {
        self.exec_ok(tree, &["add", "-A"]).map(drop)
    }

    fn stage_path(&self, tree: &WorkTree, path: &Path) -> Result<(), ToolError> {
        let path = path.to_string_lossy();
        self.exec_ok(tree, &["add", "--", &path]).map(drop)
    }

    fn commit(&self, tree: &WorkTree, message: &str) -> Result<(), ToolError> {
        self.exec_ok(tree, &["commit", "-m", message]).map(drop)
    }

    fn push_upstream(
        &self,
        tree: &WorkTree,
        remote: &str,
        branch: &BranchName,
    ) -> Result<(), ToolError> {
        tracing::info!(tree = %tree.role, remote, branch = %branch, "pushing");
        self.exec_ok(tree, &["push", "--set-upstream", remote, branch.as_str()])
            .map(drop)
    }
}
