//! Work-branch naming with collision handling.
//!
//! The base name is `fix-issue-<N>`. If it already exists locally or on the
//! remote in any of the given trees, `-2`, `-3`, … are tried in order and the
//! first name free in every tree wins, so both repositories always share the
//! same branch name.

use patchrelay_core::types::{BranchName, WorkTree};
use patchrelay_tools::VcsClient;

use crate::error::{vcs_err, WorkflowError};

/// Highest suffix tried before giving up.
pub const MAX_BRANCH_SUFFIX: u32 = 50;

/// Candidate names in the order they are tried.
pub fn candidates(base: &BranchName) -> impl Iterator<Item = BranchName> + '_ {
    std::iter::once(base.clone()).chain((2..=MAX_BRANCH_SUFFIX).map(move |n| base.with_suffix(n)))
}

/// Pick the first candidate that is free in every tree.
pub fn resolve_branch(
    vcs: &dyn VcsClient,
    trees: &[&WorkTree],
    remote: &str,
    base: &BranchName,
) -> Result<BranchName, WorkflowError> {
    for candidate in candidates(base) {
        if !is_taken(vcs, trees, remote, &candidate)? {
            if candidate != *base {
                tracing::warn!(taken = %base, using = %candidate, "branch name collision");
            }
            return Ok(candidate);
        }
    }
    Err(WorkflowError::BranchNamesExhausted {
        base: base.0.clone(),
        attempts: MAX_BRANCH_SUFFIX,
    })
}

fn is_taken(
    vcs: &dyn VcsClient,
    trees: &[&WorkTree],
    remote: &str,
    candidate: &BranchName,
) -> Result<bool, WorkflowError> {
    for tree in trees {
        if vcs
            .local_branch_exists(tree, candidate)
            .map_err(vcs_err(tree.role, "show-ref"))?
        {
            return Ok(true);
        }
        if vcs
            .remote_branch_exists(tree, remote, candidate)
            .map_err(vcs_err(tree.role, "ls-remote"))?
        {
            return Ok(true);
        }
    }
    Ok(false)
}
