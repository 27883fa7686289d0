//! # patchrelay-workflow
//!
//! The issue-to-pull-request pipeline and its persisted run records.
//!
//! Build a [`Workflow`] from [`Ports`] (the git, issue tracker, pull request,
//! and agent collaborators), a [`patchrelay_render::Renderer`], and
//! [`Settings`], then call [`Workflow::run`] for one issue or
//! [`Workflow::plan`] for a dry run.

pub mod apply;
pub mod branch;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod scratch;

pub use apply::{apply_change_set, AppliedFile};
pub use branch::{resolve_branch, MAX_BRANCH_SUFFIX};
pub use error::WorkflowError;
pub use pipeline::{Plan, Ports, RunOutcome, RunState, Settings, Workflow};
pub use record::{RunRecord, RunStatus};
pub use scratch::ScratchSpace;
