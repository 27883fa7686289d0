//! # patchrelay-tools
//!
//! Ports and adapters for the external collaborators of a patchrelay run.
//!
//! - [`ports`] — [`VcsClient`], [`IssueTracker`], [`PullRequestClient`],
//!   [`ChangeProposalAgent`]
//! - [`git`], [`gh`], [`agent`] — command-line implementations
//! - [`command`] — shared process runner

pub mod agent;
pub mod command;
pub mod error;
pub mod gh;
pub mod git;
pub mod ports;

pub use agent::AgentCli;
pub use error::ToolError;
pub use gh::GhCli;
pub use git::GitCli;
pub use ports::{
    AgentExit, AgentRequest, ChangeProposalAgent, IssueTracker, NewPullRequest,
    PullRequestClient, VcsClient,
};
