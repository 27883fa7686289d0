//! patchrelay core library — domain types, invocation parameters, config.
//!
//! Public API surface:
//! - [`types`] — newtypes, invocation parameters, derived identifiers
//! - [`error`] — [`ParamError`] and [`ConfigError`]
//! - [`config`] — load / save / init of `~/.patchrelay/config.yaml`

pub mod config;
pub mod error;
pub mod types;

pub use config::{AgentSettings, Config};
pub use error::{ConfigError, ParamError};
pub use types::{
    BranchName, DerivedIds, InvocationParams, IssueNumber, IssueSnapshot, PullRequestRef,
    RawParams, RepoSlug, Reviewer, TreeRole, WorkTree,
};
