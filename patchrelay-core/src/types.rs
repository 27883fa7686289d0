//! Domain types for a single patchrelay invocation.
//!
//! Everything here is process-scoped. Derived identifiers are pure functions
//! of [`InvocationParams`] and are recomputed rather than mutated.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ParamError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A fully-qualified repository identifier, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// A sibling repository under the same owner.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(self.owner.clone(), name)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSlug {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParamError::MalformedRepo {
            value: s.to_string(),
        };
        let (owner, name) = s.trim().split_once('/').ok_or_else(malformed)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(malformed());
        }
        Ok(Self::new(owner, name))
    }
}

/// An issue number in the subrepository's tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueNumber(pub u64);

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A work branch name shared by the superproject and the subrepository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchName(pub String);

impl BranchName {
    /// `fix-issue-<N>`.
    pub fn for_issue(issue: IssueNumber) -> Self {
        Self(format!("fix-issue-{issue}"))
    }

    /// `fix-issue-<N>-<suffix>`, used when the base name is already taken.
    pub fn with_suffix(&self, suffix: u32) -> Self {
        Self(format!("{}-{suffix}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A pull-request reviewer handle, stored without a leading `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reviewer(pub String);

impl Reviewer {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let handle = raw.trim().trim_start_matches('@');
        (!handle.is_empty()).then(|| Self(handle.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reviewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Invocation parameters
// ---------------------------------------------------------------------------

/// Options as they arrive from the command line, before defaults apply.
#[derive(Debug, Clone, Default)]
pub struct RawParams {
    pub main_repo: Option<String>,
    pub submodule: Option<String>,
    pub issue: Option<u64>,
    pub base: Option<String>,
    pub conventions: Option<PathBuf>,
    pub reviewer: Option<String>,
}

/// Validated parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationParams {
    pub superproject: RepoSlug,
    pub subrepo: String,
    pub issue: IssueNumber,
    pub base: String,
    pub conventions: PathBuf,
    pub reviewer: Option<Reviewer>,
}

impl InvocationParams {
    /// Apply config defaults to `raw` and validate the result.
    ///
    /// Command-line values win over config values, which win over built-in
    /// defaults. Performs no I/O.
    pub fn resolve(raw: RawParams, config: &Config) -> Result<Self, ParamError> {
        let subrepo = non_blank(raw.submodule).ok_or(ParamError::Missing {
            option: "submodule",
        })?;
        if !is_plain_name(&subrepo) {
            return Err(ParamError::InvalidSubmodule { value: subrepo });
        }
        let issue = raw.issue.ok_or(ParamError::Missing { option: "issue" })?;
        if issue == 0 {
            return Err(ParamError::InvalidIssue { value: issue });
        }

        let main_repo = non_blank(raw.main_repo).unwrap_or_else(|| config.main_repo.clone());
        let superproject: RepoSlug = main_repo.parse()?;

        let base = non_blank(raw.base)
            .or_else(|| non_blank(Some(config.base.clone())))
            .ok_or(ParamError::Missing { option: "base" })?;

        let conventions = raw
            .conventions
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| config.conventions.clone());

        let reviewer = raw
            .reviewer
            .as_deref()
            .and_then(Reviewer::parse)
            .or_else(|| config.default_reviewer.as_deref().and_then(Reviewer::parse));

        Ok(Self {
            superproject,
            subrepo,
            issue: IssueNumber(issue),
            base,
            conventions,
            reviewer,
        })
    }

    /// `<owner>/<subrepo>`: the subrepository shares the superproject's owner.
    pub fn subrepo_slug(&self) -> RepoSlug {
        self.superproject.sibling(self.subrepo.clone())
    }

    /// Work branch name before any collision suffix.
    pub fn branch(&self) -> BranchName {
        BranchName::for_issue(self.issue)
    }

    /// Compute the derived identifiers for a superproject checkout at `root`.
    pub fn derive(&self, root: &Path, lib_dir: &Path) -> DerivedIds {
        let subrepo_rel = lib_dir.join(&self.subrepo);
        DerivedIds {
            subrepo_path: root.join(&subrepo_rel),
            subrepo_rel,
            subrepo_slug: self.subrepo_slug(),
            branch: self.branch(),
        }
    }
}

/// One path component: no separators, not `.` or `..`.
fn is_plain_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && name != "." && name != ".."
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Identifiers computed from [`InvocationParams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedIds {
    /// Absolute path of the subrepository checkout.
    pub subrepo_path: PathBuf,
    /// Subrepository path relative to the superproject root.
    pub subrepo_rel: PathBuf,
    pub subrepo_slug: RepoSlug,
    pub branch: BranchName,
}

// ---------------------------------------------------------------------------
// Working trees
// ---------------------------------------------------------------------------

/// Which of the two checkouts a [`WorkTree`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeRole {
    Superproject,
    Subrepo,
}

impl fmt::Display for TreeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeRole::Superproject => write!(f, "superproject"),
            TreeRole::Subrepo => write!(f, "subrepo"),
        }
    }
}

/// An explicit handle on a checkout. Every VCS call takes one of these
/// instead of relying on the process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkTree {
    pub root: PathBuf,
    pub role: TreeRole,
}

impl WorkTree {
    pub fn superproject(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            role: TreeRole::Superproject,
        }
    }

    pub fn subrepo(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            role: TreeRole::Subrepo,
        }
    }
}

// ---------------------------------------------------------------------------
// Issue and pull request snapshots
// ---------------------------------------------------------------------------

/// Issue title and body, fetched once and reused verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    pub number: IssueNumber,
    pub title: String,
    pub body: String,
}

/// A created pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub repo: RepoSlug,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
