//! The issue-to-pull-request pipeline.
//!
//! ```text
//! conventions check → issue lookup → superproject sync → branch selection
//!   → subrepo sync → agent → apply → [no-op exits] → subrepo commit/push/PR
//!   → superproject commit/push/PR
//! ```
//!
//! Each step returns `Result` and the first failure stops the run. Nothing is
//! retried and partial git state is never rolled back. Scratch files are
//! owned by a [`ScratchSpace`] guard and disappear on every exit path.

use std::path::{Path, PathBuf};

use patchrelay_core::types::{
    BranchName, DerivedIds, InvocationParams, IssueNumber, IssueSnapshot, PullRequestRef,
    RepoSlug, TreeRole, WorkTree,
};
use patchrelay_render::{MessageContext, MessageKind, Renderer, SubrepoMessages};
use patchrelay_tools::{
    AgentRequest, ChangeProposalAgent, IssueTracker, NewPullRequest, PullRequestClient,
    VcsClient,
};

use crate::apply::{apply_change_set, AppliedFile};
use crate::branch::resolve_branch;
use crate::error::{vcs_err, WorkflowError};
use crate::scratch::ScratchSpace;

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// The four external collaborators.
#[derive(Clone, Copy)]
pub struct Ports<'a> {
    pub vcs: &'a dyn VcsClient,
    pub issues: &'a dyn IssueTracker,
    pub pulls: &'a dyn PullRequestClient,
    pub agent: &'a dyn ChangeProposalAgent,
}

/// Where the superproject lives and how its remote is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Superproject checkout root.
    pub root: PathBuf,
    /// Directory under `root` holding subrepositories.
    pub lib_dir: PathBuf,
    pub remote: String,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a run ended successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The agent wrote nothing.
    NoChanges {
        issue: IssueSnapshot,
        branch: BranchName,
    },
    /// The agent wrote files but the subrepository status stayed clean.
    UnchangedTree {
        issue: IssueSnapshot,
        branch: BranchName,
        applied: Vec<AppliedFile>,
    },
    /// Both pull requests were opened.
    Completed {
        issue: IssueSnapshot,
        branch: BranchName,
        applied: Vec<AppliedFile>,
        subrepo_pr: PullRequestRef,
        superproject_pr: PullRequestRef,
    },
}

impl RunOutcome {
    pub fn issue(&self) -> &IssueSnapshot {
        match self {
            RunOutcome::NoChanges { issue, .. }
            | RunOutcome::UnchangedTree { issue, .. }
            | RunOutcome::Completed { issue, .. } => issue,
        }
    }

    pub fn branch(&self) -> &BranchName {
        match self {
            RunOutcome::NoChanges { branch, .. }
            | RunOutcome::UnchangedTree { branch, .. }
            | RunOutcome::Completed { branch, .. } => branch,
        }
    }
}

/// What a run had established when it stopped. Filled in step by step so a
/// caller can still report on a failed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub issue: Option<IssueSnapshot>,
    pub branch: Option<BranchName>,
    pub applied: Vec<AppliedFile>,
    pub subrepo_pr: Option<PullRequestRef>,
    pub superproject_pr: Option<PullRequestRef>,
}

/// Everything a run would do, computed without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub ids: DerivedIds,
    pub issue: IssueSnapshot,
    /// Branch after collision handling.
    pub branch: BranchName,
    pub subrepo: SubrepoMessages,
    pub superproject_commit: String,
    pub superproject_pr_title: String,
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct Workflow<'a> {
    ports: Ports<'a>,
    renderer: &'a Renderer,
    settings: Settings,
}

impl<'a> Workflow<'a> {
    pub fn new(ports: Ports<'a>, renderer: &'a Renderer, settings: Settings) -> Self {
        Self {
            ports,
            renderer,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Execute the full pipeline for one issue.
    pub fn run(
        &self,
        params: &InvocationParams,
        state: &mut RunState,
    ) -> Result<RunOutcome, WorkflowError> {
        let vcs = self.ports.vcs;
        check_conventions(&params.conventions)?;

        let ids = params.derive(&self.settings.root, &self.settings.lib_dir);
        let issue = self.fetch_issue(&ids.subrepo_slug, params.issue)?;
        state.issue = Some(issue.clone());

        let superproject = WorkTree::superproject(&self.settings.root);
        let subrepo = WorkTree::subrepo(&ids.subrepo_path);

        self.sync_tree(&superproject, &params.base, true)?;
        ensure_subrepo_dir(&ids.subrepo_path)?;

        let branch = resolve_branch(vcs, &[&superproject, &subrepo], &self.settings.remote, &ids.branch)?;
        vcs.create_branch(&superproject, &branch)
            .map_err(vcs_err(TreeRole::Superproject, "checkout -b"))?;
        state.branch = Some(branch.clone());

        self.sync_tree(&subrepo, &params.base, false)?;
        vcs.create_branch(&subrepo, &branch)
            .map_err(vcs_err(TreeRole::Subrepo, "checkout -b"))?;

        let ctx = MessageContext::new(params, &ids, &issue, &branch, self.ports.agent.display_name());
        let scratch = self.propose_changes(&subrepo, &ids, params.issue, &ctx, &params.conventions)?;

        if scratch.output_is_empty()? {
            release(scratch);
            tracing::info!(issue = %params.issue, "agent produced no files");
            return Ok(RunOutcome::NoChanges { issue, branch });
        }

        let applied = apply_change_set(scratch.output_dir(), &subrepo.root)?;
        release(scratch);
        state.applied = applied.clone();

        if vcs.is_clean(&subrepo).map_err(vcs_err(TreeRole::Subrepo, "status"))? {
            tracing::info!(issue = %params.issue, "applied files leave the subrepository unchanged");
            return Ok(RunOutcome::UnchangedTree {
                issue,
                branch,
                applied,
            });
        }

        let subrepo_pr = self.publish_subrepo(&subrepo, &ids, params, &branch, &ctx)?;
        state.subrepo_pr = Some(subrepo_pr.clone());

        let superproject_pr = self
            .publish_superproject(&superproject, &ids, params, &branch, &ctx, &subrepo_pr)
            .map_err(|e| WorkflowError::SuperprojectIncomplete {
                subrepo_pr: subrepo_pr.clone(),
                source: Box::new(e),
            })?;
        state.superproject_pr = Some(superproject_pr.clone());

        Ok(RunOutcome::Completed {
            issue,
            branch,
            applied,
            subrepo_pr,
            superproject_pr,
        })
    }

    /// Resolve everything a run would do without touching either tree.
    ///
    /// Still queries the issue tracker and inspects existing branches.
    pub fn plan(&self, params: &InvocationParams) -> Result<Plan, WorkflowError> {
        check_conventions(&params.conventions)?;
        let ids = params.derive(&self.settings.root, &self.settings.lib_dir);
        let issue = self.fetch_issue(&ids.subrepo_slug, params.issue)?;
        ensure_subrepo_dir(&ids.subrepo_path)?;

        let superproject = WorkTree::superproject(&self.settings.root);
        let subrepo = WorkTree::subrepo(&ids.subrepo_path);
        // git inside an uninitialized submodule directory answers for the
        // superproject, so only consult checkouts that exist.
        let mut trees = vec![&superproject];
        if ids.subrepo_path.join(".git").exists() {
            trees.push(&subrepo);
        } else {
            tracing::warn!(
                path = %ids.subrepo_path.display(),
                "subrepository is not initialized; branch checked against the superproject only"
            );
        }
        let branch = resolve_branch(self.ports.vcs, &trees, &self.settings.remote, &ids.branch)?;

        let ctx = MessageContext::new(params, &ids, &issue, &branch, self.ports.agent.display_name());
        Ok(Plan {
            subrepo: self.renderer.subrepo_messages(&ctx)?,
            superproject_commit: self.renderer.render(&ctx, MessageKind::SuperprojectCommit)?,
            superproject_pr_title: self.renderer.render(&ctx, MessageKind::SuperprojectPrTitle)?,
            prompt: self.renderer.agent_prompt(&ctx)?,
            ids,
            issue,
            branch,
        })
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    fn fetch_issue(&self, repo: &RepoSlug, issue: IssueNumber) -> Result<IssueSnapshot, WorkflowError> {
        let not_found = || WorkflowError::IssueNotFound {
            repo: repo.clone(),
            issue,
        };
        let title = match self.ports.issues.issue_title(repo, issue) {
            Ok(title) => title.trim().to_string(),
            Err(err) => {
                tracing::debug!(error = %err, "issue title lookup failed");
                return Err(not_found());
            }
        };
        if title.is_empty() {
            return Err(not_found());
        }

        let body = self.ports.issues.issue_body(repo, issue).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "issue body lookup failed; continuing with an empty body");
            String::new()
        });

        tracing::info!(repo = %repo, issue = %issue, title = %title, "fetched issue");
        Ok(IssueSnapshot {
            number: issue,
            title,
            body,
        })
    }

    /// Check out `base` and fast-forward it. The superproject is fetched
    /// first and has its submodules updated afterwards.
    fn sync_tree(&self, tree: &WorkTree, base: &str, superproject: bool) -> Result<(), WorkflowError> {
        let vcs = self.ports.vcs;
        let remote = self.settings.remote.as_str();
        tracing::info!(tree = %tree.role, base, "synchronizing");
        if superproject {
            vcs.fetch(tree, remote, base).map_err(vcs_err(tree.role, "fetch"))?;
        }
        vcs.checkout(tree, base).map_err(vcs_err(tree.role, "checkout"))?;
        vcs.pull_ff_only(tree, remote, base).map_err(vcs_err(tree.role, "pull"))?;
        if superproject {
            vcs.update_submodules(tree)
                .map_err(vcs_err(tree.role, "submodule update"))?;
        }
        Ok(())
    }

    fn propose_changes(
        &self,
        subrepo: &WorkTree,
        ids: &DerivedIds,
        issue: IssueNumber,
        ctx: &MessageContext,
        conventions: &Path,
    ) -> Result<ScratchSpace, WorkflowError> {
        let agent = self.ports.agent;
        let scratch = ScratchSpace::prepare(conventions)?;
        let request = AgentRequest {
            tree: subrepo.clone(),
            repo: ids.subrepo_slug.clone(),
            issue,
            conventions: scratch.conventions().to_path_buf(),
            output_dir: scratch.output_dir().to_path_buf(),
            prompt: self.renderer.agent_prompt(ctx)?,
        };

        let exit = agent.propose(&request).map_err(|source| WorkflowError::AgentSpawn {
            agent: agent.display_name().to_string(),
            source,
        })?;
        if !exit.success() {
            return Err(WorkflowError::AgentFailed {
                agent: agent.display_name().to_string(),
                code: exit.code,
            });
        }
        Ok(scratch)
    }

    fn publish_subrepo(
        &self,
        subrepo: &WorkTree,
        ids: &DerivedIds,
        params: &InvocationParams,
        branch: &BranchName,
        ctx: &MessageContext,
    ) -> Result<PullRequestRef, WorkflowError> {
        let vcs = self.ports.vcs;
        let messages = self.renderer.subrepo_messages(ctx)?;

        vcs.stage_all(subrepo).map_err(vcs_err(subrepo.role, "add"))?;
        vcs.commit(subrepo, &messages.commit)
            .map_err(vcs_err(subrepo.role, "commit"))?;
        vcs.push_upstream(subrepo, &self.settings.remote, branch)
            .map_err(vcs_err(subrepo.role, "push"))?;

        let request = NewPullRequest {
            repo: ids.subrepo_slug.clone(),
            base: params.base.clone(),
            head: branch.clone(),
            title: messages.pr_title,
            body: messages.pr_body,
            reviewer: params.reviewer.clone(),
        };
        let pr = self
            .ports
            .pulls
            .create_pull_request(subrepo, &request)
            .map_err(|source| WorkflowError::PullRequest {
                repo: request.repo.clone(),
                source,
            })?;
        tracing::info!(url = %pr.url, "opened subrepository pull request");
        Ok(pr)
    }

    fn publish_superproject(
        &self,
        superproject: &WorkTree,
        ids: &DerivedIds,
        params: &InvocationParams,
        branch: &BranchName,
        ctx: &MessageContext,
        subrepo_pr: &PullRequestRef,
    ) -> Result<PullRequestRef, WorkflowError> {
        let vcs = self.ports.vcs;
        let messages = self.renderer.superproject_messages(ctx, subrepo_pr)?;

        vcs.stage_path(superproject, &ids.subrepo_rel)
            .map_err(vcs_err(superproject.role, "add"))?;
        vcs.commit(superproject, &messages.commit)
            .map_err(vcs_err(superproject.role, "commit"))?;
        vcs.push_upstream(superproject, &self.settings.remote, branch)
            .map_err(vcs_err(superproject.role, "push"))?;

        let request = NewPullRequest {
            repo: params.superproject.clone(),
            base: params.base.clone(),
            head: branch.clone(),
            title: messages.pr_title,
            body: messages.pr_body,
            reviewer: params.reviewer.clone(),
        };
        let pr = self
            .ports
            .pulls
            .create_pull_request(superproject, &request)
            .map_err(|source| WorkflowError::PullRequest {
                repo: request.repo.clone(),
                source,
            })?;
        tracing::info!(url = %pr.url, "opened superproject pull request");
        Ok(pr)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_conventions(path: &Path) -> Result<(), WorkflowError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(WorkflowError::ConventionsMissing {
            path: path.to_path_buf(),
        })
    }
}

fn ensure_subrepo_dir(path: &Path) -> Result<(), WorkflowError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(WorkflowError::SubrepoMissing {
            path: path.to_path_buf(),
        })
    }
}

/// Remove scratch space early; a failure here is only worth a warning.
fn release(scratch: ScratchSpace) {
    let root = scratch.root().to_path_buf();
    if let Err(err) = scratch.close() {
        tracing::warn!(path = %root.display(), error = %err, "failed to remove scratch directory");
    }
}
