//! In-memory collaborators for driving the pipeline without git, gh, or an
//! agent binary.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use patchrelay_core::types::{
    BranchName, InvocationParams, IssueNumber, PullRequestRef, RepoSlug, Reviewer, TreeRole,
    WorkTree,
};
use patchrelay_render::Renderer;
use patchrelay_tools::{
    AgentExit, AgentRequest, ChangeProposalAgent, IssueTracker, NewPullRequest,
    PullRequestClient, ToolError, VcsClient,
};
use patchrelay_workflow::{Ports, Settings, Workflow};

pub const CONVENTIONS: &str = "# Conventions\n\nUse type hints.\n";

fn failure(what: &str) -> ToolError {
    ToolError::Failed {
        program: "fake".into(),
        args: what.into(),
        code: 1,
        stderr: format!("{what} refused"),
    }
}

// ---------------------------------------------------------------------------
// VCS
// ---------------------------------------------------------------------------

/// Records every call as `"<tree> <op> <args>"`.
#[derive(Default)]
pub struct FakeVcs {
    pub calls: RefCell<Vec<String>>,
    /// `(tree, branch)` pairs that already exist locally.
    pub local: HashSet<(TreeRole, String)>,
    /// `(tree, branch)` pairs that already exist on the remote.
    pub remote: HashSet<(TreeRole, String)>,
    /// Whether `is_clean` reports a clean subrepository.
    pub clean: Cell<bool>,
    /// A call prefix that should fail, e.g. `"subrepo pull"`.
    pub fail_on: Option<String>,
}

impl FakeVcs {
    fn record(&self, tree: &WorkTree, call: String) -> Result<(), ToolError> {
        let line = format!("{} {}", tree.role, call);
        let fail = self
            .fail_on
            .as_deref()
            .is_some_and(|prefix| line.starts_with(prefix));
        self.calls.borrow_mut().push(line.clone());
        if fail {
            Err(failure(&line))
        } else {
            Ok(())
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c == call)
    }

    pub fn has(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }
}

impl VcsClient for FakeVcs {
    fn fetch(&self, tree: &WorkTree, remote: &str, branch: &str) -> Result<(), ToolError> {
        self.record(tree, format!("fetch {remote} {branch}"))
    }

    fn checkout(&self, tree: &WorkTree, branch: &str) -> Result<(), ToolError> {
        self.record(tree, format!("checkout {branch}"))
    }

    fn pull_ff_only(&self, tree: &WorkTree, remote: &str, branch: &str) -> Result<(), ToolError> {
        self.record(tree, format!("pull {remote} {branch}"))
    }

    fn update_submodules(&self, tree: &WorkTree) -> Result<(), ToolError> {
        self.record(tree, "submodule update".into())
    }

    fn create_branch(&self, tree: &WorkTree, branch: &BranchName) -> Result<(), ToolError> {
        self.record(tree, format!("checkout -b {branch}"))
    }

    fn local_branch_exists(&self, tree: &WorkTree, branch: &BranchName) -> Result<bool, ToolError> {
        Ok(self.local.contains(&(tree.role, branch.0.clone())))
    }

    fn remote_branch_exists(
        &self,
        tree: &WorkTree,
        _remote: &str,
        branch: &BranchName,
    ) -> Result<bool, ToolError> {
        Ok(self.remote.contains(&(tree.role, branch.0.clone())))
    }

    fn is_clean(&self, tree: &WorkTree) -> Result<bool, ToolError> {
        self.record(tree, "status".into())?;
        Ok(self.clean.get())
    }

    fn stage_all(&self, tree: &WorkTree) -> Result<(), ToolError> {
        self.record(tree, "add -A".into())
    }

    fn stage_path(&self, tree: &WorkTree, path: &Path) -> Result<(), ToolError> {
        self.record(tree, format!("add {}", path.display()))
    }

    fn commit(&self, tree: &WorkTree, message: &str) -> Result<(), ToolError> {
        self.record(tree, format!("commit {message}"))
    }

    fn push_upstream(
        &self,
        tree: &WorkTree,
        remote: &str,
        branch: &BranchName,
    ) -> Result<(), ToolError> {
        self.record(tree, format!("push {remote} {branch}"))
    }
}

// ---------------------------------------------------------------------------
// Issue tracker
// ---------------------------------------------------------------------------

pub struct FakeIssues {
    /// `None` makes the title lookup fail.
    pub title: Option<String>,
    /// `None` makes the body lookup fail.
    pub body: Option<String>,
}

impl Default for FakeIssues {
    fn default() -> Self {
        Self {
            title: Some("Export drops empty columns".into()),
            body: Some("Calling export() on a table with empty columns loses them.".into()),
        }
    }
}

impl IssueTracker for FakeIssues {
    fn issue_title(&self, _repo: &RepoSlug, _issue: IssueNumber) -> Result<String, ToolError> {
        self.title.clone().ok_or_else(|| failure("issue view title"))
    }

    fn issue_body(&self, _repo: &RepoSlug, _issue: IssueNumber) -> Result<String, ToolError> {
        self.body.clone().ok_or_else(|| failure("issue view body"))
    }
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakePulls {
    pub created: RefCell<Vec<NewPullRequest>>,
    /// 1-based index of the create call that fails.
    pub fail_on: Option<usize>,
}

impl FakePulls {
    pub fn created(&self) -> Vec<NewPullRequest> {
        self.created.borrow().clone()
    }
}

impl PullRequestClient for FakePulls {
    fn create_pull_request(
        &self,
        _tree: &WorkTree,
        request: &NewPullRequest,
    ) -> Result<PullRequestRef, ToolError> {
        let attempt = self.created.borrow().len() + 1;
        if self.fail_on == Some(attempt) {
            return Err(failure("pr create"));
        }
        self.created.borrow_mut().push(request.clone());
        Ok(PullRequestRef {
            repo: request.repo.clone(),
            url: format!("https://github.com/{}/pull/{}", request.repo, 100 + attempt),
        })
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Writes `files` into the output directory and exits with `code`.
pub struct FakeAgent {
    pub files: Vec<(String, String)>,
    pub code: Option<i32>,
    pub requests: RefCell<Vec<AgentRequest>>,
    /// Conventions content as seen during the call.
    pub seen_conventions: RefCell<Option<String>>,
}

impl FakeAgent {
    pub fn writing(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            code: Some(0),
            requests: RefCell::new(Vec::new()),
            seen_conventions: RefCell::new(None),
        }
    }

    pub fn exiting(code: Option<i32>) -> Self {
        Self {
            code,
            ..Self::writing(&[])
        }
    }

    pub fn last_request(&self) -> Option<AgentRequest> {
        self.requests.borrow().last().cloned()
    }
}

impl ChangeProposalAgent for FakeAgent {
    fn display_name(&self) -> &str {
        "Fake Agent"
    }

    fn propose(&self, request: &AgentRequest) -> Result<AgentExit, ToolError> {
        self.requests.borrow_mut().push(request.clone());
        *self.seen_conventions.borrow_mut() = std::fs::read_to_string(&request.conventions).ok();
        for (rel, content) in &self.files {
            let path = request.output_dir.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| ToolError::Spawn {
                    program: "fake-agent".into(),
                    source,
                })?;
            }
            std::fs::write(&path, content).map_err(|source| ToolError::Spawn {
                program: "fake-agent".into(),
                source,
            })?;
        }
        Ok(AgentExit { code: self.code })
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// A superproject checkout on disk with an initialized `lib/napistu-py` and a
/// conventions file.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("lib/napistu-py/src")).unwrap();
        std::fs::write(dir.path().join("lib/napistu-py/src/export.py"), "def export():\n    pass\n").unwrap();
        std::fs::write(dir.path().join("lib/napistu-py/.git"), "gitdir: ../../.git/modules/napistu-py\n").unwrap();
        std::fs::write(dir.path().join("conventions.md"), CONVENTIONS).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn subrepo(&self) -> PathBuf {
        self.root().join("lib/napistu-py")
    }

    pub fn params(&self) -> InvocationParams {
        InvocationParams {
            superproject: RepoSlug::new("napistu", "napistu"),
            subrepo: "napistu-py".into(),
            issue: IssueNumber(42),
            base: "main".into(),
            conventions: self.root().join("conventions.md"),
            reviewer: Reviewer::parse("alice"),
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            root: self.root().to_path_buf(),
            lib_dir: PathBuf::from("lib"),
            remote: "origin".into(),
        }
    }
}

pub fn renderer() -> Renderer {
    Renderer::new().unwrap()
}

pub fn workflow<'a>(
    fixture: &Fixture,
    renderer: &'a Renderer,
    vcs: &'a FakeVcs,
    issues: &'a FakeIssues,
    pulls: &'a FakePulls,
    agent: &'a FakeAgent,
) -> Workflow<'a> {
    Workflow::new(
        Ports {
            vcs,
            issues,
            pulls,
            agent,
        },
        renderer,
        fixture.settings(),
    )
}
