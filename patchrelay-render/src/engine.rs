//! Tera rendering engine — [`MessageKind`] enum and [`Renderer`].
//!
//! # Template names
//!
//! | Message                    | Template                               |
//! |----------------------------|----------------------------------------|
//! | Subrepo commit message     | `subrepo/commit.tera`                  |
//! | Subrepo PR title / body    | `subrepo/pr_title.tera`, `pr_body.tera`|
//! | Superproject commit        | `superproject/commit.tera`             |
//! | Superproject PR title/body | `superproject/pr_title.tera`, `pr_body.tera` |
//! | Agent prompt               | `agent/prompt.tera`                    |
//!
//! A user template directory may override any of these by relative name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use patchrelay_core::types::PullRequestRef;

use crate::context::MessageContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates — baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("shared/_reviewer.tera", include_str!("templates/_partials/reviewer.tera")),
    ("subrepo/commit.tera", include_str!("templates/subrepo_commit.tera")),
    ("subrepo/pr_title.tera", include_str!("templates/subrepo_pr_title.tera")),
    ("subrepo/pr_body.tera", include_str!("templates/subrepo_pr_body.tera")),
    (
        "superproject/commit.tera",
        include_str!("templates/superproject_commit.tera"),
    ),
    (
        "superproject/pr_title.tera",
        include_str!("templates/superproject_pr_title.tera"),
    ),
    (
        "superproject/pr_body.tera",
        include_str!("templates/superproject_pr_body.tera"),
    ),
    ("agent/prompt.tera", include_str!("templates/agent_prompt.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(
            normalize_template_name(Path::new(name)),
            (*content).to_string(),
        );
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            tracing::debug!(template = %name, "using user template override");
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// Every piece of text the workflow generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    SubrepoCommit,
    SubrepoPrTitle,
    SubrepoPrBody,
    SuperprojectCommit,
    SuperprojectPrTitle,
    SuperprojectPrBody,
    AgentPrompt,
}

impl MessageKind {
    /// All message kinds in a stable order.
    pub fn all() -> &'static [MessageKind] {
        &[
            MessageKind::SubrepoCommit,
            MessageKind::SubrepoPrTitle,
            MessageKind::SubrepoPrBody,
            MessageKind::SuperprojectCommit,
            MessageKind::SuperprojectPrTitle,
            MessageKind::SuperprojectPrBody,
            MessageKind::AgentPrompt,
        ]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            MessageKind::SubrepoCommit       => "subrepo/commit.tera",
            MessageKind::SubrepoPrTitle      => "subrepo/pr_title.tera",
            MessageKind::SubrepoPrBody       => "subrepo/pr_body.tera",
            MessageKind::SuperprojectCommit  => "superproject/commit.tera",
            MessageKind::SuperprojectPrTitle => "superproject/pr_title.tera",
            MessageKind::SuperprojectPrBody  => "superproject/pr_body.tera",
            MessageKind::AgentPrompt         => "agent/prompt.tera",
        }
    }

    /// Titles and commit subjects are collapsed to a single line.
    pub fn is_single_line(&self) -> bool {
        matches!(
            self,
            MessageKind::SubrepoCommit
                | MessageKind::SubrepoPrTitle
                | MessageKind::SuperprojectCommit
                | MessageKind::SuperprojectPrTitle
        )
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded defaults.
/// Template names are normalised to lowercase and relative paths.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Construct a new [`TemplateEngine`], loading embedded templates plus any
    /// overrides found in `user_template_dir`.
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render one message. Trailing whitespace is always stripped.
    pub fn render(&self, ctx: &MessageContext, kind: MessageKind) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self
            .tera
            .render(kind.template_name(), &tera_ctx)
            .map_err(|source| RenderError::Message {
                template: kind.template_name(),
                source,
            })?;
        let rendered = rendered.replace("\r\n", "\n");
        if kind.is_single_line() {
            let line = rendered
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            return Ok(line);
        }
        Ok(rendered.trim_end().to_string())
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Commit message and pull-request text for the subrepository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubrepoMessages {
    pub commit: String,
    pub pr_title: String,
    pub pr_body: String,
}

/// Commit message and pull-request text for the superproject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperprojectMessages {
    pub commit: String,
    pub pr_title: String,
    pub pr_body: String,
}

/// Typed front end over [`TemplateEngine`]. Create once and reuse.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Construct a new [`Renderer`] with embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(None)? })
    }

    /// Construct a [`Renderer`] that prefers templates found in `dir`.
    pub fn with_overrides(dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(Some(dir))? })
    }

    pub fn render(&self, ctx: &MessageContext, kind: MessageKind) -> Result<String, RenderError> {
        self.engine.render(ctx, kind)
    }

    pub fn agent_prompt(&self, ctx: &MessageContext) -> Result<String, RenderError> {
        self.render(ctx, MessageKind::AgentPrompt)
    }

    pub fn subrepo_messages(&self, ctx: &MessageContext) -> Result<SubrepoMessages, RenderError> {
        Ok(SubrepoMessages {
            commit: self.render(ctx, MessageKind::SubrepoCommit)?,
            pr_title: self.render(ctx, MessageKind::SubrepoPrTitle)?,
            pr_body: self.render(ctx, MessageKind::SubrepoPrBody)?,
        })
    }

    /// Superproject text. Takes the subrepository pull request so the body
    /// can never be produced before its URL is known.
    pub fn superproject_messages(
        &self,
        ctx: &MessageContext,
        subrepo_pr: &PullRequestRef,
    ) -> Result<SuperprojectMessages, RenderError> {
        let mut ctx = ctx.clone();
        ctx.subrepo_pr_url = Some(subrepo_pr.url.clone());
        Ok(SuperprojectMessages {
            commit: self.render(&ctx, MessageKind::SuperprojectCommit)?,
            pr_title: self.render(&ctx, MessageKind::SuperprojectPrTitle)?,
            pr_body: self.render(&ctx, MessageKind::SuperprojectPrBody)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
