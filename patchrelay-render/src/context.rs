//! Template context — serializable rendering payload for one invocation.

use serde::{Deserialize, Serialize};

use patchrelay_core::types::{BranchName, DerivedIds, InvocationParams, IssueSnapshot};

use crate::error::RenderError;

/// Everything the message templates may reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageContext {
    pub issue: IssueCtx,
    pub subrepo: SubrepoCtx,
    /// Superproject as `owner/name`.
    pub superproject: String,
    pub branch: String,
    pub base: String,
    /// Reviewer handle without the `@`.
    pub reviewer: Option<String>,
    /// Display name of the change-proposal agent.
    pub agent_name: String,
    /// Set only once the subrepository pull request exists.
    pub subrepo_pr_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCtx {
    pub number: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubrepoCtx {
    pub name: String,
    pub slug: String,
    /// Path relative to the superproject root, `/`-separated.
    pub path: String,
}

impl MessageContext {
    /// Build a context for `branch`, which may carry a collision suffix.
    pub fn new(
        params: &InvocationParams,
        ids: &DerivedIds,
        issue: &IssueSnapshot,
        branch: &BranchName,
        agent_name: &str,
    ) -> Self {
        MessageContext {
            issue: IssueCtx {
                number: issue.number.0,
                title: issue.title.clone(),
                body: issue.body.clone(),
            },
            subrepo: SubrepoCtx {
                name: params.subrepo.clone(),
                slug: ids.subrepo_slug.to_string(),
                path: ids.subrepo_rel.to_string_lossy().replace('\\', "/"),
            },
            superproject: params.superproject.to_string(),
            branch: branch.0.clone(),
            base: params.base.clone(),
            reviewer: params.reviewer.as_ref().map(|r| r.0.clone()),
            agent_name: agent_name.to_string(),
            subrepo_pr_url: None,
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchrelay_core::{Config, IssueNumber, RawParams};
    use std::path::Path;

    #[test]
    fn context_fields_populated() {
        let params = InvocationParams::resolve(
            RawParams {
                submodule: Some("napistu-py".to_string()),
                issue: Some(42),
                reviewer: Some("alice".to_string()),
                ..RawParams::default()
            },
            &Config::default(),
        )
        .unwrap();
        let ids = params.derive(Path::new("/work/napistu"), Path::new("lib"));
        let issue = IssueSnapshot {
            number: IssueNumber(42),
            title: "Fix off-by-one".to_string(),
            body: "details".to_string(),
        };

        let ctx = MessageContext::new(&params, &ids, &issue, &ids.branch, "Claude Code");
        assert_eq!(ctx.issue.number, 42);
        assert_eq!(ctx.subrepo.slug, "napistu/napistu-py");
        assert_eq!(ctx.subrepo.path, "lib/napistu-py");
        assert_eq!(ctx.superproject, "napistu/napistu");
        assert_eq!(ctx.branch, "fix-issue-42");
        assert_eq!(ctx.reviewer.as_deref(), Some("alice"));
        assert!(ctx.subrepo_pr_url.is_none());
        ctx.to_tera_context().expect("context conversion");
    }
}
