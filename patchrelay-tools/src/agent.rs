//! Command-line adapter for the change-proposal agent.
//!
//! The agent is invoked as
//!
//! ```text
//! <program> [extra_args…] --repo <owner/name> --issue <N> \
//!     --conventions <file> --output-dir <dir> --prompt <text>
//! ```
//!
//! in the subrepository checkout, with output streamed to the terminal.

use patchrelay_core::config::AgentSettings;

use crate::command;
use crate::error::ToolError;
use crate::ports::{AgentExit, AgentRequest, ChangeProposalAgent};

#[derive(Debug, Clone)]
pub struct AgentCli {
    settings: AgentSettings,
}

impl AgentCli {
    pub fn new(settings: AgentSettings) -> Self {
        Self { settings }
    }

    pub fn args(&self, request: &AgentRequest) -> Vec<String> {
        let mut args = self.settings.extra_args.clone();
        args.extend([
            "--repo".to_string(),
            request.repo.to_string(),
            "--issue".to_string(),
            request.issue.to_string(),
            "--conventions".to_string(),
            request.conventions.to_string_lossy().into_owned(),
            "--output-dir".to_string(),
            request.output_dir.to_string_lossy().into_owned(),
            "--prompt".to_string(),
            request.prompt.clone(),
        ]);
        args
    }
}

impl ChangeProposalAgent for AgentCli {
    fn display_name(&self) -> &str {
        &self.settings.display_name
    }

    fn propose(&self, request: &AgentRequest) -> Result<AgentExit, ToolError> {
        tracing::info!(
            agent = %self.settings.display_name,
            repo = %request.repo,
            issue = %request.issue,
            "invoking change-proposal agent"
        );
        let code = command::run_inherited(&self.settings.program, &request.tree.root, &self.args(request))?;
        Ok(AgentExit { code })
    }
}
