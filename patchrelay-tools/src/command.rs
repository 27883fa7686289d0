//! Thin wrapper around `std::process::Command` shared by every adapter.
//!
//! Every invocation gets an explicit working directory and has interactive
//! prompts disabled so automation never blocks on a credential helper.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::ToolError;

/// Captured result of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub program: String,
    pub args: Vec<String>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Return stdout on success, or a [`ToolError::Failed`].
    pub fn into_result(self) -> Result<String, ToolError> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(ToolError::Failed {
                program: self.program,
                args: self.args.join(" "),
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

fn base_command(program: &str, cwd: &Path, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GCM_INTERACTIVE", "never")
        .env("GH_PROMPT_DISABLED", "1");
    cmd
}

/// Run `program args…` in `cwd`, capturing stdout and stderr.
pub fn run(program: &str, cwd: &Path, args: &[String]) -> Result<CommandOutput, ToolError> {
    tracing::debug!(program, args = %args.join(" "), cwd = %cwd.display(), "exec");
    let output = base_command(program, cwd, args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    Ok(CommandOutput {
        program: program.to_string(),
        args: args.to_vec(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

/// Run `program args…` in `cwd` with stdout/stderr inherited from this
/// process, so long-running tools stream their progress. Returns the exit
/// code (`None` when terminated by a signal).
pub fn run_inherited(program: &str, cwd: &Path, args: &[String]) -> Result<Option<i32>, ToolError> {
    tracing::debug!(program, cwd = %cwd.display(), "exec (streaming)");
    let status = base_command(program, cwd, args)
        .stdin(Stdio::null())
        .status()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;
    Ok(status.code())
}

/// Borrowed `&str` arguments into owned strings.
pub fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}
