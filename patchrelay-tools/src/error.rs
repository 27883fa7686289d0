//! Error types for patchrelay-tools.

use thiserror::Error;

/// Failure talking to an external command-line tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started at all (not installed, not executable).
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{program} {args} failed (exit {code}): {stderr}")]
    Failed {
        program: String,
        args: String,
        code: i32,
        stderr: String,
    },

    /// The program succeeded but its output could not be interpreted.
    #[error("unexpected output from {program}: {message}")]
    Output { program: String, message: String },
}
