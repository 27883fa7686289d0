//! Error types for patchrelay-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning parsed options into [`crate::InvocationParams`].
///
/// All of these are usage errors: nothing has been touched yet when they fire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    /// A required option was not supplied (or was blank).
    #[error("missing required option --{option}")]
    Missing { option: &'static str },

    /// `--main-repo` was not of the form `owner/name`.
    #[error("invalid repository '{value}'; expected owner/name")]
    MalformedRepo { value: String },

    /// `--submodule` must be a single directory name under the library dir.
    #[error("invalid submodule name '{value}'; expected a single directory name")]
    InvalidSubmodule { value: String },

    /// Issue numbers start at 1.
    #[error("invalid issue number {value}; issue numbers start at 1")]
    InvalidIssue { value: u64 },
}

/// All errors that can arise from config file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, with the path that was being touched.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, including the file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
