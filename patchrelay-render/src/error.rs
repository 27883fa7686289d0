//! Error types for patchrelay-render.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Loading or parsing a template failed.
    #[error("template error: {0}")]
    Tera(#[from] tera::Error),

    /// A specific message could not be rendered.
    #[error("failed to render {template}: {source}")]
    Message {
        template: &'static str,
        #[source]
        source: tera::Error,
    },

    /// Reading a user override failed.
    #[error("cannot read template override at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
