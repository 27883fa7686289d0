//! Scratch space for one agent invocation.
//!
//! Holds a private copy of the conventions document and the directory the
//! agent writes into. Both live under one temporary directory that is removed
//! when the [`ScratchSpace`] is dropped, so every exit path cleans up.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{io_err, WorkflowError};

pub struct ScratchSpace {
    dir: TempDir,
    conventions: PathBuf,
    output: PathBuf,
}

impl ScratchSpace {
    /// Copy `conventions` into a fresh scratch directory and create an empty
    /// output directory beside it. The copy sits in its own `conventions/`
    /// subdirectory so no file name can collide with `output/`.
    pub fn prepare(conventions: &Path) -> Result<Self, WorkflowError> {
        let dir = tempfile::Builder::new()
            .prefix("patchrelay-")
            .tempdir()
            .map_err(|e| io_err(std::env::temp_dir(), e))?;

        let file_name = conventions
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("conventions.md"));
        let conventions_dir = dir.path().join("conventions");
        std::fs::create_dir(&conventions_dir).map_err(|e| io_err(&conventions_dir, e))?;
        let conventions_copy = conventions_dir.join(file_name);
        std::fs::copy(conventions, &conventions_copy).map_err(|e| io_err(conventions, e))?;

        let output = dir.path().join("output");
        std::fs::create_dir(&output).map_err(|e| io_err(&output, e))?;

        tracing::debug!(scratch = %dir.path().display(), "prepared scratch space");
        Ok(Self {
            dir,
            conventions: conventions_copy,
            output,
        })
    }

    pub fn conventions(&self) -> &Path {
        &self.conventions
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `true` when the agent left the output directory empty.
    pub fn output_is_empty(&self) -> Result<bool, WorkflowError> {
        let mut entries = std::fs::read_dir(&self.output).map_err(|e| io_err(&self.output, e))?;
        Ok(entries.next().is_none())
    }

    /// Remove the scratch directory now, reporting failures instead of
    /// swallowing them as `Drop` does.
    pub fn close(self) -> Result<(), WorkflowError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| io_err(path, e))
    }
}
