//! Copy a generated change set over a working tree.
//!
//! Each file is compared by SHA-256 with what is already on disk and only
//! rewritten when the content differs. Writes go to a `.patchrelay.tmp`
//! sibling first and are renamed into place. `.git` entries in the change set
//! are never copied.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, WorkflowError};

/// Outcome for one file of the change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedFile {
    /// Content differed (or the file was new) and was written.
    Written { path: PathBuf },
    /// Content already matched the working tree.
    Unchanged { path: PathBuf },
}

impl AppliedFile {
    /// Path relative to the tree root.
    pub fn path(&self) -> &Path {
        match self {
            AppliedFile::Written { path } | AppliedFile::Unchanged { path } => path,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, AppliedFile::Written { .. })
    }
}

/// Recursively copy every file under `source` into `tree_root`, preserving
/// relative paths. Results are sorted by relative path.
pub fn apply_change_set(source: &Path, tree_root: &Path) -> Result<Vec<AppliedFile>, WorkflowError> {
    let mut files = Vec::new();
    collect_files(source, source, &mut files)?;
    files.sort();

    let mut applied = Vec::with_capacity(files.len());
    for rel in files {
        let from = source.join(&rel);
        let to = tree_root.join(&rel);
        let result = if same_content(&from, &to)? {
            tracing::debug!("unchanged: {}", rel.display());
            AppliedFile::Unchanged { path: rel }
        } else {
            copy_atomic(&from, &to)?;
            tracing::info!("applied: {}", rel.display());
            AppliedFile::Written { path: rel }
        };
        applied.push(result);
    }
    Ok(applied)
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), WorkflowError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        if entry.file_name() == ".git" {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            out.push(rel);
        }
    }
    Ok(())
}

fn digest(path: &Path) -> Result<String, WorkflowError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    let mut h = Sha256::new();
    h.update(&bytes);
    Ok(hex::encode(h.finalize()))
}

fn same_content(from: &Path, to: &Path) -> Result<bool, WorkflowError> {
    if !to.is_file() {
        return Ok(false);
    }
    Ok(digest(from)? == digest(to)?)
}

fn copy_atomic(from: &Path, to: &Path) -> Result<(), WorkflowError> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.patchrelay.tmp", to.display()));
    std::fs::copy(from, &tmp).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, to) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(to, e));
    }
    Ok(())
}
