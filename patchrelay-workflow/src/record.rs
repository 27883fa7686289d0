//! Run records — one JSON document per issue describing the latest run.
//!
//! Persisted at `<home>/.patchrelay/runs/<owner>__<subrepo>__<N>.json`.
//! Writes use the atomic `.tmp` + rename pattern. A rerun for the same
//! issue replaces the previous record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use patchrelay_core::config::runs_dir_at;
use patchrelay_core::types::{InvocationParams, IssueNumber, RepoSlug};

use crate::error::{io_err, WorkflowError};
use crate::pipeline::{RunOutcome, RunState};

/// How a recorded run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    NoChanges,
    UnchangedTree,
    Failed,
    /// Subrepository pull request opened, superproject side not finished.
    Partial,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Completed => "completed",
            RunStatus::NoChanges => "no_changes",
            RunStatus::UnchangedTree => "unchanged_tree",
            RunStatus::Failed => "failed",
            RunStatus::Partial => "partial",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub superproject: String,
    pub subrepo: String,
    pub issue: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Files the agent changed, relative to the subrepository root.
    #[serde(default)]
    pub files_written: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subrepo_pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superproject_pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// Summarise a finished run from whatever state it reached.
    pub fn from_run(
        params: &InvocationParams,
        started_at: DateTime<Utc>,
        state: &RunState,
        result: &Result<RunOutcome, WorkflowError>,
    ) -> Self {
        let status = match result {
            Ok(RunOutcome::Completed { .. }) => RunStatus::Completed,
            Ok(RunOutcome::NoChanges { .. }) => RunStatus::NoChanges,
            Ok(RunOutcome::UnchangedTree { .. }) => RunStatus::UnchangedTree,
            Err(e) if e.orphaned_pull_request().is_some() => RunStatus::Partial,
            Err(_) => RunStatus::Failed,
        };

        RunRecord {
            superproject: params.superproject.to_string(),
            subrepo: params.subrepo_slug().to_string(),
            issue: params.issue.0,
            title: state.issue.as_ref().map(|i| i.title.clone()),
            branch: state.branch.as_ref().map(|b| b.0.clone()),
            status,
            started_at,
            finished_at: Utc::now(),
            files_written: state
                .applied
                .iter()
                .filter(|a| a.is_written())
                .map(|a| a.path().to_string_lossy().replace('\\', "/"))
                .collect(),
            subrepo_pr_url: state.subrepo_pr.as_ref().map(|p| p.url.clone()),
            superproject_pr_url: state.superproject_pr.as_ref().map(|p| p.url.clone()),
            error: result.as_ref().err().map(|e| e.to_string()),
        }
    }
}

/// `~/.patchrelay/runs/<owner>__<subrepo>__<N>.json`
pub fn record_path_at(home: &Path, subrepo: &RepoSlug, issue: IssueNumber) -> PathBuf {
    runs_dir_at(home).join(format!("{}__{}__{}.json", subrepo.owner, subrepo.name, issue.0))
}

/// Save `record` atomically, replacing any earlier run for the same issue.
pub fn save_at(home: &Path, record: &RunRecord) -> Result<PathBuf, WorkflowError> {
    let slug: RepoSlug = record.subrepo.parse().map_err(|_| {
        io_err(
            runs_dir_at(home),
            std::io::Error::other(format!("invalid repository slug '{}'", record.subrepo)),
        )
    })?;
    let path = record_path_at(home, &slug, IssueNumber(record.issue));
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid run record path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(record)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(path)
}

/// All saved records, newest first. Unreadable files are skipped.
pub fn list_at(home: &Path) -> Result<Vec<RunRecord>, WorkflowError> {
    let dir = runs_dir_at(home);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
        let path = entry.map_err(|e| io_err(&dir, e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        match serde_json::from_str::<RunRecord>(&contents) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable run record"),
        }
    }
    records.sort_by(|a, b| b.finished_at.cmp(&a.finished_at));
    Ok(records)
}
