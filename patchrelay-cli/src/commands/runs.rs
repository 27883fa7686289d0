//! `patchrelay runs` — recorded workflow runs.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use patchrelay_core::config;
use patchrelay_workflow::{record, RunRecord, RunStatus};

/// Arguments for `patchrelay runs`.
#[derive(Args, Debug)]
pub struct RunsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct RunTableRow {
    #[tabled(rename = "issue")]
    issue: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "finished")]
    finished: String,
    #[tabled(rename = "pull requests")]
    pulls: String,
}

impl RunsArgs {
    pub fn run(self) -> Result<()> {
        let home = config::home().context("could not determine home directory")?;
        let records = record::list_at(&home).context("failed to read run records")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&records).context("failed to serialize runs JSON")?
            );
            return Ok(());
        }

        if records.is_empty() {
            println!("No runs recorded.");
            return Ok(());
        }

        let partial = records
            .iter()
            .filter(|r| r.status == RunStatus::Partial)
            .count();
        let rows: Vec<RunTableRow> = records.iter().map(row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        if partial > 0 {
            println!(
                "{} {partial} run(s) opened a subrepository pull request without its superproject counterpart.",
                "■".red().bold()
            );
        }
        Ok(())
    }
}

fn row(r: &RunRecord) -> RunTableRow {
    let pulls = [r.subrepo_pr_url.as_deref(), r.superproject_pr_url.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");
    RunTableRow {
        issue: format!("{}#{}", r.subrepo, r.issue),
        status: status_label(r.status).to_string(),
        branch: r.branch.clone().unwrap_or_else(|| "-".to_string()),
        finished: r.finished_at.format("%Y-%m-%d %H:%M").to_string(),
        pulls: if pulls.is_empty() { "-".to_string() } else { pulls },
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Completed => "COMPLETED",
        RunStatus::NoChanges => "NO CHANGES",
        RunStatus::UnchangedTree => "UNCHANGED",
        RunStatus::Failed => "FAILED",
        RunStatus::Partial => "PARTIAL",
    }
}
