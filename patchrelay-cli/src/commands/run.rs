//! `patchrelay --submodule <name> --issue <N>` — the issue-to-PR workflow.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use patchrelay_core::{config, InvocationParams, RawParams};
use patchrelay_render::Renderer;
use patchrelay_tools::{AgentCli, ChangeProposalAgent, GhCli, GitCli};
use patchrelay_workflow::{
    record, Plan, Ports, RunOutcome, RunRecord, RunState, Settings, Workflow, WorkflowError,
};

/// Options for a workflow run.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Superproject as owner/name.
    #[arg(long, value_name = "OWNER/NAME")]
    pub main_repo: Option<String>,

    /// Subrepository name under the library directory.
    #[arg(long, value_name = "NAME")]
    pub submodule: Option<String>,

    /// Issue number in the subrepository.
    #[arg(long, value_name = "N")]
    pub issue: Option<u64>,

    /// Base branch for both repositories.
    #[arg(long, value_name = "BRANCH")]
    pub base: Option<String>,

    /// Conventions document handed to the agent.
    #[arg(long, value_name = "PATH")]
    pub conventions: Option<PathBuf>,

    /// Reviewer requested on both pull requests.
    #[arg(long, value_name = "HANDLE")]
    pub reviewer: Option<String>,

    /// Superproject checkout root. Defaults to the current directory.
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Print the planned branch, messages, and prompt without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let home = config::home().context("could not determine home directory")?;
        let config = config::load_at(&home).context("failed to load patchrelay config")?;

        let params = InvocationParams::resolve(self.raw_params(), &config)?;
        let root = match self.root {
            Some(root) => root,
            None => std::env::current_dir().context("could not determine current directory")?,
        };

        let templates = config.templates_dir_at(&home);
        let renderer = Renderer::with_overrides(&templates)
            .with_context(|| format!("failed to load templates from {}", templates.display()))?;

        let git = GitCli::new(config.git_program.clone());
        let gh = GhCli::new(config.gh_program.clone());
        let agent = AgentCli::new(config.agent.clone());
        let workflow = Workflow::new(
            Ports {
                vcs: &git,
                issues: &gh,
                pulls: &gh,
                agent: &agent,
            },
            &renderer,
            Settings {
                root,
                lib_dir: config.lib_dir.clone(),
                remote: config.remote.clone(),
            },
        );

        if self.dry_run {
            let plan = workflow
                .plan(&params)
                .with_context(|| format!("dry run failed for issue #{}", params.issue))?;
            print_plan(&plan, agent.display_name());
            return Ok(());
        }

        let started_at = Utc::now();
        let mut state = RunState::default();
        let result = workflow.run(&params, &mut state);

        if state.issue.is_some() {
            let run = RunRecord::from_run(&params, started_at, &state, &result);
            match record::save_at(&home, &run) {
                Ok(path) => tracing::debug!(path = %path.display(), "saved run record"),
                Err(e) => tracing::warn!(error = %e, "failed to save run record"),
            }
        }

        match result {
            Ok(outcome) => {
                print_outcome(&outcome, agent.display_name());
                Ok(())
            }
            Err(err) => {
                print_manual_steps(&err);
                Err(err).with_context(|| {
                    format!("run failed for {}#{}", params.subrepo_slug(), params.issue)
                })
            }
        }
    }

    fn raw_params(&self) -> RawParams {
        RawParams {
            main_repo: self.main_repo.clone(),
            submodule: self.submodule.clone(),
            issue: self.issue,
            base: self.base.clone(),
            conventions: self.conventions.clone(),
            reviewer: self.reviewer.clone(),
        }
    }
}

fn print_outcome(outcome: &RunOutcome, agent: &str) {
    let issue = outcome.issue();
    match outcome {
        RunOutcome::NoChanges { branch, .. } => {
            println!(
                "{} issue #{}: No changes were generated by {agent} (branch '{branch}' left unpublished)",
                "✓".green(),
                issue.number
            );
        }
        RunOutcome::UnchangedTree { branch, applied, .. } => {
            println!(
                "{} issue #{}: {} file(s) matched the existing tree, nothing to commit (branch '{branch}')",
                "✓".green(),
                issue.number,
                applied.len()
            );
        }
        RunOutcome::Completed {
            branch,
            applied,
            subrepo_pr,
            superproject_pr,
            ..
        } => {
            println!(
                "{} issue #{}: {} on '{branch}'",
                "✓".green(),
                issue.number,
                issue.title
            );
            for file in applied {
                let marker = if file.is_written() { "✎" } else { "·" };
                println!("  {marker}  {}", file.path().display());
            }
            println!("  subrepo PR:      {}", subrepo_pr.url);
            println!("  superproject PR: {}", superproject_pr.url);
        }
    }
}

fn print_manual_steps(err: &WorkflowError) {
    if let Some(pr) = err.orphaned_pull_request() {
        eprintln!(
            "{} {} was opened but the superproject pull request was not.",
            "MANUAL INTERVENTION REQUIRED:".red().bold(),
            pr.url
        );
        eprintln!("  Update the submodule reference in the superproject by hand, or close that pull request.");
    }
}

fn print_plan(plan: &Plan, agent: &str) {
    println!("[dry-run] issue #{}: {}", plan.issue.number, plan.issue.title);
    println!("[dry-run] subrepository: {} ({})", plan.ids.subrepo_slug, plan.ids.subrepo_rel.display());
    println!("[dry-run] branch: {}", plan.branch);
    println!();
    println!("subrepo commit:        {}", plan.subrepo.commit);
    println!("subrepo PR title:      {}", plan.subrepo.pr_title);
    println!("superproject commit:   {}", plan.superproject_commit);
    println!("superproject PR title: {}", plan.superproject_pr_title);
    println!();
    println!("subrepo PR body:");
    for line in plan.subrepo.pr_body.lines() {
        println!("  {line}");
    }
    println!();
    println!("{agent} prompt:");
    for line in plan.prompt.lines() {
        println!("  {line}");
    }
}
