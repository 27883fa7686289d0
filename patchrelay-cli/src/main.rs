//! patchrelay — turn a GitHub issue into paired submodule and superproject
//! pull requests.
//!
//! # Usage
//!
//! ```text
//! patchrelay --submodule <name> --issue <N> [--main-repo owner/name] [--base main]
//!            [--conventions ./conventions.md] [--reviewer handle] [--root <path>]
//!            [--dry-run] [-v]
//! patchrelay config init|show
//! patchrelay runs [--json]
//! patchrelay branch --issue <N>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{branch::BranchArgs, config::ConfigCommand, run::RunArgs, runs::RunsArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "patchrelay",
    version,
    about = "Turn a GitHub issue into paired submodule and superproject pull requests",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage ~/.patchrelay/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// List recorded runs, newest first.
    Runs(RunsArgs),

    /// Print the work branch name derived for an issue.
    Branch(BranchArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Some(Commands::Config { command }) => commands::config::run(command),
        Some(Commands::Runs(args)) => args.run(),
        Some(Commands::Branch(args)) => args.run(),
        None => cli.run.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
