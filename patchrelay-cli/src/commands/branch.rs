//! `patchrelay branch --issue <N>`

use anyhow::{bail, Result};
use clap::Args;

use patchrelay_core::{BranchName, IssueNumber};

#[derive(Args, Debug)]
pub struct BranchArgs {
    /// Issue number.
    #[arg(long, value_name = "N")]
    pub issue: u64,
}

impl BranchArgs {
    pub fn run(self) -> Result<()> {
        if self.issue == 0 {
            bail!("issue number must be a positive integer");
        }
        println!("{}", BranchName::for_issue(IssueNumber(self.issue)));
        Ok(())
    }
}
