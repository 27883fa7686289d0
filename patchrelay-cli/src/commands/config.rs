//! `patchrelay config init` and `patchrelay config show`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use patchrelay_core::config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write the default config file if none exists.
    Init,

    /// Print the effective configuration as YAML.
    Show,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    let home = config::home().context("could not determine home directory")?;
    let path = config::config_path_at(&home);
    match cmd {
        ConfigCommand::Init => {
            let (_, created) = config::init_at(&home).context("failed to write config")?;
            if created {
                println!("{} wrote {}", "✓".green(), path.display());
            } else {
                println!("{} already exists; left unchanged", path.display());
            }
        }
        ConfigCommand::Show => {
            let cfg = config::load_at(&home).context("failed to load config")?;
            let yaml = serde_yaml::to_string(&cfg).context("failed to serialize config")?;
            if !path.exists() {
                println!("# {} not found; showing defaults", path.display());
            }
            print!("{yaml}");
        }
    }
    Ok(())
}
