//! Configuration file commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use tfprobe_harness::HarnessConfig;

use crate::output::print_success;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file if none exists
    Init,

    /// Print the effective configuration as TOML
    Show,
}

pub fn execute(cmd: ConfigCommands, path: &Path, config: HarnessConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Init => {
            if path.exists() {
                println!("{} already exists, leaving untouched", path.display());
            } else {
                HarnessConfig::default().save(path)?;
                print_success(&format!("wrote {}", path.display()));
            }
        }
        ConfigCommands::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
