//! tfprobe CLI - Main Entry Point
//!
//! Command-line front end for the harness: run the full lifecycle, verify
//! or destroy an existing deployment, and inspect configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{config, destroy, run, sweep, vars, verify};
use tfprobe_harness::HarnessConfig;

/// tfprobe - integration-test harness for Terraform-provisioned AKS clusters
#[derive(Parser)]
#[command(name = "tfprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "tfprobe.toml", global = true)]
    config: PathBuf,

    /// Working directory holding the module (overrides the config file)
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the cluster, verify it, then tear everything down
    Run(run::RunArgs),

    /// Verify an already-provisioned cluster without touching it
    Verify,

    /// Tear down: terraform destroy, resource-group delete, local sweep
    Destroy,

    /// Remove local run artifacts (state, lock files, kubeconfig, provider file)
    Sweep,

    /// Show the effective run variables
    Vars,

    /// Manage the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let mut harness_config = HarnessConfig::load(&cli.config)?;
    if let Some(work_dir) = cli.work_dir {
        harness_config.work_dir = work_dir;
    }

    match cli.command {
        Commands::Run(args) => run::execute(args, harness_config, cli.format).await?,
        Commands::Verify => verify::execute(harness_config, cli.format).await?,
        Commands::Destroy => destroy::execute(harness_config, cli.format).await?,
        Commands::Sweep => sweep::execute(harness_config, cli.format)?,
        Commands::Vars => vars::execute(harness_config, cli.format)?,
        Commands::Config(cmd) => config::execute(cmd, &cli.config, harness_config)?,
        Commands::Version => {
            println!("tfprobe v{}", tfprobe_common::VERSION);
            println!("Integration-test harness for Terraform-provisioned AKS clusters");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
