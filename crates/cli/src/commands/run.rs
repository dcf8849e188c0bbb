//! Full lifecycle command

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use tfprobe_harness::{HarnessConfig, Runner};

use crate::output::{print_report, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Append a random suffix to the cluster and resource-group names so
    /// concurrent runs cannot collide
    #[arg(long)]
    pub unique_suffix: bool,

    /// Skip teardown and leave the deployment in place for inspection
    #[arg(long)]
    pub keep: bool,
}

pub async fn execute(args: RunArgs, mut config: HarnessConfig, format: OutputFormat) -> Result<()> {
    if args.unique_suffix {
        config.run = config.run.clone().with_unique_suffix();
    }

    let mut runner = Runner::new(config)?;
    let report = runner.run_with_teardown(!args.keep).await;
    report.write(&runner.config().report_dir())?;

    print_report(&report, format);
    if report.success {
        println!(
            "{} cluster '{}' verified in {} ms",
            "PASSED".green().bold(),
            report.cluster_name,
            report.duration_ms
        );
        if args.keep {
            println!(
                "deployment kept; run 'tfprobe destroy' when you are done with '{}'",
                report.cluster_name
            );
        }
        Ok(())
    } else {
        println!(
            "{} {}",
            "FAILED".red().bold(),
            report.error.as_deref().unwrap_or("unknown error")
        );
        std::process::exit(1);
    }
}
