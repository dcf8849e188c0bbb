//! Standalone verification command

use anyhow::Result;

use tfprobe_harness::{HarnessConfig, Runner};

use crate::output::{print_error, print_list, print_success, OutputFormat};

pub async fn execute(config: HarnessConfig, format: OutputFormat) -> Result<()> {
    let cluster_name = config.run.cluster_name();
    let runner = Runner::new(config)?;

    match runner.verify_only().await {
        Ok(checks) => {
            print_list(&checks, format);
            print_success(&format!("cluster '{}' verified", cluster_name));
            Ok(())
        }
        Err(err) => {
            print_error(&format!("verification of '{}' failed: {}", cluster_name, err));
            std::process::exit(1);
        }
    }
}
