//! Teardown command for kept or crashed deployments

use anyhow::Result;

use tfprobe_common::teardown::first_failure;
use tfprobe_harness::{HarnessConfig, Runner};

use crate::output::{print_error, print_list, print_success, OutputFormat};

pub async fn execute(config: HarnessConfig, format: OutputFormat) -> Result<()> {
    let runner = Runner::new(config)?;
    let outcomes = runner.destroy_only().await;

    print_list(&outcomes, format);
    match first_failure(&outcomes) {
        None => {
            print_success("teardown complete");
            Ok(())
        }
        Some(failed) => {
            print_error(&format!(
                "teardown action '{}' failed: {}",
                failed.label,
                failed.error.as_deref().unwrap_or("unknown error")
            ));
            std::process::exit(1);
        }
    }
}
