//! Local artifact sweep command

use anyhow::Result;

use tfprobe_common::fsutil;
use tfprobe_harness::HarnessConfig;

use crate::output::{print_message, OutputFormat};

pub fn execute(config: HarnessConfig, format: OutputFormat) -> Result<()> {
    let removed = fsutil::sweep(&config.work_dir, &config.cleanup.files)?;
    print_message(&format!("removed {} artifact(s)", removed), format);
    Ok(())
}
