//! Driving the binary: init, apply, destroy, and output reads.

use std::io::ErrorKind;
use std::time::Instant;

use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{TerraformError, TerraformResult};
use crate::options::Options;
use crate::retry::classify;

/// Captured result of one invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout and stderr concatenated, for error classification and
    /// reporting.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Wrapper around the installed binary, carrying per-run options.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    options: Options,
}

impl TerraformCli {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Verify the binary is runnable at all.
    pub async fn check_installed(&self) -> TerraformResult<()> {
        let output = self.run_once(&["version".to_string()]).await?;
        if output.success() {
            Ok(())
        } else {
            Err(TerraformError::BinaryNotFound(self.options.binary.clone()))
        }
    }

    pub async fn init(&self) -> TerraformResult<CommandOutput> {
        let args = vec![
            "init".to_string(),
            "-input=false".to_string(),
            "-no-color".to_string(),
        ];
        self.run_with_retry("init", args).await
    }

    pub async fn apply(&self) -> TerraformResult<CommandOutput> {
        let mut args = vec![
            "apply".to_string(),
            "-input=false".to_string(),
            "-auto-approve".to_string(),
            "-no-color".to_string(),
        ];
        args.extend(self.options.var_args());
        self.run_with_retry("apply", args).await
    }

    /// `init` followed by `apply`.
    pub async fn init_and_apply(&self) -> TerraformResult<CommandOutput> {
        self.init().await?;
        self.apply().await
    }

    /// Destroy everything the state file knows about. Variables are passed
    /// so the module evaluates the same way it did at apply time.
    pub async fn destroy(&self) -> TerraformResult<CommandOutput> {
        let mut args = vec![
            "destroy".to_string(),
            "-input=false".to_string(),
            "-auto-approve".to_string(),
            "-no-color".to_string(),
        ];
        args.extend(self.options.var_args());
        self.run_with_retry("destroy", args).await
    }

    /// Read a single output value as a raw string, trailing newline
    /// stripped.
    pub async fn output(&self, name: &str) -> TerraformResult<String> {
        let args = vec![
            "output".to_string(),
            "-no-color".to_string(),
            "-raw".to_string(),
            name.to_string(),
        ];
        let output = self.run_once(&args).await?;
        if !output.success() {
            return Err(TerraformError::OutputMissing {
                name: name.to_string(),
                detail: tail(&output.combined(), 400),
            });
        }
        Ok(output.stdout.trim_end_matches('\n').to_string())
    }

    /// Run `op`, retrying while the failure output matches the transient
    /// table and the retry budget lasts.
    async fn run_with_retry(
        &self,
        op: &'static str,
        args: Vec<String>,
    ) -> TerraformResult<CommandOutput> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let output = self.run_once(&args).await?;
            if output.success() {
                return Ok(output);
            }
            let combined = output.combined();
            match classify(&self.options.retryable_errors, &combined) {
                Some(retryable) if attempt <= self.options.max_retries => {
                    warn!(
                        "{} hit a transient failure ({}); retrying in {:?} (attempt {}/{})",
                        op,
                        retryable.description,
                        self.options.time_between_retries,
                        attempt,
                        self.options.max_retries
                    );
                    sleep(self.options.time_between_retries).await;
                }
                _ => {
                    return Err(TerraformError::CommandFailed {
                        op,
                        exit_code: output.exit_code,
                        output: tail(&combined, 2000),
                    });
                }
            }
        }
    }

    async fn run_once(&self, args: &[String]) -> TerraformResult<CommandOutput> {
        debug!("running {} {}", self.options.binary, args.join(" "));
        let start = Instant::now();
        let mut command = Command::new(&self.options.binary);
        command
            .args(args)
            .current_dir(&self.options.dir)
            .env("TF_IN_AUTOMATION", "1");
        for (key, value) in &self.options.env {
            command.env(key, value);
        }
        let output = command.output().await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                TerraformError::BinaryNotFound(self.options.binary.clone())
            } else {
                TerraformError::Io(err)
            }
        })?;
        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            "{} {} finished in {:?} with exit code {}",
            self.options.binary,
            args.first().map(String::as_str).unwrap_or(""),
            start.elapsed(),
            result.exit_code
        );
        Ok(result)
    }
}

/// Last `max` characters of `s`, trimmed. Failure output can run to many
/// screens; reports only need the end of it.
fn tail(s: &str, max: usize) -> String {
    let trimmed = s.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= max {
        trimmed.to_string()
    } else {
        chars[chars.len() - max..].iter().collect()
    }
}
