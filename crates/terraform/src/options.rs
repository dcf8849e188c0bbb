//! Invocation options for the wrapped binary.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::retry::{default_retryable_errors, RetryableError};

/// Options carried by every invocation of the binary.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory containing the module; state files land here too.
    pub dir: PathBuf,
    /// Binary name or absolute path.
    pub binary: String,
    /// Input variables passed as `-var` arguments.
    pub vars: BTreeMap<String, Value>,
    /// Extra environment for the subprocess.
    pub env: BTreeMap<String, String>,
    /// Maximum retry attempts after a transient failure.
    pub max_retries: u32,
    /// Pause between retry attempts.
    pub time_between_retries: Duration,
    /// Output patterns classified as transient.
    pub retryable_errors: Vec<RetryableError>,
}

impl Options {
    /// Options for `dir` with the standard transient-error classification:
    /// three retries, five seconds apart.
    pub fn with_default_retryable_errors(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            binary: "terraform".to_string(),
            vars: BTreeMap::new(),
            env: BTreeMap::new(),
            max_retries: 3,
            time_between_retries: Duration::from_secs(5),
            retryable_errors: default_retryable_errors(),
        }
    }

    pub fn with_vars(mut self, vars: BTreeMap<String, Value>) -> Self {
        self.vars = vars;
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// `-var name=value` argument pairs for every configured variable, in
    /// name order so invocations are reproducible.
    pub fn var_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.vars.len() * 2);
        for (name, value) in &self.vars {
            args.push("-var".to_string());
            args.push(format!("{}={}", name, hcl_literal(value)));
        }
        args
    }
}

/// Render a JSON value as a literal the binary accepts on the command line.
///
/// Strings are quoted and escaped; maps and lists use the brace and bracket
/// forms `{k="v",n=1}` and `["a","b"]`.
pub fn hcl_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(hcl_literal).collect();
            format!("[{}]", rendered.join(","))
        }
        Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}={}", key, hcl_literal(value)))
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
