//! Shell-script stand-in for the real binary.
//!
//! The script logs every invocation to `tf-invocations.log` in the working
//! directory, materializes the artifacts a real run would leave behind
//! (state file, lock file, `.terraform/`), and serves a canned kubeconfig
//! from `output`. `destroy` insists on the state file being present, which
//! is exactly what makes teardown-ordering bugs visible in tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Behavior knobs for the generated script.
#[derive(Debug, Clone)]
pub struct FakeTerraform {
    /// Times `apply` fails with a transient-looking error before it
    /// succeeds.
    pub apply_transient_failures: u32,
    /// When set, `apply` always fails with this message.
    pub apply_error: Option<String>,
    /// Value printed for `output admin_kube_config`.
    pub kubeconfig: String,
}

impl Default for FakeTerraform {
    fn default() -> Self {
        Self {
            apply_transient_failures: 0,
            apply_error: None,
            kubeconfig: SAMPLE_KUBECONFIG.to_string(),
        }
    }
}

impl FakeTerraform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transient_apply_failures(failures: u32) -> Self {
        Self {
            apply_transient_failures: failures,
            ..Self::default()
        }
    }

    pub fn with_apply_error(message: &str) -> Self {
        Self {
            apply_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Write the script into `dir` and return the binary path.
    pub fn install(&self, dir: &Path) -> PathBuf {
        fs::create_dir_all(dir).expect("create fake terraform dir");
        let path = dir.join("terraform");
        fs::write(&path, self.script()).expect("write fake terraform");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("chmod fake terraform");
        }
        path
    }

    fn script(&self) -> String {
        let apply_failure = match &self.apply_error {
            Some(message) => format!("echo \"Error: {}\" >&2\n    exit 1", message),
            None => format!(
                r#"if [ "$count" -le {} ]; then
      echo "Error: connection reset by peer" >&2
      exit 1
    fi"#,
                self.apply_transient_failures
            ),
        };
        format!(
            r#"#!/bin/sh
cmd="$1"
echo "cmd=$*" >> tf-invocations.log
case "$cmd" in
  version)
    echo "Terraform v1.7.0"
    ;;
  init)
    mkdir -p .terraform
    : > .terraform.lock.hcl
    ;;
  apply)
    count=0
    [ -f .apply-attempts ] && count=$(cat .apply-attempts)
    count=$((count + 1))
    echo "$count" > .apply-attempts
    {apply_failure}
    echo '{{"version": 4}}' > terraform.tfstate
    ;;
  destroy)
    if [ -f terraform.tfstate ]; then
      echo "destroy state=present" >> tf-invocations.log
    else
      echo "destroy state=missing" >> tf-invocations.log
      echo "Error: no state file to destroy" >&2
      exit 1
    fi
    ;;
  output)
    cat <<'EOF_KUBECONFIG'
{kubeconfig}
EOF_KUBECONFIG
    ;;
  *)
    ;;
esac
exit 0
"#,
            apply_failure = apply_failure,
            kubeconfig = self.kubeconfig.trim_end(),
        )
    }
}

/// Minimal kubeconfig; offline tests only move it around as text.
pub const SAMPLE_KUBECONFIG: &str = r#"apiVersion: v1
kind: Config
clusters:
- cluster:
    server: https://127.0.0.1:6443
  name: stub
contexts:
- context:
    cluster: stub
    user: stub-admin
  name: stub
current-context: stub
users:
- name: stub-admin
  user:
    token: stub-token"#;
