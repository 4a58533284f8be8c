//! Isolated execution of model-authored training scripts.
//!
//! Each script runs in a fresh interpreter process with a cleared
//! environment, CPU and address-space rlimits (Unix), and a wall-clock
//! timeout. Nothing the child does can touch the driver's memory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::ToolError;
use crate::config::SandboxConfig;

const MAX_OUTPUT_CHARS: usize = 10_000;
const PASSTHROUGH_ENV: [&str; 3] = ["PATH", "HOME", "LANG"];

/// Runs scripts against a fixed dataset file.
#[derive(Debug, Clone)]
pub struct CodeRunner {
    config: SandboxConfig,
    workdir: PathBuf,
    dataset_path: PathBuf,
}

impl CodeRunner {
    pub fn new(config: SandboxConfig, workdir: impl Into<PathBuf>, dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            workdir: workdir.into(),
            dataset_path: dataset_path.into(),
        }
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    /// Execute `code` and return its exit code and combined output.
    ///
    /// A script that fails still yields `Ok` with its stderr; only a spawn
    /// failure or a timeout is an error.
    pub async fn run(&self, code: &str) -> Result<String, ToolError> {
        let mut script = tempfile::Builder::new()
            .prefix("automl-train-")
            .suffix(".py")
            .tempfile()
            .map_err(|e| ToolError::Execution(format!("Failed to create script file: {}", e)))?;
        script
            .write_all(code.as_bytes())
            .and_then(|_| script.flush())
            .map_err(|e| ToolError::Execution(format!("Failed to write script file: {}", e)))?;

        let mut cmd = Command::new(&self.config.python_bin);
        cmd.arg(script.path())
            .current_dir(&self.workdir)
            .env_clear()
            .env("DATASET_PATH", &self.dataset_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for key in PASSTHROUGH_ENV {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }

        #[cfg(unix)]
        apply_limits(&mut cmd, self.config.timeout_secs, self.config.memory_limit_mb);

        tracing::info!(
            "Executing training script ({} bytes) with {}",
            code.len(),
            self.config.python_bin
        );

        let output = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), cmd.output())
            .await
            .map_err(|_| {
                ToolError::Execution(format!(
                    "Script timed out after {} seconds",
                    self.config.timeout_secs
                ))
            })?
            .map_err(|e| {
                ToolError::Execution(format!(
                    "Failed to start {}: {}",
                    self.config.python_bin, e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut result = format!("Exit code: {}\n", exit_code);

        if !stdout.is_empty() {
            result.push_str("\n--- stdout ---\n");
            result.push_str(&stdout);
        }

        if !stderr.is_empty() {
            result.push_str("\n--- stderr ---\n");
            result.push_str(&stderr);
        }

        Ok(truncate_output(result, MAX_OUTPUT_CHARS))
    }
}

fn truncate_output(mut text: String, max_len: usize) -> String {
    if text.len() <= max_len {
        return text;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("\n... [output truncated]");
    text
}

#[cfg(unix)]
fn apply_limits(cmd: &mut Command, cpu_secs: u64, memory_limit_mb: u64) {
    // SAFETY: the hook runs between fork and exec and only calls setrlimit,
    // which is async-signal-safe.
    unsafe {
        cmd.pre_exec(move || limit_child(cpu_secs, memory_limit_mb));
    }
}

#[cfg(unix)]
fn limit_child(cpu_secs: u64, memory_limit_mb: u64) -> std::io::Result<()> {
    let cpu = libc::rlimit {
        rlim_cur: cpu_secs as libc::rlim_t,
        rlim_max: cpu_secs as libc::rlim_t,
    };
    // SAFETY: `cpu` is a valid rlimit for the duration of the call.
    if unsafe { libc::setrlimit(libc::RLIMIT_CPU, &cpu) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    if memory_limit_mb > 0 {
        let bytes = memory_limit_mb.saturating_mul(1024 * 1024) as libc::rlim_t;
        let memory = libc::rlimit {
            rlim_cur: bytes,
            rlim_max: bytes,
        };
        // SAFETY: as above.
        if unsafe { libc::setrlimit(libc::RLIMIT_AS, &memory) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(bin: &str, timeout_secs: u64) -> CodeRunner {
        CodeRunner::new(
            SandboxConfig {
                python_bin: bin.to_string(),
                timeout_secs,
                memory_limit_mb: 0,
            },
            std::env::temp_dir(),
            "/tmp/engineered_data.csv",
        )
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        let out = truncate_output(text, 5);
        assert!(out.starts_with("éé"));
        assert!(out.ends_with("[output truncated]"));
    }

    #[test]
    fn short_output_untouched() {
        assert_eq!(truncate_output("ok".to_string(), 10), "ok");
    }

    #[tokio::test]
    async fn missing_interpreter_is_an_execution_error() {
        let err = runner("definitely-not-a-python-binary", 5)
            .run("print('hi')")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
        assert!(err.to_string().starts_with("Failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output_and_exit_code() {
        // `sh` stands in for the interpreter: it runs the script file it is given.
        let out = runner("sh", 10)
            .run("echo \"Accuracy: 0.75\"\necho \"dataset=$DATASET_PATH\"\necho oops >&2\nexit 3\n")
            .await
            .unwrap();
        assert!(out.starts_with("Exit code: 3\n"));
        assert!(out.contains("Accuracy: 0.75"));
        assert!(out.contains("dataset=/tmp/engineered_data.csv"));
        assert!(out.contains("--- stderr ---\noops"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn times_out() {
        let err = runner("sh", 1).run("sleep 5\n").await.unwrap_err();
        assert_eq!(err.to_string(), "Script timed out after 1 seconds");
    }
}
