//! Command executor: bounded invocation of external OS utilities.
//!
//! Readers never spawn processes directly; they go through [`CommandExecutor`]
//! so tests can substitute canned output (see `mock::MockExecutor`).

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ExecError;

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, returning trimmed stdout on success.
    ///
    /// Stderr is discarded. A non-zero exit, a missing binary and an elapsed
    /// `timeout` are all reported as [`ExecError`]; none of them panic.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, ExecError>;
}

/// Spawns real processes through `tokio::process`.
///
/// Children are spawned with `kill_on_drop`, so a timed-out or abandoned
/// invocation never outlives its timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, ExecError> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ExecError::NotFound {
                    program: program.to_string(),
                },
                _ => ExecError::Spawn {
                    program: program.to_string(),
                    reason: e.to_string(),
                },
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ExecError::Spawn {
                    program: program.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                debug!(program, ?timeout, "command timed out");
                return Err(ExecError::Timeout {
                    program: program.to_string(),
                    timeout,
                });
            }
        };

        if !output.status.success() {
            debug!(program, code = ?output.status.code(), "command failed");
            return Err(ExecError::Failed {
                program: program.to_string(),
                code: output.status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const BOUND: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn captures_trimmed_stdout() {
        let out = SystemExecutor::new()
            .run("echo", &["  hello  "], BOUND)
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let err = SystemExecutor::new()
            .run("definitely-not-a-real-binary-hoststat", &[], BOUND)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::NotFound { .. }));
    }

    #[tokio::test]
    async fn non_zero_exit_is_failed() {
        let err = SystemExecutor::new()
            .run("sh", &["-c", "echo oops >&2; exit 3"], BOUND)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Failed { code: Some(3), .. }));
    }

    #[tokio::test]
    async fn hung_command_times_out() {
        let started = std::time::Instant::now();
        let err = SystemExecutor::new()
            .run("sleep", &["10"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
