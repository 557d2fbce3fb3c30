//! Process execution for external inspection tools.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::timeout::{block_on_with_timeout, TimeoutConfig};

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Convert a non-zero exit into [`ScanError::ToolFailed`].
    pub fn into_stdout(self, tool: &str) -> Result<String> {
        if self.success {
            return Ok(self.stdout);
        }
        let message = if self.stderr.trim().is_empty() {
            format!("exit code {:?}", self.exit_code)
        } else {
            self.stderr.trim().to_string()
        };
        Err(ScanError::ToolFailed {
            tool: tool.to_string(),
            message,
        })
    }
}

/// Runs one external program to completion.
///
/// Implementations must map a program that cannot be spawned to
/// [`ScanError::ToolUnavailable`] and an exceeded deadline to
/// [`ScanError::Timeout`].
pub trait ToolRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<ToolOutput>;
}

/// Runs real processes under a per-call deadline.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::timeout::DEFAULT_TIMEOUT_SECONDS))
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> ScanError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ScanError::ToolUnavailable(program.to_string())
    } else {
        ScanError::Io(err)
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<ToolOutput> {
        debug!(program, ?args, "running tool");
        let config = TimeoutConfig::new(0, program).with_duration(self.timeout);

        block_on_with_timeout(config, async {
            let mut command = Command::new(program);
            command
                .args(args)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .stdin(if stdin.is_some() {
                    Stdio::piped()
                } else {
                    Stdio::null()
                })
                .kill_on_drop(true);

            let mut child = command.spawn().map_err(|e| spawn_error(program, e))?;

            // Feed stdin concurrently with draining stdout so large batches
            // cannot fill both pipes.
            let pipe = child.stdin.take();
            let feed = async move {
                if let (Some(mut pipe), Some(input)) = (pipe, stdin) {
                    pipe.write_all(input.as_bytes()).await?;
                    pipe.shutdown().await?;
                }
                Ok::<(), std::io::Error>(())
            };
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            let output = output?;
            if let Err(err) = fed {
                // A tool that exits early closes its stdin; its exit status tells the story.
                debug!(program, error = %err, "stdin feed interrupted");
            }

            Ok::<_, ScanError>(ToolOutput {
                success: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}
