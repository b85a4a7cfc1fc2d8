// ABOUTME: Execution channel contract for running commands on a target host.
// ABOUTME: Implementations must report output, exit code, and timeouts faithfully.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Output from a remote command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: u32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout and stderr merged for log capture, trimmed of trailing newlines.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

/// Errors from the execution channel itself.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command exceeded the configured timeout. Any output captured
    /// before the deadline is preserved.
    #[error("command timed out after {elapsed:?}")]
    Timeout {
        elapsed: Duration,
        partial_output: String,
    },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("command execution failed: {0}")]
    CommandFailed(String),

    #[error("channel closed unexpectedly without exit status")]
    ChannelClosed,
}

/// Executes commands on a target host over one logical session.
///
/// The transport (SSH, local process) is a collaborator; the engine only
/// requires that it honor this contract: captured output, a real exit code,
/// and timeouts reported as [`ExecError::Timeout`] with partial output.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<CommandOutput, ExecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_merges_streams() {
        let output = CommandOutput {
            exit_code: 1,
            stdout: "building\n".to_string(),
            stderr: "warning: cache miss\n".to_string(),
        };
        assert_eq!(output.combined(), "building\nwarning: cache miss");
    }

    #[test]
    fn combined_with_empty_stderr() {
        let output = CommandOutput {
            exit_code: 0,
            stdout: "ok\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.combined(), "ok");
    }
}
