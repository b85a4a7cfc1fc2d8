// ABOUTME: Ordered execution of a remote command sequence with log capture.
// ABOUTME: Short-circuits on the first non-ignored failure, reporting its index.

use thiserror::Error;
use tracing::debug;

use crate::logs::DeploymentLog;

use super::command::RemoteCommand;
use super::executor::{CommandExecutor, CommandOutput, ExecError};

/// Exit code synthesized for a timed-out command, matching the shell
/// `timeout` convention.
pub const TIMEOUT_EXIT_CODE: u32 = 124;

/// A command in the sequence failed and the remaining commands were skipped.
#[derive(Debug, Error)]
#[error("remote command {index} failed with exit code {exit_code}: {command}")]
pub struct RemoteExecutionFailure {
    /// Position of the failing command within the sequence.
    pub index: usize,
    pub command: String,
    pub exit_code: u32,
    /// Captured output of the failing command (partial on timeout).
    pub output: String,
}

/// Execute an ordered command sequence against one host, appending every
/// command's output to the deployment log.
///
/// Semantics:
/// - commands run strictly in order on the same logical session;
/// - the first non-zero exit aborts the sequence unless that command is
///   marked `ignore_errors`;
/// - `hidden` commands still execute and still short-circuit, but their
///   output goes to the log as a hidden entry and to the debug log only;
/// - a timeout counts as a failure with exit code [`TIMEOUT_EXIT_CODE`] and
///   its partial output preserved.
pub async fn execute_and_save(
    executor: &dyn CommandExecutor,
    commands: &[RemoteCommand],
    logs: &DeploymentLog,
) -> Result<(), RemoteExecutionFailure> {
    for (index, command) in commands.iter().enumerate() {
        let output = match executor.execute(&command.command).await {
            Ok(output) => output,
            Err(ExecError::Timeout {
                elapsed,
                partial_output,
            }) => {
                debug!(command = %command.command, ?elapsed, "remote command timed out");
                CommandOutput {
                    exit_code: TIMEOUT_EXIT_CODE,
                    stdout: partial_output,
                    stderr: format!("command timed out after {elapsed:?}"),
                }
            }
            Err(err) => {
                // Transport-level failure: no exit code ever arrived.
                logs.push_hidden(err.to_string());
                return Err(RemoteExecutionFailure {
                    index,
                    command: command.command.clone(),
                    exit_code: 1,
                    output: err.to_string(),
                });
            }
        };

        let captured = output.combined();

        if command.hidden {
            debug!(command = %command.command, exit_code = output.exit_code, output = %captured, "hidden remote command");
            if !captured.is_empty() {
                logs.push_hidden(captured.clone());
            }
        } else if !captured.is_empty() {
            logs.push(captured.clone());
        }

        if !output.success() && !command.ignore_errors {
            return Err(RemoteExecutionFailure {
                index,
                command: command.command.clone(),
                exit_code: output.exit_code,
                output: captured,
            });
        }
    }

    Ok(())
}
