// ABOUTME: Remote command execution: value objects, executor contract, sequence runner.
// ABOUTME: The SSH transport is one implementation of the CommandExecutor seam.

mod command;
mod executor;
mod sequence;
mod ssh;

pub use command::RemoteCommand;
pub use executor::{CommandExecutor, CommandOutput, ExecError};
pub use sequence::{RemoteExecutionFailure, TIMEOUT_EXIT_CODE, execute_and_save};
pub use ssh::{SshConfig, SshExecutor};
