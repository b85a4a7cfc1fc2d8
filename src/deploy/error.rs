// ABOUTME: Error taxonomy for deployment processing.
// ABOUTME: Stage-level failures propagate to the supervisor; cleanup failures are logged only.

use thiserror::Error;

use crate::remote::RemoteExecutionFailure;

/// Errors that abort a deployment attempt.
///
/// Stage failures abort only the remaining steps of the current pipeline run;
/// the supervisor still executes cleanup and marks the deployment failed.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The target server is not reachable or not usable. Raised before the
    /// deployment ever transitions to in-progress.
    #[error("server {0} is not functional")]
    ServerUnreachable(String),

    /// The request/application combination maps to no supported pipeline.
    #[error("deployment not supported: {0}")]
    UnsupportedStrategy(String),

    /// Prerequisites for the selected strategy are missing.
    #[error("setup failed: {0}")]
    Setup(String),

    /// A remote command sequence failed mid-pipeline.
    #[error(transparent)]
    RemoteExecution(#[from] RemoteExecutionFailure),

    /// Image construction failed; carries the last captured remote output.
    #[error("build failed: {0}")]
    Build(String),

    /// Pushing the image to the registry failed.
    #[error("publish failed: {0}")]
    Publish(String),

    /// Replacing the running container/service failed.
    #[error("rollout failed: {0}")]
    Rollout(String),
}

pub type Result<T> = std::result::Result<T, DeployError>;
