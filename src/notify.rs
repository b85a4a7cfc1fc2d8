// ABOUTME: Fire-and-forget notification seam for deployment lifecycle events.
// ABOUTME: Default implementation reports through the tracing log only.

use async_trait::async_trait;

use crate::model::ApplicationSpec;
use crate::types::{ApplicationId, DeploymentId};

/// Pull-request check status reported to the hosting collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestStatus {
    InProgress,
    Finished,
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullRequestStatus::InProgress => write!(f, "in_progress"),
            PullRequestStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Notification collaborator. All calls are fire-and-forget: implementations
/// swallow their own delivery failures, the pipeline never blocks on them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deployment_success(
        &self,
        application: &ApplicationSpec,
        deployment_id: &DeploymentId,
        url: Option<&str>,
    );

    async fn deployment_failed(
        &self,
        application: &ApplicationSpec,
        deployment_id: &DeploymentId,
        url: Option<&str>,
    );

    async fn pull_request_status(
        &self,
        application: &ApplicationSpec,
        deployment_id: &DeploymentId,
        pull_request_id: u64,
        preview_url: Option<&str>,
        status: PullRequestStatus,
    );

    /// Emitted once per attempt, regardless of outcome.
    async fn application_status_changed(&self, application_id: &ApplicationId);
}

/// Notifier that only writes to the tracing log. Used by the CLI and as a
/// stand-in where no delivery channel is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deployment_success(
        &self,
        application: &ApplicationSpec,
        deployment_id: &DeploymentId,
        url: Option<&str>,
    ) {
        tracing::info!(
            application = %application.name,
            deployment = %deployment_id,
            url = url.unwrap_or("-"),
            "deployment succeeded"
        );
    }

    async fn deployment_failed(
        &self,
        application: &ApplicationSpec,
        deployment_id: &DeploymentId,
        url: Option<&str>,
    ) {
        tracing::warn!(
            application = %application.name,
            deployment = %deployment_id,
            url = url.unwrap_or("-"),
            "deployment failed"
        );
    }

    async fn pull_request_status(
        &self,
        application: &ApplicationSpec,
        deployment_id: &DeploymentId,
        pull_request_id: u64,
        preview_url: Option<&str>,
        status: PullRequestStatus,
    ) {
        tracing::info!(
            application = %application.name,
            deployment = %deployment_id,
            pull_request = pull_request_id,
            preview = preview_url.unwrap_or("-"),
            %status,
            "pull request status update"
        );
    }

    async fn application_status_changed(&self, application_id: &ApplicationId) {
        tracing::debug!(application = %application_id, "application status changed");
    }
}
