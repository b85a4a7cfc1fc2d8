// ABOUTME: Top-level driver for one deployment attempt.
// ABOUTME: Health gate, status transitions, dispatch, post-deployment, mandatory cleanup.

use tracing::{debug, warn};

use crate::model::DeploymentStatus;
use crate::notify::PullRequestStatus;
use crate::remote::RemoteCommand;

use super::context::DeploymentContext;
use super::dispatch;
use super::error::{DeployError, Result};

/// Drives a deployment request to a terminal status.
///
/// Preconditions (owned by the external scheduler, documented here): at most
/// one deployment per application runs at a time, and re-invocation for the
/// same request id is only safe if the prior attempt failed before reaching
/// in-progress cleanup.
pub struct Supervisor;

impl Supervisor {
    /// Run one attempt end to end. Cleanup and the status-changed signal run
    /// exactly once, regardless of outcome.
    pub async fn handle(ctx: &mut DeploymentContext) -> Result<()> {
        let outcome = Self::handle_inner(ctx).await;

        Self::cleanup_container(ctx).await;
        ctx.notifier()
            .application_status_changed(&ctx.application.uuid)
            .await;

        outcome
    }

    async fn handle_inner(ctx: &mut DeploymentContext) -> Result<()> {
        if !ctx.server.is_functional() {
            ctx.logs.push("Server is not functional.".to_string());
            ctx.request.status.set(DeploymentStatus::Failed);
            return Err(DeployError::ServerUnreachable(ctx.server.name.clone()));
        }

        // Cancellation checkpoint: an external actor may have cancelled the
        // request while it sat in the queue.
        if ctx.request.status.get() == DeploymentStatus::CancelledByUser {
            ctx.logs.push("Deployment cancelled by user.".to_string());
            return Ok(());
        }

        ctx.request.status.set(DeploymentStatus::InProgress);

        match dispatch::dispatch(ctx).await {
            Ok(()) => Self::post_deployment(ctx).await,
            Err(err) => {
                Self::report_failure(ctx, &err).await;
                Err(err)
            }
        }
    }

    async fn post_deployment(ctx: &mut DeploymentContext) -> Result<()> {
        // Container status polling is an external collaborator; signal only.
        debug!(
            server = %ctx.server.name,
            "requesting container status refresh"
        );

        if !ctx.request.only_this_server {
            Self::deploy_to_additional_destinations(ctx);
        }

        let url = ctx.deployment_url();

        // Finished must not overwrite a concurrent cancel or failure.
        if ctx.request.status.set(DeploymentStatus::Finished) {
            ctx.logs.push("Deployment finished.".to_string());
            ctx.notifier()
                .deployment_success(&ctx.application, &ctx.request.deployment_id, url.as_deref())
                .await;
        }

        if ctx.request.is_pull_request() {
            ctx.notifier()
                .pull_request_status(
                    &ctx.application,
                    &ctx.request.deployment_id,
                    ctx.request.pull_request_id,
                    url.as_deref(),
                    PullRequestStatus::Finished,
                )
                .await;
        }

        Self::run_post_deployment_command(ctx).await
    }

    async fn run_post_deployment_command(ctx: &mut DeploymentContext) -> Result<()> {
        let Some(command) = ctx.application.post_deployment_command.clone() else {
            return Ok(());
        };
        if command.trim().is_empty() {
            return Ok(());
        }

        // Surfaced as a failure rather than silently skipped.
        let err =
            DeployError::UnsupportedStrategy("post-deployment command is not supported yet".into());
        Self::report_failure(ctx, &err).await;
        Err(err)
    }

    fn deploy_to_additional_destinations(ctx: &mut DeploymentContext) {
        // Additional destinations are not deployed to yet; record the intent.
        debug!(
            application = %ctx.application.uuid,
            "additional destination rollout requested, not yet supported"
        );
    }

    /// One well-formed failure report: log line, sticky status, PR status
    /// update when applicable, and a single notifier call carrying the
    /// application, deployment id, and deployment URL.
    async fn report_failure(ctx: &mut DeploymentContext, err: &DeployError) {
        ctx.logs.push(format!("Deployment failed: {err}"));
        ctx.request.status.set(DeploymentStatus::Failed);

        let url = ctx.deployment_url();

        if ctx.request.is_pull_request() {
            ctx.notifier()
                .pull_request_status(
                    &ctx.application,
                    &ctx.request.deployment_id,
                    ctx.request.pull_request_id,
                    url.as_deref(),
                    PullRequestStatus::Finished,
                )
                .await;
        }

        ctx.notifier()
            .deployment_failed(&ctx.application, &ctx.request.deployment_id, url.as_deref())
            .await;
    }

    /// Best-effort removal of the builder container holding the deployment
    /// id. Runs exactly once per attempt; failures are logged, never raised,
    /// as the platform relies on this to avoid orphaned containers.
    async fn cleanup_container(ctx: &mut DeploymentContext) {
        let command = RemoteCommand::new(format!(
            "docker rm -f {} >/dev/null 2>&1",
            ctx.request.deployment_id
        ))
        .hidden()
        .ignore_errors();

        if let Err(e) = ctx.execute_and_save(&[command]).await {
            warn!(deployment = %ctx.request.deployment_id, error = %e, "container cleanup failed");
            ctx.logs.push_hidden(format!("Container cleanup failed: {e}"));
        }
    }
}
