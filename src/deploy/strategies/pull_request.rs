// ABOUTME: Preview pipeline wrapping the concrete strategy for the application's build pack.
// ABOUTME: Tags images with the PR id and keeps the hosting collaborator informed.

use async_trait::async_trait;

use crate::deploy::action::DeploymentAction;
use crate::deploy::context::DeploymentContext;
use crate::deploy::error::{DeployError, Result};
use crate::deploy::steps;
use crate::model::BuildPack;
use crate::notify::PullRequestStatus;

use super::compose::DeployCompose;
use super::dockerfile::DeployDockerfile;
use super::nixpacks::DeployNixpacks;

pub struct DeployPullRequest;

#[async_trait]
impl DeploymentAction for DeployPullRequest {
    async fn prepare(&self, ctx: &mut DeploymentContext) -> Result<()> {
        let pull_request_id = ctx.request.pull_request_id;
        ctx.logs.push(format!(
            "Starting pull request (#{pull_request_id}) deployment of {}:{} to {}.",
            ctx.application.repository(),
            ctx.application.git_branch,
            ctx.server.name
        ));

        steps::prepare_builder_image(ctx).await
    }

    async fn run(&self, ctx: &mut DeploymentContext) -> Result<()> {
        let pull_request_id = ctx.request.pull_request_id;
        let preview_url = ctx.application.preview_fqdn(pull_request_id);

        ctx.notifier()
            .pull_request_status(
                &ctx.application,
                &ctx.request.deployment_id,
                pull_request_id,
                preview_url.as_deref(),
                PullRequestStatus::InProgress,
            )
            .await;

        if ctx.application.build_pack == BuildPack::Dockerfile {
            if let Some(location) = ctx.application.dockerfile_location.clone() {
                ctx.result.dockerfile_location_override = Some(location);
            }
        }

        // Compose applications delegate the whole preview run.
        if ctx.application.build_pack == BuildPack::DockerCompose {
            return DeployCompose.run(ctx).await;
        }

        ctx.result.new_version_healthy = true;
        ctx.result.image_names = Some(self.generate_image_names(ctx));

        self.prepare(ctx).await?;
        steps::check_git_if_build_needed(ctx).await?;
        steps::clone_repository(ctx).await?;
        steps::cleanup_git(ctx).await?;

        if ctx.application.build_pack == BuildPack::Nixpacks {
            steps::generate_nixpacks_configs(ctx).await?;
        }

        steps::generate_compose_file(ctx).await?;

        self.build_image(ctx).await?;
        steps::push_to_registry(ctx).await?;
        steps::rolling_update(ctx).await
    }

    async fn build_image(&self, ctx: &mut DeploymentContext) -> Result<()> {
        ctx.logs.push("Building docker image started.".to_string());
        ctx.logs
            .push("To check the current progress, open the debug log.".to_string());

        match ctx.application.build_pack {
            BuildPack::Dockerfile => DeployDockerfile.build_image(ctx).await,
            BuildPack::Nixpacks => DeployNixpacks.build_image(ctx).await,
            BuildPack::DockerCompose => DeployCompose.build_image(ctx).await,
            other => Err(DeployError::UnsupportedStrategy(format!(
                "pull request deployment for build pack {other}"
            ))),
        }
    }
}
