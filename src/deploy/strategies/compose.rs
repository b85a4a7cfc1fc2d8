// ABOUTME: Pipeline for repositories that ship their own compose descriptor.
// ABOUTME: Builds and rolls out through docker compose instead of a single Dockerfile.

use async_trait::async_trait;

use crate::deploy::action::DeploymentAction;
use crate::deploy::context::DeploymentContext;
use crate::deploy::error::{DeployError, Result};
use crate::deploy::steps;
use crate::remote::RemoteCommand;

pub struct DeployCompose;

impl DeployCompose {
    /// Location of the repository-provided compose descriptor, honoring the
    /// pull-request flow's Dockerfile location override.
    fn compose_file(ctx: &DeploymentContext) -> String {
        let location = ctx
            .result
            .dockerfile_location_override
            .clone()
            .or_else(|| ctx.application.dockerfile_location.clone())
            .unwrap_or_else(|| "docker-compose.yml".to_string());
        format!("{}/{}", ctx.build.work_dir, location.trim_start_matches('/'))
    }
}

#[async_trait]
impl DeploymentAction for DeployCompose {
    async fn prepare(&self, ctx: &mut DeploymentContext) -> Result<()> {
        ctx.logs.push(format!(
            "Starting deployment of {}:{} to {}.",
            ctx.application.repository(),
            ctx.application.git_branch,
            ctx.server.name
        ));

        steps::prepare_builder_image(ctx).await
    }

    async fn run(&self, ctx: &mut DeploymentContext) -> Result<()> {
        self.prepare(ctx).await?;
        steps::check_git_if_build_needed(ctx).await?;
        ctx.result.image_names = Some(self.generate_image_names(ctx));

        steps::clone_repository(ctx).await?;
        steps::cleanup_git(ctx).await?;

        self.build_image(ctx).await?;

        // Roll out through compose so dependent services come up together.
        ctx.logs.push("Rolling update started.".to_string());
        let up = steps::exec_in_builder(
            ctx,
            &format!(
                "docker compose --project-directory {} -f {} up -d",
                ctx.build.work_dir,
                Self::compose_file(ctx)
            ),
        );
        ctx.execute_and_save(&[RemoteCommand::new(up).hidden()])
            .await
            .map_err(|e| DeployError::Rollout(e.to_string()))?;

        ctx.result.new_version_healthy = true;
        ctx.logs.push("Rolling update completed.".to_string());
        Ok(())
    }

    async fn build_image(&self, ctx: &mut DeploymentContext) -> Result<()> {
        ctx.logs.push("Building docker images started.".to_string());

        let build = format!(
            "docker compose --project-directory {} -f {} build --progress plain",
            ctx.build.work_dir,
            Self::compose_file(ctx)
        );
        steps::run_docker_build(ctx, &build).await?;

        ctx.logs.push("Building docker images completed.".to_string());
        Ok(())
    }
}
