// ABOUTME: Buildpack pipeline: clones the source and lets nixpacks detect the runtime.
// ABOUTME: The detected plan drives the image build inside the builder container.

use async_trait::async_trait;

use crate::deploy::action::DeploymentAction;
use crate::deploy::context::DeploymentContext;
use crate::deploy::error::{DeployError, Result};
use crate::deploy::steps;

pub struct DeployNixpacks;

#[async_trait]
impl DeploymentAction for DeployNixpacks {
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
        steps::generate_nixpacks_configs(ctx).await?;
        steps::generate_compose_file(ctx).await?;

        self.build_image(ctx).await?;
        steps::push_to_registry(ctx).await?;
        steps::rolling_update(ctx).await
    }

    async fn build_image(&self, ctx: &mut DeploymentContext) -> Result<()> {
        ctx.logs.push("Building docker image started.".to_string());
        ctx.logs
            .push("To check the current progress, open the debug log.".to_string());

        let names = ctx
            .result
            .image_names
            .clone()
            .ok_or_else(|| DeployError::Build("image names not generated".to_string()))?;

        let env = steps::generate_build_env(ctx);
        let env_args = env
            .iter()
            .map(|(key, value)| format!("--env {key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");

        let build_command = format!(
            "nixpacks build {env_args} --no-error-without-start -n {} {}",
            names.production, ctx.build.work_dir
        );
        steps::run_docker_build(ctx, &build_command).await?;

        ctx.logs.push("Building docker image completed.".to_string());
        Ok(())
    }
}
