// ABOUTME: Pipeline for applications carrying an inline Dockerfile.
// ABOUTME: Writes the decoded Dockerfile into the build context and builds directly.

use async_trait::async_trait;

use crate::deploy::action::DeploymentAction;
use crate::deploy::context::DeploymentContext;
use crate::deploy::error::{DeployError, Result};
use crate::deploy::steps;

pub struct DeployDockerfile;

impl DeployDockerfile {
    /// Inline Dockerfile content, with build env vars injected as ARG lines.
    fn rendered_dockerfile(ctx: &DeploymentContext) -> Result<String> {
        let content = ctx
            .application
            .dockerfile
            .as_deref()
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                DeployError::Setup("application has no Dockerfile content".to_string())
            })?;

        let env = steps::generate_build_env(ctx);
        Ok(steps::add_build_env_to_dockerfile(content, &env))
    }
}

#[async_trait]
impl DeploymentAction for DeployDockerfile {
    async fn prepare(&self, ctx: &mut DeploymentContext) -> Result<()> {
        // Validates content before any remote command executes.
        Self::rendered_dockerfile(ctx)?;

        ctx.logs.push(format!(
            "Starting deployment of {} to {}.",
            ctx.application.name, ctx.server.name
        ));

        steps::prepare_builder_image(ctx).await
    }

    async fn run(&self, ctx: &mut DeploymentContext) -> Result<()> {
        self.prepare(ctx).await?;
        ctx.result.image_names = Some(self.generate_image_names(ctx));

        steps::generate_compose_file(ctx).await?;
        self.build_image(ctx).await?;
        steps::push_to_registry(ctx).await?;
        steps::rolling_update(ctx).await
    }

    async fn build_image(&self, ctx: &mut DeploymentContext) -> Result<()> {
        ctx.logs.push("Building docker image started.".to_string());

        let names = ctx
            .result
            .image_names
            .clone()
            .ok_or_else(|| DeployError::Build("image names not generated".to_string()))?;

        let dockerfile = Self::rendered_dockerfile(ctx)?;
        let dockerfile_path = format!("{}/Dockerfile", ctx.build.work_dir);

        let write = steps::write_file_in_builder(ctx, &dockerfile_path, &dockerfile);
        ctx.execute_and_save(&[write])
            .await
            .map_err(|e| DeployError::Build(e.to_string()))?;

        let build_command = steps::docker_build_command(ctx, &dockerfile_path, &names.production);
        steps::run_docker_build(ctx, &build_command).await?;

        ctx.logs.push("Building docker image completed.".to_string());
        Ok(())
    }
}
