// ABOUTME: Static-site pipeline: embeds the source tree into a web-server image.
// ABOUTME: Reuses an existing image for the resolved tag unless a rebuild is forced.

use async_trait::async_trait;

use crate::deploy::action::DeploymentAction;
use crate::deploy::context::DeploymentContext;
use crate::deploy::error::{DeployError, Result};
use crate::deploy::steps;
use crate::remote::RemoteCommand;

const DEFAULT_STATIC_IMAGE: &str = "nginx:alpine";

const NGINX_CONFIG: &str = r#"server {
    listen       80;
    listen  [::]:80;
    server_name  localhost;

    location / {
        root   /usr/share/nginx/html;
        index  index.html;
        try_files $uri $uri.html $uri/index.html $uri/ /index.html =404;
    }

    error_page   500 502 503 504  /50x.html;
    location = /50x.html {
        root   /usr/share/nginx/html;
    }
}
"#;

pub struct DeployStatic;

impl DeployStatic {
    fn base_image(ctx: &DeploymentContext) -> String {
        ctx.application
            .static_image
            .clone()
            .filter(|image| !image.is_empty())
            .unwrap_or_else(|| DEFAULT_STATIC_IMAGE.to_string())
    }

    /// Minimal image wrapping the cloned source tree behind nginx.
    fn synthesized_dockerfile(ctx: &DeploymentContext) -> String {
        format!(
            "FROM {}\n\
             WORKDIR /usr/share/nginx/html/\n\
             LABEL slipway.deploymentId={}\n\
             COPY . .\n\
             RUN rm -f /usr/share/nginx/html/nginx.conf\n\
             RUN rm -f /usr/share/nginx/html/Dockerfile\n\
             COPY ./nginx.conf /etc/nginx/conf.d/default.conf\n",
            Self::base_image(ctx),
            ctx.request.deployment_id
        )
    }

    async fn pull_latest_image(ctx: &mut DeploymentContext, image: &str) -> Result<()> {
        ctx.logs
            .push(format!("Pulling latest image ({image}) from the registry."));

        let command = steps::exec_in_builder(ctx, &format!("docker pull {image}"));
        ctx.execute_and_save(&[RemoteCommand::new(command).hidden()])
            .await
            .map_err(|e| DeployError::Build(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl DeploymentAction for DeployStatic {
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

        let names = self.generate_image_names(ctx);
        ctx.result.image_names = Some(names.clone());

        if !ctx.build.force_rebuild
            && (steps::image_exists(ctx, &names.production).await?
                || steps::image_exists_in_registry(ctx, &names.production).await?)
        {
            ctx.logs.push(format!(
                "Image {} already exists, skipping build.",
                names.production
            ));
            ctx.result.new_version_healthy = true;
            return Ok(());
        }

        steps::clone_repository(ctx).await?;
        steps::cleanup_git(ctx).await?;
        steps::generate_compose_file(ctx).await?;

        self.build_image(ctx).await?;
        steps::push_to_registry(ctx).await?;
        steps::rolling_update(ctx).await
    }

    async fn build_image(&self, ctx: &mut DeploymentContext) -> Result<()> {
        ctx.logs.push("Building docker image started.".to_string());

        let base_image = Self::base_image(ctx);
        if ctx.application.static_image.is_some() {
            ctx.logs.push(format!("Using static image: {base_image}."));
            Self::pull_latest_image(ctx, &base_image).await?;
        } else {
            ctx.logs
                .push("No static image configured, using the default web server.".to_string());
        }

        let names = ctx
            .result
            .image_names
            .clone()
            .ok_or_else(|| DeployError::Build("image names not generated".to_string()))?;

        let work_dir = ctx.build.work_dir.clone();
        let dockerfile_path = format!("{work_dir}/Dockerfile");
        let writes = [
            steps::write_file_in_builder(ctx, &dockerfile_path, &Self::synthesized_dockerfile(ctx)),
            steps::write_file_in_builder(ctx, &format!("{work_dir}/nginx.conf"), NGINX_CONFIG),
        ];
        ctx.execute_and_save(&writes)
            .await
            .map_err(|e| DeployError::Build(e.to_string()))?;

        let build_command = steps::docker_build_command(ctx, &dockerfile_path, &names.production);
        steps::run_docker_build(ctx, &build_command).await?;

        ctx.logs.push("Building docker image completed.".to_string());
        Ok(())
    }
}
