// ABOUTME: Restart-only pipeline: re-applies the existing image to the running target.
// ABOUTME: Skips builder, build, and publish entirely.

use async_trait::async_trait;

use crate::deploy::action::DeploymentAction;
use crate::deploy::context::{DeploymentContext, ImageNames};
use crate::deploy::error::{DeployError, Result};
use crate::deploy::steps;

pub struct DeployRestart;

impl DeployRestart {
    /// Image the running container was started from. A restart must re-apply
    /// that exact image; the request's commit may be a symbolic `HEAD` that
    /// was never used as a tag.
    async fn running_image(ctx: &DeploymentContext) -> Result<Option<String>> {
        let name = steps::container_name(ctx);
        let command = format!("docker inspect --format '{{{{.Config.Image}}}}' {name} 2>/dev/null");
        let output = ctx
            .executor()
            .execute(&command)
            .await
            .map_err(|e| DeployError::Setup(format!("failed to inspect {name}: {e}")))?;

        let image = output.stdout.trim().to_string();
        ctx.logs.push_hidden(format!(
            "{command}: {}",
            if image.is_empty() {
                "not running"
            } else {
                image.as_str()
            }
        ));

        if output.success() && !image.is_empty() {
            Ok(Some(image))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl DeploymentAction for DeployRestart {
    async fn prepare(&self, ctx: &mut DeploymentContext) -> Result<()> {
        ctx.logs.push(format!(
            "Restarting {}:{} on {}.",
            ctx.application.repository(),
            ctx.application.git_branch,
            ctx.server.name
        ));
        Ok(())
    }

    async fn run(&self, ctx: &mut DeploymentContext) -> Result<()> {
        self.prepare(ctx).await?;

        let names = match Self::running_image(ctx).await? {
            Some(image) => ImageNames {
                build: format!("{image}-build"),
                production: image,
            },
            // No running container to read the image from; an explicit commit
            // still identifies a concrete tag, a symbolic HEAD does not.
            None if ctx.request.commit != "HEAD" => self.generate_image_names(ctx),
            None => {
                return Err(DeployError::Setup(format!(
                    "no running container {} to restart",
                    steps::container_name(ctx)
                )));
            }
        };
        ctx.result.image_names = Some(names);

        steps::rolling_update(ctx).await
    }

    async fn build_image(&self, ctx: &mut DeploymentContext) -> Result<()> {
        // Nothing to build; the existing production image is re-applied.
        let _ = ctx;
        Ok(())
    }
}
