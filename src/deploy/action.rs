// ABOUTME: Strategy contract every deployment pipeline variant implements.
// ABOUTME: Delegation between variants goes through this public surface only.

use async_trait::async_trait;

use super::context::{DeploymentContext, ImageNames};
use super::error::Result;
use super::steps;

/// One build strategy's pipeline over a shared deployment context.
///
/// `run` executes the full pipeline end-to-end: prepare builder, resolve
/// source, render build configuration, build, publish, roll out. A failure at
/// any step aborts the remaining steps of `run` but not the supervisor's
/// cleanup phase. No retrying happens here; retry policy belongs to the
/// external scheduler.
#[async_trait]
pub trait DeploymentAction: Send + Sync {
    /// Acquire the builder image, emit the start-of-deployment log line, and
    /// perform strategy-specific setup. Fails with `Setup` when prerequisites
    /// are missing.
    async fn prepare(&self, ctx: &mut DeploymentContext) -> Result<()>;

    /// Execute the full pipeline for this strategy.
    async fn run(&self, ctx: &mut DeploymentContext) -> Result<()>;

    /// Strategy-specific image construction.
    async fn build_image(&self, ctx: &mut DeploymentContext) -> Result<()>;

    /// Deterministic image naming; see [`steps::image_names`] for the
    /// contract. Strategies share one implementation.
    fn generate_image_names(&self, ctx: &DeploymentContext) -> ImageNames {
        steps::image_names(ctx)
    }
}
