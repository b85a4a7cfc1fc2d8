// ABOUTME: Pipeline selection state machine, evaluated exactly once per deployment.
// ABOUTME: Restart-only and pull-request flows take precedence over the build pack tag.

use crate::model::{ApplicationSpec, BuildPack, DeploymentRequest};

use super::action::DeploymentAction;
use super::context::DeploymentContext;
use super::error::{DeployError, Result};
use super::strategies::{
    DeployCompose, DeployDockerfile, DeployNixpacks, DeployPullRequest, DeployRestart,
    DeployStatic,
};

/// States of the pipeline selection machine. The machine has no cycles and is
/// not resumable mid-flight; a retried deployment re-enters at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    RestartOnly,
    PullRequestFlow,
    Dockerfile,
    Nixpacks,
    DockerCompose,
    DockerImage,
    Static,
    Unsupported,
}

/// Select the pipeline for one deployment request.
///
/// Precedence: restart-only (unless the build pack is dockerimage or
/// dockerfile, which always rebuild), then pull-request flow, then the
/// application's declared build pack.
pub fn select_pipeline(
    request: &DeploymentRequest,
    application: &ApplicationSpec,
) -> PipelineState {
    if request.restart_only
        && application.build_pack != BuildPack::DockerImage
        && application.build_pack != BuildPack::Dockerfile
    {
        return PipelineState::RestartOnly;
    }

    if request.is_pull_request() {
        return PipelineState::PullRequestFlow;
    }

    match application.build_pack {
        BuildPack::Dockerfile => PipelineState::Dockerfile,
        BuildPack::Nixpacks => PipelineState::Nixpacks,
        BuildPack::DockerCompose => PipelineState::DockerCompose,
        BuildPack::DockerImage => PipelineState::DockerImage,
        BuildPack::Static => PipelineState::Static,
    }
}

/// Map a selected state to its pipeline. States with no pipeline fail the
/// deployment with a user-visible message instead of silently no-op-ing.
pub fn action_for(state: PipelineState) -> Result<Box<dyn DeploymentAction>> {
    match state {
        PipelineState::RestartOnly => Ok(Box::new(DeployRestart)),
        PipelineState::PullRequestFlow => Ok(Box::new(DeployPullRequest)),
        PipelineState::Dockerfile => Ok(Box::new(DeployDockerfile)),
        PipelineState::Nixpacks => Ok(Box::new(DeployNixpacks)),
        PipelineState::DockerCompose => Ok(Box::new(DeployCompose)),
        PipelineState::Static => Ok(Box::new(DeployStatic)),
        PipelineState::DockerImage => Err(DeployError::UnsupportedStrategy(
            "docker image deployment is not supported yet".to_string(),
        )),
        PipelineState::Idle | PipelineState::Unsupported => Err(DeployError::UnsupportedStrategy(
            "no pipeline matches this deployment request".to_string(),
        )),
    }
}

/// Select and run the pipeline for the context's request.
pub async fn dispatch(ctx: &mut DeploymentContext) -> Result<()> {
    let state = select_pipeline(&ctx.request, &ctx.application);
    let action = match action_for(state) {
        Ok(action) => action,
        Err(err) => {
            ctx.logs.push(err.to_string());
            return Err(err);
        }
    };
    action.run(ctx).await
}
