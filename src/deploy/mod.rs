// ABOUTME: The deployment engine core: context, strategies, dispatcher, supervisor.
// ABOUTME: Exports the strategy contract and the per-attempt orchestration entry point.

mod action;
mod context;
mod dispatch;
mod error;
mod steps;
mod strategies;
mod supervisor;

pub use action::DeploymentAction;
pub use context::{
    BuildConfig, DEFAULT_HELPER_IMAGE, DeploymentContext, DeploymentResult, ImageNames,
};
pub use dispatch::{PipelineState, action_for, dispatch, select_pipeline};
pub use error::DeployError;
pub use steps::image_names;
pub use strategies::{
    DeployCompose, DeployDockerfile, DeployNixpacks, DeployPullRequest, DeployRestart,
    DeployStatic,
};
pub use supervisor::Supervisor;
