// ABOUTME: One pipeline variant per build strategy.
// ABOUTME: The pull-request variant composes the others through their public contract.

mod compose;
mod dockerfile;
mod nixpacks;
mod pull_request;
mod restart;
mod static_site;

pub use compose::DeployCompose;
pub use dockerfile::DeployDockerfile;
pub use nixpacks::DeployNixpacks;
pub use pull_request::DeployPullRequest;
pub use restart::DeployRestart;
pub use static_site::DeployStatic;
