// ABOUTME: Domain model for deployment processing.
// ABOUTME: Requests, application specs, and server descriptors.

mod application;
mod request;
mod server;

pub use application::{ApplicationSpec, BuildPack};
pub use request::{DeploymentRequest, DeploymentStatus, StatusCell};
pub use server::{Destination, DestinationKind, ServerSpec};
