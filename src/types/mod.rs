// ABOUTME: Core value types shared across the engine.
// ABOUTME: Exports phantom-typed identifiers.

mod id;

pub use id::{ApplicationId, DeploymentId, Id};
