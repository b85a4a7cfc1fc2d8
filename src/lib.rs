// ABOUTME: Library root for slipway - exposes the deployment engine modules.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod error;
pub mod logs;
pub mod model;
pub mod notify;
pub mod remote;
pub mod types;
