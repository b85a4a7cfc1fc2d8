// ABOUTME: Target host descriptor and its destination (standalone or swarm).
// ABOUTME: Reachability and usability fold into a single functional predicate.

use serde::{Deserialize, Serialize};

/// Where containers land on the target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Standalone,
    Swarm,
}

impl Default for DestinationKind {
    fn default() -> Self {
        DestinationKind::Standalone
    }
}

/// Destination descriptor carrying the docker network to join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default)]
    pub kind: DestinationKind,
    pub network: String,
}

/// Target host for a deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSpec {
    pub name: String,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub is_reachable: bool,
    #[serde(default)]
    pub is_usable: bool,
    pub destination: Destination,
}

fn default_ssh_port() -> u16 {
    22
}

impl ServerSpec {
    /// A server takes deployments only when it is both reachable and usable.
    pub fn is_functional(&self) -> bool {
        self.is_reachable && self.is_usable
    }
}
