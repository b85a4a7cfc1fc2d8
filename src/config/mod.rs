// ABOUTME: YAML deployment manifest parsing for the CLI.
// ABOUTME: Maps slipway.yml onto the domain model driving a deployment attempt.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::deploy::DEFAULT_HELPER_IMAGE;
use crate::error::{Error, Result};
use crate::model::{ApplicationSpec, BuildPack, Destination, DestinationKind, ServerSpec};
use crate::types::ApplicationId;

pub const MANIFEST_FILENAME: &str = "slipway.yml";
pub const MANIFEST_FILENAME_ALT: &str = "slipway.yaml";
pub const MANIFEST_FILENAME_DIR: &str = ".slipway/config.yml";

/// Deployment manifest as written by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub application: ApplicationManifest,

    pub servers: NonEmpty<ServerManifest>,

    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,

    #[serde(default = "default_helper_image")]
    pub helper_image: String,
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_helper_image() -> String {
    DEFAULT_HELPER_IMAGE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationManifest {
    pub uuid: String,
    pub name: String,
    pub build_pack: BuildPack,
    pub git_repository: String,
    #[serde(default = "default_branch")]
    pub git_branch: String,
    #[serde(default)]
    pub base_directory: Option<String>,
    #[serde(default)]
    pub dockerfile: Option<String>,
    #[serde(default)]
    pub dockerfile_location: Option<String>,
    #[serde(default)]
    pub dockerfile_target_build: Option<String>,
    #[serde(default)]
    pub static_image: Option<String>,
    #[serde(default)]
    pub registry_image_name: Option<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default)]
    pub post_deployment_command: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerManifest {
    pub name: String,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default)]
    pub swarm: bool,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_network() -> String {
    "slipway".to_string()
}

impl Manifest {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(MANIFEST_FILENAME),
            dir.join(MANIFEST_FILENAME_ALT),
            dir.join(MANIFEST_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ManifestNotFound(dir.to_path_buf()))
    }

    /// Resolve the application described by this manifest, taking the commit
    /// from the deployment request rather than the manifest.
    pub fn application_spec(&self) -> ApplicationSpec {
        let app = &self.application;
        ApplicationSpec {
            uuid: ApplicationId::new(app.uuid.clone()),
            name: app.name.clone(),
            build_pack: app.build_pack,
            git_repository: app.git_repository.clone(),
            git_branch: app.git_branch.clone(),
            git_commit_sha: "HEAD".to_string(),
            base_directory: app.base_directory.clone(),
            dockerfile: app.dockerfile.clone(),
            dockerfile_location: app.dockerfile_location.clone(),
            dockerfile_target_build: app.dockerfile_target_build.clone(),
            static_image: app.static_image.clone(),
            docker_registry_image_name: app.registry_image_name.clone(),
            ports_exposes: app.ports.clone(),
            fqdn: app.fqdn.clone(),
            post_deployment_command: app.post_deployment_command.clone(),
        }
    }

    /// Resolve the primary target server. Reachability/usability are probed
    /// by the caller, not assumed from the manifest.
    pub fn primary_server(&self) -> ServerSpec {
        let server = self.servers.first();
        ServerSpec {
            name: server.name.clone(),
            host: server.host.clone(),
            port: server.port,
            user: server.user.clone(),
            is_reachable: false,
            is_usable: false,
            destination: Destination {
                kind: if server.swarm {
                    DestinationKind::Swarm
                } else {
                    DestinationKind::Standalone
                },
                network: server.network.clone(),
            },
        }
    }
}

/// Write a starter manifest into `dir`.
pub fn init_manifest(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join(MANIFEST_FILENAME);

    if path.exists() && !force {
        return Err(Error::AlreadyExists(path));
    }

    std::fs::write(&path, template_yaml())?;
    Ok(())
}

fn template_yaml() -> &'static str {
    r#"application:
  uuid: my-app
  name: My Application
  build_pack: nixpacks
  git_repository: https://github.com/acme/my-app
  git_branch: main
  ports:
    - 3000
servers:
  - name: web-1
    host: web-1.example.com
    port: 22
    user: deploy
    network: slipway
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses() {
        let manifest = Manifest::from_yaml(template_yaml()).unwrap();
        assert_eq!(manifest.application.build_pack, BuildPack::Nixpacks);
        assert_eq!(manifest.servers.first().port, 22);
        assert_eq!(manifest.command_timeout, Duration::from_secs(300));
    }

    #[test]
    fn server_defaults_apply() {
        let manifest = Manifest::from_yaml(
            r#"
application:
  uuid: app-1
  name: App
  build_pack: static
  git_repository: https://github.com/acme/site
servers:
  - name: s1
    host: s1.internal
"#,
        )
        .unwrap();

        let server = manifest.primary_server();
        assert_eq!(server.port, 22);
        assert_eq!(server.destination.network, "slipway");
        assert!(!server.is_functional());
    }
}
