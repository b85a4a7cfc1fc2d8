// ABOUTME: Immutable-during-deployment view of the application to build.
// ABOUTME: Carries source coordinates, build pack tag, and naming inputs.

use serde::{Deserialize, Serialize};

use crate::types::ApplicationId;

/// Mechanism used to turn source into a container image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPack {
    Dockerfile,
    Nixpacks,
    DockerCompose,
    DockerImage,
    Static,
}

impl std::fmt::Display for BuildPack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuildPack::Dockerfile => "dockerfile",
            BuildPack::Nixpacks => "nixpacks",
            BuildPack::DockerCompose => "dockercompose",
            BuildPack::DockerImage => "dockerimage",
            BuildPack::Static => "static",
        };
        write!(f, "{s}")
    }
}

/// Read-only input to the pipeline describing what to build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSpec {
    pub uuid: ApplicationId,
    pub name: String,
    pub build_pack: BuildPack,

    pub git_repository: String,
    pub git_branch: String,
    pub git_commit_sha: String,
    #[serde(default)]
    pub base_directory: Option<String>,

    /// Inline Dockerfile content for the `dockerfile` build pack.
    #[serde(default)]
    pub dockerfile: Option<String>,
    /// Path of the Dockerfile within the repository, when not inline.
    #[serde(default)]
    pub dockerfile_location: Option<String>,
    /// Optional `--target` stage for multi-stage builds.
    #[serde(default)]
    pub dockerfile_target_build: Option<String>,

    /// Base image for the `static` build pack.
    #[serde(default)]
    pub static_image: Option<String>,
    /// Registry image name; when unset, images are named by application UUID.
    #[serde(default)]
    pub docker_registry_image_name: Option<String>,

    #[serde(default)]
    pub ports_exposes: Vec<u16>,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default)]
    pub post_deployment_command: Option<String>,
}

impl ApplicationSpec {
    /// Repository in `owner/name` form, without any URL prefix.
    pub fn repository(&self) -> &str {
        self.git_repository
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("github.com/")
    }

    /// Preview URL for a pull-request deployment.
    pub fn preview_fqdn(&self, pull_request_id: u64) -> Option<String> {
        self.fqdn.as_deref().map(|fqdn| {
            let (scheme, host) = match fqdn.split_once("://") {
                Some((scheme, host)) => (scheme, host),
                None => ("http", fqdn),
            };
            format!("{scheme}://pr-{pull_request_id}.{host}")
        })
    }

    pub fn has_registry_image_name(&self) -> bool {
        self.docker_registry_image_name
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> ApplicationSpec {
        ApplicationSpec {
            uuid: ApplicationId::new("a1b2c3"),
            name: "example".to_string(),
            build_pack: BuildPack::Nixpacks,
            git_repository: "https://github.com/acme/example".to_string(),
            git_branch: "main".to_string(),
            git_commit_sha: "HEAD".to_string(),
            base_directory: None,
            dockerfile: None,
            dockerfile_location: None,
            dockerfile_target_build: None,
            static_image: None,
            docker_registry_image_name: None,
            ports_exposes: vec![3000],
            fqdn: Some("https://example.acme.dev".to_string()),
            post_deployment_command: None,
        }
    }

    #[test]
    fn repository_strips_url_prefix() {
        assert_eq!(app().repository(), "acme/example");
    }

    #[test]
    fn preview_fqdn_prefixes_pr_id() {
        assert_eq!(
            app().preview_fqdn(42).as_deref(),
            Some("https://pr-42.example.acme.dev")
        );
    }

    #[test]
    fn preview_fqdn_without_fqdn_is_none() {
        let mut app = app();
        app.fqdn = None;
        assert_eq!(app.preview_fqdn(42), None);
    }
}
