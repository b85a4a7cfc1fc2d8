// ABOUTME: Per-deployment scratchpad: specs, build config, collaborators, result.
// ABOUTME: Constructed once per attempt and passed explicitly through every call.

use std::sync::Arc;

use crate::logs::DeploymentLog;
use crate::model::{ApplicationSpec, DeploymentRequest, ServerSpec};
use crate::notify::Notifier;
use crate::remote::{CommandExecutor, RemoteCommand, RemoteExecutionFailure, execute_and_save};

/// Default builder image used to execute pipeline steps.
pub const DEFAULT_HELPER_IMAGE: &str = "ghcr.io/slipway-sh/builder:latest";

/// Generated image names for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNames {
    pub build: String,
    pub production: String,
}

/// Build configuration resolved once per attempt.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Working directory inside the builder container.
    pub work_dir: String,
    /// Pre-rendered `--add-host name:ip` pairs for the build command.
    pub add_hosts: String,
    pub force_rebuild: bool,
    /// Image of the builder container that hosts pipeline steps.
    pub helper_image: String,
    /// Optional `--target` stage for multi-stage Dockerfile builds.
    pub build_target: Option<String>,
}

impl BuildConfig {
    pub fn for_request(application: &ApplicationSpec, request: &DeploymentRequest) -> Self {
        Self {
            work_dir: format!("/artifacts/{}", request.deployment_id),
            add_hosts: String::new(),
            force_rebuild: request.force_rebuild,
            helper_image: DEFAULT_HELPER_IMAGE.to_string(),
            build_target: application
                .dockerfile_target_build
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string()),
        }
    }
}

/// Accumulated outcome of one pipeline run. Mutated only by strategy methods
/// during a single attempt; dies with the attempt.
#[derive(Debug, Default, Clone)]
pub struct DeploymentResult {
    pub image_names: Option<ImageNames>,
    pub new_version_healthy: bool,
    /// Overridden Dockerfile location, set by the pull-request flow.
    pub dockerfile_location_override: Option<String>,
    /// Path of the generated compose descriptor inside the builder container;
    /// the rolling update starts the service from it when present.
    pub compose_file: Option<String>,
}

/// Mutable, per-deployment scratchpad owned by exactly one attempt.
///
/// Precondition (enforced by the external scheduler, not here): at most one
/// deployment per application is processed at a time.
pub struct DeploymentContext {
    pub application: ApplicationSpec,
    pub server: ServerSpec,
    pub request: DeploymentRequest,
    pub build: BuildConfig,
    pub result: DeploymentResult,
    pub logs: DeploymentLog,
    executor: Arc<dyn CommandExecutor>,
    notifier: Arc<dyn Notifier>,
}

impl DeploymentContext {
    pub fn new(
        application: ApplicationSpec,
        server: ServerSpec,
        request: DeploymentRequest,
        executor: Arc<dyn CommandExecutor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let build = BuildConfig::for_request(&application, &request);
        Self {
            application,
            server,
            request,
            build,
            result: DeploymentResult::default(),
            logs: DeploymentLog::new(),
            executor,
            notifier,
        }
    }

    pub fn executor(&self) -> &dyn CommandExecutor {
        self.executor.as_ref()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Run an ordered command sequence against this deployment's server,
    /// capturing output into the deployment log.
    pub async fn execute_and_save(
        &self,
        commands: &[RemoteCommand],
    ) -> std::result::Result<(), RemoteExecutionFailure> {
        execute_and_save(self.executor.as_ref(), commands, &self.logs).await
    }

    /// URL reported to collaborators: the preview URL for pull-request
    /// deployments, the production FQDN otherwise.
    pub fn deployment_url(&self) -> Option<String> {
        if self.request.is_pull_request() {
            self.application.preview_fqdn(self.request.pull_request_id)
        } else {
            self.application.fqdn.clone()
        }
    }
}

impl std::fmt::Debug for DeploymentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentContext")
            .field("application", &self.application.uuid)
            .field("deployment", &self.request.deployment_id)
            .field("server", &self.server.name)
            .finish_non_exhaustive()
    }
}
