// ABOUTME: Shared test fixtures: scripted command executor and recording notifier.
// ABOUTME: Builds deployment contexts without touching a real server.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use slipway::deploy::DeploymentContext;
use slipway::model::{
    ApplicationSpec, BuildPack, DeploymentRequest, DeploymentStatus, Destination, DestinationKind,
    ServerSpec, StatusCell,
};
use slipway::notify::{Notifier, PullRequestStatus};
use slipway::remote::{CommandExecutor, CommandOutput, ExecError};
use slipway::types::{ApplicationId, DeploymentId};

/// Scripted response for a command matching a substring rule.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Success(String),
    Fail { exit_code: u32, output: String },
    Timeout { partial: String },
    Transport(String),
}

/// Executor that records every command and answers from substring rules.
/// Commands matching no rule succeed with empty output.
#[derive(Default)]
pub struct MockExecutor {
    rules: Mutex<Vec<(String, MockOutcome)>>,
    pub executed: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(self, pattern: impl Into<String>, outcome: MockOutcome) -> Self {
        self.rules.lock().push((pattern.into(), outcome));
        self
    }

    pub fn executed_commands(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.executed
            .lock()
            .iter()
            .filter(|c| c.contains(pattern))
            .count()
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(&self, command: &str) -> Result<CommandOutput, ExecError> {
        self.executed.lock().push(command.to_string());

        let outcome = self
            .rules
            .lock()
            .iter()
            .find(|(pattern, _)| command.contains(pattern))
            .map(|(_, outcome)| outcome.clone());

        match outcome {
            None => Ok(CommandOutput::default()),
            Some(MockOutcome::Success(stdout)) => Ok(CommandOutput {
                exit_code: 0,
                stdout,
                stderr: String::new(),
            }),
            Some(MockOutcome::Fail { exit_code, output }) => Ok(CommandOutput {
                exit_code,
                stdout: String::new(),
                stderr: output,
            }),
            Some(MockOutcome::Timeout { partial }) => Err(ExecError::Timeout {
                elapsed: Duration::from_secs(1),
                partial_output: partial,
            }),
            Some(MockOutcome::Transport(message)) => Err(ExecError::Connection(message)),
        }
    }
}

/// Notifier that records every call for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deployment_success(
        &self,
        application: &ApplicationSpec,
        deployment_id: &DeploymentId,
        url: Option<&str>,
    ) {
        self.events.lock().push(format!(
            "success:{}:{}:{}",
            application.uuid,
            deployment_id,
            url.unwrap_or("-")
        ));
    }

    async fn deployment_failed(
        &self,
        application: &ApplicationSpec,
        deployment_id: &DeploymentId,
        url: Option<&str>,
    ) {
        self.events.lock().push(format!(
            "failed:{}:{}:{}",
            application.uuid,
            deployment_id,
            url.unwrap_or("-")
        ));
    }

    async fn pull_request_status(
        &self,
        application: &ApplicationSpec,
        _deployment_id: &DeploymentId,
        pull_request_id: u64,
        _preview_url: Option<&str>,
        status: PullRequestStatus,
    ) {
        self.events.lock().push(format!(
            "pr:{}:{}:{}",
            application.uuid, pull_request_id, status
        ));
    }

    async fn application_status_changed(&self, application_id: &ApplicationId) {
        self.events
            .lock()
            .push(format!("status_changed:{application_id}"));
    }
}

/// A nixpacks application with sensible defaults for tests.
pub fn application(build_pack: BuildPack) -> ApplicationSpec {
    ApplicationSpec {
        uuid: ApplicationId::new("app-uuid-1"),
        name: "Example".to_string(),
        build_pack,
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

pub fn functional_server() -> ServerSpec {
    ServerSpec {
        name: "web-1".to_string(),
        host: "web-1.internal".to_string(),
        port: 22,
        user: Some("deploy".to_string()),
        is_reachable: true,
        is_usable: true,
        destination: Destination {
            kind: DestinationKind::Standalone,
            network: "slipway".to_string(),
        },
    }
}

pub fn request(commit: &str) -> DeploymentRequest {
    DeploymentRequest {
        deployment_id: DeploymentId::new("deploy-1"),
        application_id: ApplicationId::new("app-uuid-1"),
        commit: commit.to_string(),
        pull_request_id: 0,
        force_rebuild: false,
        restart_only: false,
        only_this_server: true,
        is_webhook: false,
        status: StatusCell::new(DeploymentStatus::Queued),
    }
}

/// Wire a context around the shared mock executor and recording notifier.
pub fn context(
    application: ApplicationSpec,
    server: ServerSpec,
    request: DeploymentRequest,
    executor: Arc<MockExecutor>,
    notifier: Arc<RecordingNotifier>,
) -> DeploymentContext {
    DeploymentContext::new(application, server, request, executor, notifier)
}
