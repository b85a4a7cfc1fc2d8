// ABOUTME: Shared pipeline steps used by every deployment strategy.
// ABOUTME: Each helper takes the context explicitly; no strategy reaches into another.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use crate::model::DestinationKind;
use crate::remote::RemoteCommand;

use super::context::{DeploymentContext, ImageNames};
use super::error::{DeployError, Result};

/// Length limit applied to commit-derived image tags.
const MAX_TAG_LEN: usize = 128;

/// Deterministic image naming for one deployment.
///
/// Base name is the registry image name when configured, the application UUID
/// otherwise. Tag suffix is the first 128 characters of the commit for
/// standard deployments, `pr-<id>` for previews. The build image always
/// appends `-build`.
pub fn image_names(ctx: &DeploymentContext) -> ImageNames {
    let application = &ctx.application;
    let base = application
        .docker_registry_image_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ctx.application.uuid.as_str());

    let tag = if ctx.request.is_pull_request() {
        format!("pr-{}", ctx.request.pull_request_id)
    } else {
        ctx.request.commit.chars().take(MAX_TAG_LEN).collect()
    };

    ImageNames {
        build: format!("{base}:{tag}-build"),
        production: format!("{base}:{tag}"),
    }
}

/// Wrap a command so it runs inside the builder container of this deployment.
pub fn exec_in_builder(ctx: &DeploymentContext, command: &str) -> String {
    let escaped = command.replace('\'', r"'\''");
    format!(
        "docker exec {} bash -c '{}'",
        ctx.request.deployment_id, escaped
    )
}

/// Commands that write `content` to `path` inside the builder container.
/// Content travels base64-encoded so quoting survives the shell round trip.
pub fn write_file_in_builder(ctx: &DeploymentContext, path: &str, content: &str) -> RemoteCommand {
    let encoded = BASE64.encode(content);
    RemoteCommand::new(exec_in_builder(
        ctx,
        &format!("echo '{encoded}' | base64 -d | tee {path} > /dev/null"),
    ))
    .hidden()
}

/// Acquire the builder image and start the builder container that hosts all
/// subsequent pipeline steps. The container carries the deployment id as its
/// name so cleanup can find it.
pub async fn prepare_builder_image(ctx: &mut DeploymentContext) -> Result<()> {
    let helper_image = ctx.build.helper_image.clone();
    ctx.logs
        .push(format!("Preparing builder container with {helper_image}."));

    let deployment_id = &ctx.request.deployment_id;
    let network = &ctx.server.destination.network;
    let work_dir = &ctx.build.work_dir;

    let run_builder = format!(
        "docker run -d --rm --name {deployment_id} --network {network} \
         -v /var/run/docker.sock:/var/run/docker.sock {helper_image}"
    );

    let commands = [
        RemoteCommand::new(format!("docker pull -q {helper_image}")).hidden(),
        RemoteCommand::new(run_builder).hidden(),
        RemoteCommand::new(exec_in_builder(ctx, &format!("mkdir -p {work_dir}"))).hidden(),
    ];

    ctx.execute_and_save(&commands)
        .await
        .map_err(|e| DeployError::Setup(format!("builder container failed to start: {e}")))?;

    Ok(())
}

/// Verify the source reference is resolvable before cloning.
pub async fn check_git_if_build_needed(ctx: &mut DeploymentContext) -> Result<()> {
    let application = &ctx.application;
    let command = exec_in_builder(
        ctx,
        &format!(
            "git ls-remote {} {}",
            application.git_repository, application.git_branch
        ),
    );

    ctx.execute_and_save(&[RemoteCommand::new(command).hidden()])
        .await
        .map_err(|e| {
            DeployError::Setup(format!(
                "source repository {} is not reachable: {e}",
                ctx.application.git_repository
            ))
        })?;

    Ok(())
}

/// Clone the source repository into the work directory and check out the
/// requested commit.
pub async fn clone_repository(ctx: &mut DeploymentContext) -> Result<()> {
    let application = &ctx.application;
    ctx.logs.push(format!(
        "Cloning {}:{} (commit {}).",
        application.repository(),
        application.git_branch,
        ctx.request.commit
    ));

    let work_dir = ctx.build.work_dir.clone();
    let mut commands = vec![
        RemoteCommand::new(exec_in_builder(
            ctx,
            &format!(
                "git clone -b {} {} {work_dir}",
                ctx.application.git_branch, ctx.application.git_repository
            ),
        ))
        .hidden(),
    ];

    if ctx.request.commit != "HEAD" {
        commands.push(
            RemoteCommand::new(exec_in_builder(
                ctx,
                &format!("cd {work_dir} && git checkout {}", ctx.request.commit),
            ))
            .hidden(),
        );
    }

    ctx.execute_and_save(&commands)
        .await
        .map_err(|e| DeployError::Setup(format!("failed to clone repository: {e}")))?;

    Ok(())
}

/// Drop git metadata from the build context.
pub async fn cleanup_git(ctx: &mut DeploymentContext) -> Result<()> {
    let command = exec_in_builder(ctx, &format!("rm -rf {}/.git", ctx.build.work_dir));
    ctx.execute_and_save(&[RemoteCommand::new(command).hidden()])
        .await
        .map_err(DeployError::from)?;
    Ok(())
}

/// Build environment variables exposed to image builds.
pub fn generate_build_env(ctx: &DeploymentContext) -> Vec<(String, String)> {
    let mut env = vec![("SOURCE_COMMIT".to_string(), ctx.request.commit.clone())];
    if let Some(url) = ctx.deployment_url() {
        env.push(("SLIPWAY_URL".to_string(), url));
    }
    env
}

/// Render build env as `--build-arg` pairs for a docker build command.
pub fn build_args_string(env: &[(String, String)]) -> String {
    env.iter()
        .map(|(key, value)| format!("--build-arg {key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inject build env vars as ARG lines after the first FROM of a Dockerfile,
/// so strategies that render their own Dockerfile pick them up.
pub fn add_build_env_to_dockerfile(dockerfile: &str, env: &[(String, String)]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut injected = false;
    for line in dockerfile.lines() {
        lines.push(line.to_string());
        if !injected && line.trim_start().to_uppercase().starts_with("FROM") {
            for (key, _) in env {
                lines.push(format!("ARG {key}"));
            }
            injected = true;
        }
    }
    lines.join("\n")
}

/// Generate the compose descriptor used to roll the new image out, and write
/// it into the work directory.
pub async fn generate_compose_file(ctx: &mut DeploymentContext) -> Result<()> {
    ctx.logs.push("Generating deployment compose file.".to_string());

    let names = ctx
        .result
        .image_names
        .clone()
        .ok_or_else(|| DeployError::Setup("image names not generated".to_string()))?;

    let service_name = container_name(ctx);
    let ports: Vec<String> = ctx
        .application
        .ports_exposes
        .iter()
        .map(|p| p.to_string())
        .collect();

    let network = ctx.server.destination.network.clone();
    let service = serde_json::json!({
        "image": names.production,
        "container_name": service_name.as_str(),
        "restart": "unless-stopped",
        "expose": ports,
        "networks": [network.as_str()],
        "labels": {
            "slipway.managed": "true",
            "slipway.applicationId": ctx.application.uuid.as_str(),
            "slipway.deploymentId": ctx.request.deployment_id.as_str(),
        },
    });
    let descriptor = serde_json::json!({
        "services": { (service_name.clone()): service },
        "networks": { (network.clone()): { "external": true } },
    });

    let yaml = serde_yaml::to_string(&descriptor)
        .map_err(|e| DeployError::Setup(format!("failed to render compose file: {e}")))?;

    let path = format!("{}/docker-compose.yml", ctx.build.work_dir);
    let write = write_file_in_builder(ctx, &path, &yaml);
    ctx.execute_and_save(&[write]).await.map_err(DeployError::from)?;

    ctx.result.compose_file = Some(path);
    Ok(())
}

/// Detect the runtime and produce a build plan with nixpacks.
pub async fn generate_nixpacks_configs(ctx: &mut DeploymentContext) -> Result<()> {
    ctx.logs
        .push("Detecting runtime configuration with nixpacks.".to_string());

    let work_dir = &ctx.build.work_dir;
    let commands = [
        RemoteCommand::new(exec_in_builder(ctx, &format!("nixpacks detect {work_dir}"))).hidden(),
        RemoteCommand::new(exec_in_builder(
            ctx,
            &format!("nixpacks plan -f toml {work_dir} > {work_dir}/.nixpacks/plan.toml"),
        ))
        .hidden(),
    ];

    ctx.execute_and_save(&commands)
        .await
        .map_err(|e| DeployError::Build(format!("nixpacks plan generation failed: {e}")))?;

    Ok(())
}

/// Write the docker build command into the builder as a script and run it.
/// The script indirection keeps quoting stable for arbitrarily long commands.
pub async fn run_docker_build(ctx: &mut DeploymentContext, build_command: &str) -> Result<()> {
    let encoded = BASE64.encode(build_command);
    let commands = [
        RemoteCommand::new(exec_in_builder(
            ctx,
            &format!("echo '{encoded}' | base64 -d | tee /artifacts/build.sh > /dev/null"),
        ))
        .hidden(),
        RemoteCommand::new(exec_in_builder(ctx, "bash /artifacts/build.sh")).hidden(),
    ];

    ctx.execute_and_save(&commands)
        .await
        .map_err(|e| DeployError::Build(e.to_string()))?;

    Ok(())
}

/// Standard docker build invocation for a Dockerfile in the work directory.
pub fn docker_build_command(ctx: &DeploymentContext, dockerfile_path: &str, image: &str) -> String {
    let add_hosts = &ctx.build.add_hosts;
    let build_args = build_args_string(&generate_build_env(ctx));
    let target = ctx
        .build
        .build_target
        .as_deref()
        .map(|t| format!("--target {t} "))
        .unwrap_or_default();

    format!(
        "docker build {add_hosts} --network host -f {dockerfile_path} {build_args} {target}--progress plain -t {image} {}",
        ctx.build.work_dir
    )
}

/// Whether the given image is already present on the target host.
pub async fn image_exists(ctx: &DeploymentContext, image: &str) -> Result<bool> {
    let command = format!("docker images -q {image} 2>/dev/null");
    let output = ctx
        .executor()
        .execute(&command)
        .await
        .map_err(|e| DeployError::Setup(format!("failed to query images: {e}")))?;

    let found = output.success() && !output.stdout.trim().is_empty();
    debug!(image, found, "image cache check");
    ctx.logs.push_hidden(format!(
        "{command}: {}",
        if found { output.stdout.trim() } else { "not found" }
    ));
    Ok(found)
}

/// Whether the given image is resolvable from the configured registry.
/// Applications without a registry image name have nothing to consult.
pub async fn image_exists_in_registry(ctx: &DeploymentContext, image: &str) -> Result<bool> {
    if !ctx.application.has_registry_image_name() {
        return Ok(false);
    }

    let command = format!("docker manifest inspect {image} > /dev/null 2>&1 && echo exists");
    let output = ctx
        .executor()
        .execute(&command)
        .await
        .map_err(|e| DeployError::Setup(format!("failed to query registry: {e}")))?;

    let found = output.success() && output.stdout.trim() == "exists";
    debug!(image, found, "registry cache check");
    ctx.logs.push_hidden(format!(
        "{command}: {}",
        if found { "exists" } else { "not found" }
    ));
    Ok(found)
}

/// Push the production image when a registry target is configured.
pub async fn push_to_registry(ctx: &mut DeploymentContext) -> Result<()> {
    if !ctx.application.has_registry_image_name() {
        debug!("no registry image name configured, skipping push");
        return Ok(());
    }

    let names = ctx
        .result
        .image_names
        .clone()
        .ok_or_else(|| DeployError::Publish("image names not generated".to_string()))?;

    ctx.logs
        .push(format!("Pushing {} to the registry.", names.production));

    let command = exec_in_builder(ctx, &format!("docker push {}", names.production));
    ctx.execute_and_save(&[RemoteCommand::new(command).hidden()])
        .await
        .map_err(|e| DeployError::Publish(e.to_string()))?;

    Ok(())
}

/// Name of the running container (or swarm service) for this application.
pub fn container_name(ctx: &DeploymentContext) -> String {
    if ctx.request.is_pull_request() {
        format!(
            "{}-pr-{}",
            ctx.application.uuid, ctx.request.pull_request_id
        )
    } else {
        ctx.application.uuid.to_string()
    }
}

/// Replace the running container/service with the freshly built image.
pub async fn rolling_update(ctx: &mut DeploymentContext) -> Result<()> {
    ctx.logs.push("Rolling update started.".to_string());

    let names = ctx
        .result
        .image_names
        .clone()
        .ok_or_else(|| DeployError::Rollout("image names not generated".to_string()))?;

    let name = container_name(ctx);
    let network = &ctx.server.destination.network;

    let commands = match ctx.server.destination.kind {
        // Prefer the generated compose descriptor: it carries the restart
        // policy, expose list, and labels in one place. The plain `docker run`
        // path remains for the restart pipeline, which has no builder.
        DestinationKind::Standalone => match ctx.result.compose_file.clone() {
            Some(compose_file) => vec![
                RemoteCommand::new(format!("docker stop --time=30 {name}"))
                    .hidden()
                    .ignore_errors(),
                RemoteCommand::new(format!("docker rm {name}"))
                    .hidden()
                    .ignore_errors(),
                RemoteCommand::new(exec_in_builder(
                    ctx,
                    &format!(
                        "docker compose --project-directory {} -f {compose_file} up -d",
                        ctx.build.work_dir
                    ),
                ))
                .hidden(),
            ],
            None => {
                let labels = format!(
                    "--label slipway.managed=true \
                     --label slipway.applicationId={} \
                     --label slipway.deploymentId={}",
                    ctx.application.uuid, ctx.request.deployment_id
                );
                vec![
                    RemoteCommand::new(format!("docker stop --time=30 {name}"))
                        .hidden()
                        .ignore_errors(),
                    RemoteCommand::new(format!("docker rm {name}"))
                        .hidden()
                        .ignore_errors(),
                    RemoteCommand::new(format!(
                        "docker run -d --restart unless-stopped --name {name} --network {network} {labels} {}",
                        names.production
                    ))
                    .hidden(),
                ]
            }
        },
        DestinationKind::Swarm => vec![
            RemoteCommand::new(format!(
                "docker service update --image {} {name}",
                names.production
            ))
            .hidden(),
        ],
    };

    ctx.execute_and_save(&commands)
        .await
        .map_err(|e| DeployError::Rollout(e.to_string()))?;

    ctx.result.new_version_healthy = true;
    ctx.logs.push("Rolling update completed.".to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_args_render_as_pairs() {
        let env = vec![
            ("SOURCE_COMMIT".to_string(), "abc".to_string()),
            ("SLIPWAY_URL".to_string(), "https://x".to_string()),
        ];
        assert_eq!(
            build_args_string(&env),
            "--build-arg SOURCE_COMMIT=abc --build-arg SLIPWAY_URL=https://x"
        );
    }

    #[test]
    fn args_injected_after_first_from_only() {
        let dockerfile = "FROM node:20\nRUN true\nFROM scratch\nCOPY . .";
        let env = vec![("SOURCE_COMMIT".to_string(), "abc".to_string())];
        let rendered = add_build_env_to_dockerfile(dockerfile, &env);
        assert_eq!(
            rendered,
            "FROM node:20\nARG SOURCE_COMMIT\nRUN true\nFROM scratch\nCOPY . ."
        );
    }
}
