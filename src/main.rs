// ABOUTME: Entry point for the slipway CLI.
// ABOUTME: Parses arguments, wires the SSH executor, and drives one deployment attempt.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use slipway::config::{Manifest, init_manifest};
use slipway::deploy::{DeploymentContext, Supervisor};
use slipway::error::{Error, Result};
use slipway::logs::DeploymentLog;
use slipway::model::{DeploymentRequest, DeploymentStatus, ServerSpec, StatusCell};
use slipway::notify::LogNotifier;
use slipway::remote::{CommandExecutor, SshConfig, SshExecutor};
use slipway::types::DeploymentId;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            init_manifest(&cwd, force)
        }
        Commands::Deploy {
            commit,
            force_rebuild,
            restart_only,
            pull_request,
            json,
        } => {
            let cwd = env::current_dir()?;
            let manifest = Manifest::discover(&cwd)?;
            deploy(
                manifest,
                commit,
                force_rebuild,
                restart_only,
                pull_request.unwrap_or(0),
                json,
            )
            .await
        }
        Commands::Check => {
            let cwd = env::current_dir()?;
            let manifest = Manifest::discover(&cwd)?;
            check(manifest).await
        }
    }
}

/// Connect to the server and probe whether the docker daemon answers.
async fn probe_server(manifest: &Manifest, server: &mut ServerSpec) -> Result<SshExecutor> {
    let ssh_config = SshConfig::for_server(server)
        .trust_on_first_use(true)
        .command_timeout(manifest.command_timeout);

    let executor = SshExecutor::connect(ssh_config)
        .await
        .map_err(|e| Error::Ssh(e.to_string()))?;
    server.is_reachable = true;

    let probe = executor
        .execute("docker info > /dev/null 2>&1 && echo usable")
        .await
        .map_err(|e| Error::Ssh(e.to_string()))?;
    server.is_usable = probe.success() && probe.stdout.trim() == "usable";

    Ok(executor)
}

async fn check(manifest: Manifest) -> Result<()> {
    let mut server = manifest.primary_server();
    println!("Checking {} ({})...", server.name, server.host);

    let executor = probe_server(&manifest, &mut server).await?;

    if server.is_functional() {
        println!("Server is functional.");
    } else {
        println!("Server is reachable but docker is not usable.");
    }

    executor
        .disconnect()
        .await
        .map_err(|e| Error::Ssh(e.to_string()))?;
    Ok(())
}

async fn deploy(
    manifest: Manifest,
    commit: String,
    force_rebuild: bool,
    restart_only: bool,
    pull_request_id: u64,
    json: bool,
) -> Result<()> {
    let application = manifest.application_spec();
    let mut server = manifest.primary_server();

    println!("Connecting to {} ({})...", server.name, server.host);
    let executor = probe_server(&manifest, &mut server).await?;

    let request = DeploymentRequest {
        deployment_id: new_deployment_id(),
        application_id: application.uuid.clone(),
        commit,
        pull_request_id,
        force_rebuild,
        restart_only,
        only_this_server: true,
        is_webhook: false,
        status: StatusCell::new(DeploymentStatus::Queued),
    };
    let status = request.status.clone();

    println!("Deployment {} queued.", request.deployment_id);

    let mut ctx = DeploymentContext::new(
        application,
        server,
        request,
        Arc::new(executor),
        Arc::new(LogNotifier),
    );
    ctx.build.helper_image = manifest.helper_image.clone();

    let cursor = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let tail = spawn_log_tail(ctx.logs.clone(), Arc::clone(&cursor), json);

    let outcome = Supervisor::handle(&mut ctx).await;

    tail.abort();
    print_entries(&ctx.logs, &cursor, json);

    match outcome {
        Ok(()) => {
            println!("Deployment finished with status: {}", status.get());
            Ok(())
        }
        Err(e) => Err(Error::Deploy(e.to_string())),
    }
}

fn new_deployment_id() -> DeploymentId {
    // Hex of the current epoch nanos: unique enough for container naming
    // without pulling in an id generator.
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    DeploymentId::new(format!("d{nanos:x}"))
}

/// Print log entries appended since the shared cursor, advancing it.
fn print_entries(logs: &DeploymentLog, cursor: &std::sync::atomic::AtomicUsize, json: bool) {
    use std::sync::atomic::Ordering;

    let (entries, next) = logs.tail_from(cursor.load(Ordering::Acquire));
    cursor.store(next, Ordering::Release);
    for entry in entries {
        if json {
            println!("{}", entry.to_json_line());
        } else if !entry.hidden {
            println!("{}", entry.output);
        }
    }
}

/// Live tail: print new log entries as they appear, until aborted.
fn spawn_log_tail(
    logs: DeploymentLog,
    cursor: Arc<std::sync::atomic::AtomicUsize>,
    json: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            print_entries(&logs, &cursor, json);
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    })
}
