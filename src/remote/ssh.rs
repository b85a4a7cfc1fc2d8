// ABOUTME: SSH-backed execution channel using russh.
// ABOUTME: One connection per deployment attempt; one exec channel per command.

use async_trait::async_trait;
use russh::client::{self, Config, Handle};
use russh::keys::known_hosts::{check_known_hosts, learn_known_hosts};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{ChannelMsg, Disconnect};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::model::ServerSpec;

use super::executor::{CommandExecutor, CommandOutput, ExecError};

/// Connection settings for reaching a target server over SSH.
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Optional path to a private key file. If None, default key locations
    /// under ~/.ssh are tried.
    pub key_path: Option<PathBuf>,
    /// Accept unknown host keys (Trust On First Use).
    pub trust_on_first_use: bool,
    /// Per-command execution deadline.
    pub command_timeout: Duration,
}

impl SshConfig {
    pub fn for_server(server: &ServerSpec) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            user: server.user.clone().unwrap_or_else(|| "root".to_string()),
            key_path: None,
            trust_on_first_use: false,
            command_timeout: Duration::from_secs(300),
        }
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn trust_on_first_use(mut self, tofu: bool) -> Self {
        self.trust_on_first_use = tofu;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Host key verification handler.
struct HostHandler {
    host: String,
    port: u16,
    trust_on_first_use: bool,
}

impl client::Handler for HostHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => Ok(true),
            Ok(false) => {
                if self.trust_on_first_use {
                    warn!(
                        "Trust-On-First-Use: accepting unknown host key for {}:{}",
                        self.host, self.port
                    );
                    if let Err(e) = learn_known_hosts(&self.host, self.port, server_public_key) {
                        warn!("Failed to save host key to known_hosts: {}", e);
                    }
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(russh::keys::Error::KeyChanged { .. }) => Ok(false),
            Err(_) => Ok(self.trust_on_first_use),
        }
    }
}

/// An established SSH session acting as the execution channel for one
/// deployment attempt.
pub struct SshExecutor {
    config: SshConfig,
    handle: Handle<HostHandler>,
}

impl std::fmt::Debug for SshExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SshExecutor {
    /// Connect and authenticate against the target host.
    pub async fn connect(config: SshConfig) -> Result<Self, ExecError> {
        let key = resolve_key(&config)?;

        let russh_config = Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let handler = HostHandler {
            host: config.host.clone(),
            port: config.port,
            trust_on_first_use: config.trust_on_first_use,
        };

        let mut handle = client::connect(
            Arc::new(russh_config),
            (config.host.as_str(), config.port),
            handler,
        )
        .await
        .map_err(|e| ExecError::Connection(e.to_string()))?;

        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .map_err(|e| ExecError::Connection(e.to_string()))?
            .flatten();

        let result = handle
            .authenticate_publickey(&config.user, PrivateKeyWithHashAlg::new(key, hash_alg))
            .await
            .map_err(|e| ExecError::Connection(e.to_string()))?;

        if !result.success() {
            return Err(ExecError::Connection(format!(
                "authentication failed for {}@{}",
                config.user, config.host
            )));
        }

        Ok(Self { config, handle })
    }

    /// Close the underlying connection.
    pub async fn disconnect(self) -> Result<(), ExecError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| ExecError::Connection(e.to_string()))
    }

    /// Runs the command, streaming output into caller-owned buffers so a
    /// caller that drops this future on deadline still holds everything
    /// captured so far.
    async fn exec_inner(
        &self,
        command: &str,
        stdout: &mut Vec<u8>,
        stderr: &mut Vec<u8>,
    ) -> Result<u32, ExecError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| ExecError::CommandFailed(format!("failed to open channel: {e}")))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| ExecError::CommandFailed(format!("failed to exec command: {e}")))?;

        let mut exit_code = 0u32;
        let mut got_exit_status = false;
        let mut got_eof = false;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => stdout.extend_from_slice(&data),
                Some(ChannelMsg::ExtendedData { data, ext }) if ext == 1 => {
                    stderr.extend_from_slice(&data)
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = exit_status;
                    got_exit_status = true;
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => {
                    got_eof = true;
                    if got_exit_status {
                        break;
                    }
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            }
        }

        // A channel that closes without an exit status indicates abnormal
        // termination (connection drop, remote kill).
        if !got_exit_status {
            return Err(ExecError::ChannelClosed);
        }

        Ok(exit_code)
    }
}

/// Lossy merge of both streams for a timeout partial; the deadline may cut a
/// multibyte character, so invalid bytes are replaced rather than dropped.
fn merge_streams(stdout: &[u8], stderr: &[u8]) -> String {
    let mut out = String::from_utf8_lossy(stdout).trim_end().to_string();
    let err_lossy = String::from_utf8_lossy(stderr);
    let err = err_lossy.trim_end();
    if !err.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(err);
    }
    out
}

#[async_trait]
impl CommandExecutor for SshExecutor {
    async fn execute(&self, command: &str) -> Result<CommandOutput, ExecError> {
        let timeout = self.config.command_timeout;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let outcome = tokio::time::timeout(timeout, self.exec_inner(command, &mut stdout, &mut stderr)).await;

        match outcome {
            Ok(result) => result.map(|exit_code| CommandOutput {
                exit_code,
                stdout: String::from_utf8_lossy(&stdout).to_string(),
                stderr: String::from_utf8_lossy(&stderr).to_string(),
            }),
            // The exec future is dropped on deadline; the buffers keep
            // whatever the command wrote before it.
            Err(_) => Err(ExecError::Timeout {
                elapsed: timeout,
                partial_output: merge_streams(&stdout, &stderr),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: both streams survive into the timeout partial, in order.
    #[test]
    fn merged_partial_keeps_both_streams() {
        let out = merge_streams(b"step 1 ok\nstep 2 running\n", b"warning: slow network\n");
        assert_eq!(out, "step 1 ok\nstep 2 running\nwarning: slow network");
    }

    /// Test: a deadline that cuts a multibyte character still yields a usable
    /// partial instead of dropping the buffer.
    #[test]
    fn merged_partial_tolerates_truncated_utf8() {
        // "héllo" cut inside the two-byte é.
        let truncated = &"héllo".as_bytes()[..2];
        let out = merge_streams(truncated, b"");
        assert!(out.starts_with('h'));
        assert!(!out.is_empty());
    }

    #[test]
    fn merged_partial_with_empty_streams_is_empty() {
        assert_eq!(merge_streams(b"", b""), "");
    }
}

/// Load the configured key, or fall back to default key locations.
fn resolve_key(config: &SshConfig) -> Result<Arc<ssh_key::PrivateKey>, ExecError> {
    if let Some(key_path) = &config.key_path {
        let key = load_secret_key(key_path, None).map_err(|e| {
            ExecError::Connection(format!(
                "failed to load key from {}: {e}",
                key_path.display()
            ))
        })?;
        return Ok(Arc::new(key));
    }

    let home = std::env::var("HOME")
        .map_err(|_| ExecError::Connection("no key path configured and HOME not set".to_string()))?;

    for name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
        if let Ok(key) = load_secret_key(format!("{home}/.ssh/{name}"), None) {
            return Ok(Arc::new(key));
        }
    }

    Err(ExecError::Connection(
        "no usable SSH key found in default locations".to_string(),
    ))
}
