//! Public tunnel bootstrap driving the `ngrok` agent as a child process.
//!
//! The agent is started with JSON logging on stdout; the first
//! `started tunnel` record carries the public URL. The child is spawned with
//! kill-on-drop, so the tunnel goes away with the [`Tunnel`] handle even when
//! startup bails out early.

use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

use crate::config::TunnelConfig;
use crate::error::TunnelError;

pub struct Tunnel {
    child: Child,
    public_url: String,
}

#[derive(Debug, Deserialize)]
struct LogRecord {
    #[serde(default)]
    lvl: String,
    #[serde(default)]
    msg: String,
    url: Option<String>,
    err: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LogEvent {
    Started(String),
    Failed(String),
}

/// Classify one line of the agent's JSON log output. Lines that are not JSON
/// or carry nothing relevant yield `None`.
pub fn parse_log_line(line: &str) -> Option<LogEvent> {
    let record: LogRecord = serde_json::from_str(line).ok()?;

    if record.msg == "started tunnel" {
        return record.url.map(LogEvent::Started);
    }

    match record.lvl.as_str() {
        "eror" | "crit" => {
            let detail = record.err.filter(|e| !e.is_empty() && e != "<nil>");
            Some(LogEvent::Failed(detail.unwrap_or(record.msg)))
        }
        _ => None,
    }
}

impl Tunnel {
    /// Install the auth token if one is configured, then open a tunnel to
    /// `port` and wait for its public URL.
    pub async fn open(config: &TunnelConfig, port: u16) -> Result<Self, TunnelError> {
        if !config.auth_token.is_empty() {
            install_auth_token(config).await?;
        }

        tracing::info!("Opening tunnel to port {}", port);
        let mut child = Command::new(&config.binary)
            .args(["http", &port.to_string(), "--log", "stdout", "--log-format", "json"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TunnelError::Spawn {
                binary: config.binary.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(TunnelError::Exited)?;
        let mut lines = BufReader::new(stdout).lines();

        let timeout = Duration::from_secs(config.startup_timeout_secs);
        let public_url = tokio::time::timeout(timeout, wait_for_url(&mut lines))
            .await
            .map_err(|_| TunnelError::Timeout(config.startup_timeout_secs))??;

        tracing::info!("Tunnel established at: {}", public_url);

        // Keep the pipe drained so the agent never blocks on logging.
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target: "led_api::tunnel::agent", "{}", line);
            }
        });

        Ok(Self { child, public_url })
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    pub async fn close(mut self) {
        match self.child.kill().await {
            Ok(()) => tracing::info!("Tunnel {} closed", self.public_url),
            Err(e) => tracing::warn!("Failed to stop tunnel client: {}", e),
        }
    }
}

async fn wait_for_url(lines: &mut Lines<BufReader<ChildStdout>>) -> Result<String, TunnelError> {
    while let Some(line) = lines.next_line().await.map_err(TunnelError::Io)? {
        match parse_log_line(&line) {
            Some(LogEvent::Started(url)) => return Ok(url),
            Some(LogEvent::Failed(err)) => return Err(TunnelError::Client(err)),
            None => tracing::trace!("tunnel agent: {}", line),
        }
    }
    Err(TunnelError::Exited)
}

async fn install_auth_token(config: &TunnelConfig) -> Result<(), TunnelError> {
    tracing::debug!("Installing tunnel auth token");
    let output = Command::new(&config.binary)
        .args(["config", "add-authtoken", &config.auth_token])
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| TunnelError::Spawn {
            binary: config.binary.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::error!("Failed to install tunnel auth token: {}", stderr);
        return Err(TunnelError::AuthToken(stderr));
    }
    Ok(())
}
