//! Command executor: delivers text commands to the game server's control
//! channel and returns the textual reply.
//!
//! Two delivery strategies, chosen by config:
//! - `docker`: spawn `docker exec <container> rcon-cli <command>` and capture
//!   stdout. The subprocess is killed if it outlives the per-call timeout.
//! - `direct`: open an RCON connection (host/port/password), send the
//!   command, read the reply, drop the connection. One connection per call.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{RconConfig, RconMode};
use crate::error::{BridgeError, Result};

/// Chat prefix for lines the bridge speaks.
const SAY_PREFIX: &str = "[AI]";

/// Normalize a raw command: trim whitespace, strip leading slashes, reject
/// empty input. Pure and idempotent: `/list` and `list` come out identical.
///
/// ```rust
/// use craftbridge::rcon::sanitize_command;
///
/// assert_eq!(sanitize_command("/list").unwrap(), "list");
/// assert_eq!(sanitize_command("list").unwrap(), "list");
/// ```
pub fn sanitize_command(raw: &str) -> Result<&str> {
    let command = raw.trim().trim_start_matches('/');
    if command.is_empty() {
        return Err(BridgeError::Invalid("empty command".to_string()));
    }
    Ok(command)
}

/// Build the `tellraw` command for a colored chat line.
fn format_tellraw(message: &str) -> String {
    let payload = json!([
        { "text": format!("{SAY_PREFIX} "), "color": "gold" },
        { "text": message, "color": "white" },
    ]);
    format!("tellraw @a {payload}")
}

/// Anything that can deliver a command to the game server.
///
/// `say` and `execute_multiple` are derived from `send_command`, so test
/// doubles only need to implement the one method.
///
/// # Example
///
/// ```rust
/// # use async_trait::async_trait;
/// # use craftbridge::error::Result;
/// # use craftbridge::rcon::Executor;
/// struct Echo;
///
/// #[async_trait]
/// impl Executor for Echo {
///     async fn send_command(&self, command: &str) -> Result<String> {
///         Ok(format!("ran {command}"))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let replies = Echo.execute_multiple(&["list".into(), "seed".into()]).await;
/// assert_eq!(replies, vec!["ran list", "ran seed"]);
/// # });
/// ```
#[async_trait]
pub trait Executor: Send + Sync {
    /// Deliver one sanitized command and return the server's reply text.
    async fn send_command(&self, command: &str) -> Result<String>;

    /// Post a colored chat line visible to all players.
    async fn say(&self, message: &str) -> Result<String> {
        self.send_command(&format_tellraw(message)).await
    }

    /// Fire `send_command` concurrently for every command. The result vector
    /// has the same length and order as the input; a failed position carries
    /// an error string instead of a reply.
    async fn execute_multiple(&self, commands: &[String]) -> Vec<String> {
        join_all(commands.iter().map(|command| async move {
            match self.send_command(command).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(command = %command, error = %e, "Command in batch failed");
                    format!("error: {e}")
                }
            }
        }))
        .await
    }
}

/// Production executor speaking to a real server.
pub struct CommandExecutor {
    config: RconConfig,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(config: RconConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self { config, timeout }
    }

    async fn deliver(&self, command: &str) -> Result<String> {
        match self.config.mode {
            RconMode::Docker => self.deliver_docker(command).await,
            RconMode::Direct => self.deliver_direct(command).await,
        }
    }

    async fn deliver_docker(&self, command: &str) -> Result<String> {
        debug!(container = %self.config.container, command, "docker exec rcon-cli");
        let output = Command::new("docker")
            .args(["exec", &self.config.container, "rcon-cli", command])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out call drops this future; the child must die with it.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BridgeError::ConnectionFailed(format!("failed to run docker: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BridgeError::Command(format!(
                "rcon-cli exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn deliver_direct(&self, command: &str) -> Result<String> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        debug!(%address, command, "rcon direct");
        let mut conn = <rcon::Connection<tokio::net::TcpStream>>::builder()
            .enable_minecraft_quirks(true)
            .connect(address.as_str(), &self.config.password)
            .await
            .map_err(map_rcon_error)?;
        let reply = conn.cmd(command).await.map_err(map_rcon_error)?;
        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    async fn send_command(&self, command: &str) -> Result<String> {
        let command = sanitize_command(command)?;
        match tokio::time::timeout(self.timeout, self.deliver(command)).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout),
        }
    }
}

fn map_rcon_error(e: rcon::Error) -> BridgeError {
    match e {
        rcon::Error::Auth => {
            BridgeError::ConnectionFailed("rcon authentication rejected".to_string())
        }
        rcon::Error::CommandTooLong => {
            BridgeError::Invalid("command exceeds rcon length limit".to_string())
        }
        rcon::Error::Io(e) => BridgeError::ConnectionFailed(e.to_string()),
    }
}
