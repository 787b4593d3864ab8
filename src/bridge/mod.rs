//! Dispatcher: routes trigger-prefixed player chat to the AI client or the
//! command executor, and posts the result back into game chat.
//!
//! Routing is string-prefix based: `@ai`, `@project`, `/cmd`, `/say`. Every
//! failure is caught here, logged, and posted into chat as a `⚠ Error: …`
//! line; one bad message never takes the bridge down. Each chat line is
//! handled in a detached task, so replies to a burst of messages may land
//! out of order.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::client::ChatClient;
use crate::error::Result;
use crate::rcon::Executor;
use crate::watcher::ChatLine;

/// System prompt for `@project` questions.
const PROJECT_SYSTEM_PROMPT: &str = "You are the resident expert on this Minecraft server's \
     world, builds, and ongoing projects. Answer in plain text, at most three short \
     sentences, suitable for game chat.";

/// Where a chat message is headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `@ai <question>`: short game-chat answer.
    Ai(String),
    /// `@project <question>`: project-context answer.
    Project(String),
    /// `/cmd <command>`: run a server command, post the reply.
    Command(String),
    /// `/say <message>`: post a chat line verbatim.
    Say(String),
}

/// Match a message against the trigger prefixes. Returns `None` for
/// ordinary chat and for bare triggers with no payload.
pub fn route(message: &str) -> Option<Route> {
    let message = message.trim();
    if let Some(rest) = strip_trigger(message, "@ai") {
        return Some(Route::Ai(rest.to_string()));
    }
    if let Some(rest) = strip_trigger(message, "@project") {
        return Some(Route::Project(rest.to_string()));
    }
    if let Some(rest) = strip_trigger(message, "/cmd") {
        return Some(Route::Command(rest.to_string()));
    }
    if let Some(rest) = strip_trigger(message, "/say") {
        return Some(Route::Say(rest.to_string()));
    }
    None
}

/// Strip `trigger` followed by whitespace and return the non-empty payload.
/// `@aid ...` must not match the `@ai` trigger.
fn strip_trigger<'a>(message: &'a str, trigger: &str) -> Option<&'a str> {
    let rest = message.strip_prefix(trigger)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

/// The chat bridge: watcher output in, AI answers and command replies out.
pub struct Bridge {
    client: Arc<ChatClient>,
    executor: Arc<dyn Executor>,
}

impl Bridge {
    pub fn new(client: Arc<ChatClient>, executor: Arc<dyn Executor>) -> Self {
        Self { client, executor }
    }

    /// Handle one chat line end to end. Never returns an error: failures are
    /// posted into game chat and swallowed.
    pub async fn handle_chat(&self, chat: &ChatLine) {
        let Some(route) = route(&chat.message) else {
            return;
        };
        debug!(player = %chat.player, ?route, "Dispatching chat trigger");
        if let Err(e) = self.dispatch(&chat.player, route).await {
            error!(player = %chat.player, error = %e, "Dispatch failed");
            if let Err(say_err) = self.executor.say(&format!("⚠ Error: {e}")).await {
                error!(error = %say_err, "Could not post error to chat");
            }
        }
    }

    async fn dispatch(&self, player: &str, route: Route) -> Result<()> {
        match route {
            Route::Ai(question) => {
                let reply = self.client.ask_game(&question, player).await?;
                self.executor.say(&format!("{player}: {reply}")).await?;
            }
            Route::Project(question) => {
                let reply = self
                    .client
                    .ask(&question, Some(PROJECT_SYSTEM_PROMPT), &[], true)
                    .await?;
                self.executor.say(&format!("{player}: {reply}")).await?;
            }
            Route::Command(command) => {
                let reply = self.executor.send_command(&command).await?;
                let reply = if reply.is_empty() {
                    "(no output)".to_string()
                } else {
                    reply
                };
                self.executor.say(&reply).await?;
            }
            Route::Say(message) => {
                self.executor.say(&message).await?;
            }
        }
        Ok(())
    }

    /// Receive chat lines until shutdown. Each line runs in a detached task:
    /// no ordering, no back-pressure. In-flight tasks finish on their own
    /// after shutdown is signalled.
    pub async fn run(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<ChatLine>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("Bridge dispatcher running");
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Bridge shutting down");
                        return;
                    }
                }
                chat = rx.recv() => {
                    let Some(chat) = chat else {
                        info!("Chat channel closed, bridge stopping");
                        return;
                    };
                    let bridge = self.clone();
                    tokio::spawn(async move { bridge.handle_chat(&chat).await });
                }
            }
        }
    }
}
