//! craftbridge: AI chat bridge for Minecraft servers.
//!
//! Tails the server's chat log, routes trigger-prefixed player messages
//! (`@ai`, `@project`, `/cmd`, `/say`) to a hosted chat-completions API or
//! the server's RCON control channel, and relays replies back into game
//! chat.
//!
//! The pieces, in data-flow order:
//! - [`watcher`] tails the log, parses chat lines, and drops duplicates.
//! - [`bridge`] dispatches each line by prefix.
//! - [`client`] answers questions via a [`providers::ChatProvider`], with a
//!   response [`cache`] and rolling [`stats`].
//! - [`rcon`] delivers commands to the server (docker exec or direct RCON).

pub mod bridge;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod rcon;
pub mod stats;
pub mod watcher;

pub use error::{BridgeError, Result};
