//! Error types for craftbridge.
//!
//! One closed enum for the whole crate so callers can match on variants
//! instead of inspecting message text. The bridge converts any of these
//! into a chat-visible `⚠ Error: …` line at the dispatch site.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// All failure modes of the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An HTTP request or command delivery exceeded its configured time limit.
    #[error("request timed out")]
    Timeout,

    /// The chat-completions endpoint answered with a non-2xx status.
    #[error("API returned HTTP {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// The API reply could not be parsed or contained no completion.
    #[error("malformed API response: {0}")]
    Malformed(String),

    /// TCP connect, TLS handshake, RCON auth, or process spawn failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The command executor ran but reported failure (non-zero exit, stderr).
    #[error("command failed: {0}")]
    Command(String),

    /// Caller-supplied input was rejected before any IO happened.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Configuration is missing or unusable.
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem error (log file, config file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
