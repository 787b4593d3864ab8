//! Chat log line parser.
//!
//! Isolated from the rest of the watcher so the regex can be tested without
//! touching the filesystem. Matches the vanilla server chat format with any
//! number of leading bracket groups, with or without the `[Not Secure]`
//! marker chat-report-aware servers insert:
//!
//! ```text
//! [20:49:26 INFO]: [Not Secure] <alice> console hello
//! [12:34:56] [Server thread/INFO]: <bob> hi there
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// A player chat message extracted from one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub player: String,
    pub message: String,
}

static CHAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\[[^\]]*\]:?\s*)+<(\w+)>\s?(.*)$").unwrap());

/// Parse one log line into a [`ChatLine`], or `None` for anything that is
/// not player chat (join/leave notices, server output, stack traces).
pub fn parse_chat_line(line: &str) -> Option<ChatLine> {
    let caps = CHAT_RE.captures(line.trim_end())?;
    Some(ChatLine {
        player: caps[1].to_string(),
        message: caps[2].to_string(),
    })
}
