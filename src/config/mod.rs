//! Configuration for craftbridge.
//!
//! One `Config` struct owns every knob (timeouts, token caps, cache size,
//! RCON coordinates) so no call site carries its own constants. Loaded from
//! `~/.craftbridge/config.json` (all fields optional, missing sections take
//! defaults), then overridden by `CRAFTBRIDGE_*` environment variables.
//! `.env` files are honored via dotenvy in `main`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Chat-completions provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key. Also read from `CRAFTBRIDGE_API_KEY` / `OPENROUTER_API_KEY`.
    pub api_key: String,
    /// Base URL of the chat-completions API.
    pub api_base: String,
    /// Model identifier sent in every request.
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Token cap for general `ask` calls.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Tighter token cap for in-game answers (`ask_game`).
    pub game_max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://openrouter.ai/api/v1".to_string(),
            model: "x-ai/grok-beta".to_string(),
            timeout_secs: 30,
            max_tokens: 1024,
            temperature: 0.7,
            game_max_tokens: 150,
        }
    }
}

/// How commands reach the game server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RconMode {
    /// `docker exec <container> rcon-cli <command>`.
    #[default]
    Docker,
    /// Direct RCON connection (host/port/password), one connection per call.
    Direct,
}

/// Command executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RconConfig {
    /// Delivery strategy.
    pub mode: RconMode,
    /// Container name for docker delivery.
    pub container: String,
    /// RCON host for direct delivery.
    pub host: String,
    /// RCON port for direct delivery.
    pub port: u16,
    /// RCON password for direct delivery.
    pub password: String,
    /// Per-command timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            mode: RconMode::Docker,
            container: "minecraft".to_string(),
            host: "127.0.0.1".to_string(),
            port: 25575,
            password: String::new(),
            timeout_secs: 5,
        }
    }
}

/// Log watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Path to the server log being tailed.
    pub log_path: PathBuf,
    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Window within which a repeated (player, message) pair is dropped.
    pub dedup_window_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("logs/latest.log"),
            poll_interval_ms: 500,
            dedup_window_secs: 5,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether `ask` consults the cache at all.
    pub enabled: bool,
    /// Capacity before LRU eviction kicks in.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 256,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub rcon: RconConfig,
    pub watcher: WatcherConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Default config file location: `~/.craftbridge/config.json`.
    pub fn path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".craftbridge")
            .join("config.json")
    }

    /// Load from the default path (missing file → defaults), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&Self::path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_path(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a config file. A missing file yields the defaults; a present
    /// but unparseable file is an error rather than a silent fallback.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    /// Apply `CRAFTBRIDGE_*` (and `OPENROUTER_API_KEY`) overrides from the
    /// process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Separated from the environment
    /// so tests don't have to mutate process globals.
    pub fn apply_overrides_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("CRAFTBRIDGE_API_KEY").or_else(|| get("OPENROUTER_API_KEY")) {
            self.provider.api_key = v;
        }
        if let Some(v) = get("CRAFTBRIDGE_API_BASE") {
            self.provider.api_base = v;
        }
        if let Some(v) = get("CRAFTBRIDGE_MODEL") {
            self.provider.model = v;
        }
        if let Some(v) = get("CRAFTBRIDGE_RCON_MODE") {
            match v.to_lowercase().as_str() {
                "docker" => self.rcon.mode = RconMode::Docker,
                "direct" => self.rcon.mode = RconMode::Direct,
                other => tracing::warn!("Ignoring unknown CRAFTBRIDGE_RCON_MODE '{}'", other),
            }
        }
        if let Some(v) = get("CRAFTBRIDGE_RCON_CONTAINER") {
            self.rcon.container = v;
        }
        if let Some(v) = get("CRAFTBRIDGE_RCON_HOST") {
            self.rcon.host = v;
        }
        if let Some(v) = get("CRAFTBRIDGE_RCON_PORT") {
            match v.parse() {
                Ok(port) => self.rcon.port = port,
                Err(_) => tracing::warn!("Ignoring non-numeric CRAFTBRIDGE_RCON_PORT '{}'", v),
            }
        }
        if let Some(v) = get("CRAFTBRIDGE_RCON_PASSWORD") {
            self.rcon.password = v;
        }
        if let Some(v) = get("CRAFTBRIDGE_LOG_PATH") {
            self.watcher.log_path = PathBuf::from(v);
        }
        if let Some(v) = get("CRAFTBRIDGE_CACHE_MAX_ENTRIES") {
            match v.parse() {
                Ok(n) => self.cache.max_entries = n,
                Err(_) => {
                    tracing::warn!("Ignoring non-numeric CRAFTBRIDGE_CACHE_MAX_ENTRIES '{}'", v)
                }
            }
        }
    }

    /// Fail early when the provider section cannot possibly work.
    pub fn require_api_key(&self) -> Result<()> {
        if self.provider.api_key.is_empty() {
            return Err(BridgeError::Config(
                "no API key configured; set CRAFTBRIDGE_API_KEY or provider.api_key".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let cfg = ProviderConfig::default();
        assert_eq!(cfg.api_base, "https://openrouter.ai/api/v1");
        assert_eq!(cfg.model, "x-ai/grok-beta");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_tokens, 1024);
        assert_eq!(cfg.game_max_tokens, 150);
    }

    #[test]
    fn test_rcon_defaults() {
        let cfg = RconConfig::default();
        assert_eq!(cfg.mode, RconMode::Docker);
        assert_eq!(cfg.container, "minecraft");
        assert_eq!(cfg.port, 25575);
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn test_rcon_mode_serde_roundtrip() {
        let mode: RconMode = serde_json::from_str(r#""direct""#).unwrap();
        assert_eq!(mode, RconMode::Direct);
        let back = serde_json::to_string(&mode).unwrap();
        assert_eq!(back, r#""direct""#);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let json = r#"{"provider": {"model": "x-ai/grok-2-1212"}, "cache": {"max_entries": 32}}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.provider.model, "x-ai/grok-2-1212");
        assert_eq!(cfg.provider.timeout_secs, 30); // default
        assert_eq!(cfg.cache.max_entries, 32);
        assert!(cfg.cache.enabled); // default
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let cfg = Config::load_from_path(Path::new("/nonexistent/craftbridge.json")).unwrap();
        assert_eq!(cfg.rcon.port, 25575);
    }

    #[test]
    fn test_load_rejects_corrupt_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "{not json").unwrap();
        let err = Config::load_from_path(tmp.path()).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(|key| match key {
            "CRAFTBRIDGE_API_KEY" => Some("sk-test".to_string()),
            "CRAFTBRIDGE_RCON_MODE" => Some("direct".to_string()),
            "CRAFTBRIDGE_RCON_PORT" => Some("25580".to_string()),
            "CRAFTBRIDGE_LOG_PATH" => Some("/srv/mc/logs/latest.log".to_string()),
            _ => None,
        });
        assert_eq!(cfg.provider.api_key, "sk-test");
        assert_eq!(cfg.rcon.mode, RconMode::Direct);
        assert_eq!(cfg.rcon.port, 25580);
        assert_eq!(cfg.watcher.log_path, PathBuf::from("/srv/mc/logs/latest.log"));
    }

    #[test]
    fn test_env_override_falls_back_to_openrouter_key() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(|key| match key {
            "OPENROUTER_API_KEY" => Some("sk-or-fallback".to_string()),
            _ => None,
        });
        assert_eq!(cfg.provider.api_key, "sk-or-fallback");
    }

    #[test]
    fn test_bad_port_override_ignored() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(|key| {
            (key == "CRAFTBRIDGE_RCON_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(cfg.rcon.port, 25575);
    }

    #[test]
    fn test_require_api_key() {
        let mut cfg = Config::default();
        assert!(cfg.require_api_key().is_err());
        cfg.provider.api_key = "sk-test".to_string();
        assert!(cfg.require_api_key().is_ok());
    }
}
