//! Caching chat client, the bridge's one entry point to the LLM.
//!
//! Wraps a [`ChatProvider`] with the response cache and rolling request
//! statistics. Both live behind mutexes: callers run on a multi-threaded
//! runtime, so the shared maps cannot be mutated bare. Constructed once at
//! startup and passed around by `Arc`; no globals.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::debug;

use crate::cache::{CacheStats, ResponseCache};
use crate::config::{CacheConfig, ProviderConfig};
use crate::error::{BridgeError, Result};
use crate::providers::{ChatOptions, ChatProvider, Message};
use crate::stats::RequestStats;

/// System prompt injected by [`ChatClient::ask_game`].
const GAME_SYSTEM_PROMPT: &str = "You are a helpful assistant living in a Minecraft server's \
     game chat. Answer the player's question in plain text with no markdown, and keep it \
     short, two sentences at most. It has to fit in chat.";

/// Chat-completions client with response caching and request statistics.
pub struct ChatClient {
    provider: Arc<dyn ChatProvider>,
    model: String,
    defaults: ChatOptions,
    game_options: ChatOptions,
    cache_enabled: bool,
    cache: Mutex<ResponseCache>,
    stats: Mutex<RequestStats>,
}

impl ChatClient {
    /// Build a client over the given provider using the configured model,
    /// token caps, and cache capacity.
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        provider_config: &ProviderConfig,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            provider,
            model: provider_config.model.clone(),
            defaults: ChatOptions {
                max_tokens: Some(provider_config.max_tokens),
                temperature: Some(provider_config.temperature),
            },
            game_options: ChatOptions {
                max_tokens: Some(provider_config.game_max_tokens),
                temperature: Some(provider_config.temperature),
            },
            cache_enabled: cache_config.enabled,
            cache: Mutex::new(ResponseCache::new(cache_config.max_entries)),
            stats: Mutex::new(RequestStats::default()),
        }
    }

    /// Send `prompt` (plus optional system instructions and prior turns) and
    /// return the assistant's text.
    ///
    /// With `use_cache`, a previously seen (model, system, prompt) triple is
    /// answered from the cache: counted as a hit, latency recorded as 0, no
    /// HTTP call made. On a miss exactly one request is issued; the reply is
    /// cached only on success, so failed prompts are retried naturally on
    /// the next ask.
    pub async fn ask(
        &self,
        prompt: &str,
        system: Option<&str>,
        history: &[Message],
        use_cache: bool,
    ) -> Result<String> {
        self.ask_with_options(prompt, system, history, use_cache, &self.defaults)
            .await
    }

    /// Same as [`ask`](Self::ask) with the fixed game-chat system prompt and
    /// the tighter `game_max_tokens` cap. `player` is folded into the prompt
    /// so the model can address the asker.
    pub async fn ask_game(&self, question: &str, player: &str) -> Result<String> {
        let prompt = format!("{player} asks: {question}");
        self.ask_with_options(&prompt, Some(GAME_SYSTEM_PROMPT), &[], true, &self.game_options)
            .await
    }

    async fn ask_with_options(
        &self,
        prompt: &str,
        system: Option<&str>,
        history: &[Message],
        use_cache: bool,
        options: &ChatOptions,
    ) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(BridgeError::Invalid("empty prompt".to_string()));
        }

        let key = ResponseCache::cache_key(&self.model, system.unwrap_or(""), prompt);

        if use_cache && self.cache_enabled {
            let cached = self.cache.lock().expect("cache lock poisoned").get(&key);
            if let Some(response) = cached {
                debug!(key = %&key[..8], "Cache hit");
                self.stats
                    .lock()
                    .expect("stats lock poisoned")
                    .record(0.0, true);
                return Ok(response);
            }
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(system) = system {
            messages.push(Message::system(system));
        }
        messages.extend_from_slice(history);
        messages.push(Message::user(prompt));

        let started = Instant::now();
        let response = self.provider.chat(&messages, &self.model, options).await?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        debug!(
            provider = self.provider.name(),
            latency_ms, "Chat completion finished"
        );

        if use_cache && self.cache_enabled {
            self.cache
                .lock()
                .expect("cache lock poisoned")
                .put(key, response.clone());
        }
        self.stats
            .lock()
            .expect("stats lock poisoned")
            .record(latency_ms, false);

        Ok(response)
    }

    /// Snapshot of the rolling request statistics.
    pub fn stats(&self) -> RequestStats {
        self.stats.lock().expect("stats lock poisoned").clone()
    }

    /// Snapshot of the cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().expect("cache lock poisoned").stats()
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.cache.lock().expect("cache lock poisoned").clear();
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }
}
