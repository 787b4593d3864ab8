//! CLI argument definitions and command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use craftbridge::bridge::Bridge;
use craftbridge::client::ChatClient;
use craftbridge::config::{Config, RconMode};
use craftbridge::providers::OpenRouterProvider;
use craftbridge::rcon::{CommandExecutor, Executor};
use craftbridge::watcher::LogWatcher;

#[derive(Parser)]
#[command(
    name = "craftbridge",
    version,
    about = "AI chat bridge for Minecraft servers"
)]
pub struct Cli {
    /// Alternate config file (default: ~/.craftbridge/config.json).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Tail the server log and answer chat triggers until Ctrl-C.
    Run,
    /// Ask the model a one-shot question and print the reply.
    Ask {
        /// The prompt to send.
        #[arg(required = true)]
        prompt: Vec<String>,
        /// Optional system instructions.
        #[arg(long)]
        system: Option<String>,
        /// Bypass the response cache for this call.
        #[arg(long)]
        no_cache: bool,
    },
    /// Send one command to the server and print the reply.
    Cmd {
        #[arg(required = true)]
        command: Vec<String>,
    },
    /// Post a chat line into the game.
    Say {
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Show the resolved configuration (secrets elided).
    Status,
}

pub async fn execute(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_with_overrides(path)?,
        None => Config::load()?,
    };
    match cli.command {
        Command::Run => cmd_run(config).await,
        Command::Ask {
            prompt,
            system,
            no_cache,
        } => cmd_ask(config, prompt.join(" "), system, no_cache).await,
        Command::Cmd { command } => cmd_cmd(config, command.join(" ")).await,
        Command::Say { message } => cmd_say(config, message.join(" ")).await,
        Command::Status => cmd_status(config),
    }
}

fn build_client(config: &Config) -> Arc<ChatClient> {
    let provider = Arc::new(OpenRouterProvider::from_config(&config.provider));
    Arc::new(ChatClient::new(provider, &config.provider, &config.cache))
}

/// Run the bridge: watcher → dispatcher → game chat.
async fn cmd_run(config: Config) -> Result<()> {
    config.require_api_key()?;

    let client = build_client(&config);
    let executor: Arc<dyn Executor> = Arc::new(CommandExecutor::new(config.rcon.clone()));
    let bridge = Arc::new(Bridge::new(client.clone(), executor));

    let (chat_tx, chat_rx) = tokio::sync::mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let watcher = LogWatcher::new(&config.watcher);
    let watcher_handle = tokio::spawn(watcher.watch(chat_tx, shutdown_rx.clone()));
    let bridge_handle = tokio::spawn(bridge.run(chat_rx, shutdown_rx));

    println!(
        "Bridging {} (Ctrl-C to stop)",
        config.watcher.log_path.display()
    );
    tokio::signal::ctrl_c().await?;
    println!();

    shutdown_tx.send(true).ok();
    let _ = watcher_handle.await;
    let _ = bridge_handle.await;

    let stats = client.stats();
    if stats.total_requests > 0 {
        println!("{}", stats.summary());
    }
    Ok(())
}

async fn cmd_ask(
    config: Config,
    prompt: String,
    system: Option<String>,
    no_cache: bool,
) -> Result<()> {
    config.require_api_key()?;
    let client = build_client(&config);
    let reply = client
        .ask(&prompt, system.as_deref(), &[], !no_cache)
        .await?;
    println!("{reply}");
    Ok(())
}

async fn cmd_cmd(config: Config, command: String) -> Result<()> {
    let executor = CommandExecutor::new(config.rcon);
    let reply = executor.send_command(&command).await?;
    if reply.is_empty() {
        println!("(no output)");
    } else {
        println!("{reply}");
    }
    Ok(())
}

async fn cmd_say(config: Config, message: String) -> Result<()> {
    let executor = CommandExecutor::new(config.rcon);
    executor.say(&message).await?;
    println!("Posted.");
    Ok(())
}

fn cmd_status(config: Config) -> Result<()> {
    println!("craftbridge configuration");
    println!();
    println!("Provider:");
    println!("  endpoint:   {}", config.provider.api_base);
    println!("  model:      {}", config.provider.model);
    println!(
        "  api key:    {}",
        if config.provider.api_key.is_empty() {
            "missing (set CRAFTBRIDGE_API_KEY)"
        } else {
            "set"
        }
    );
    println!(
        "  timeouts:   {}s request, {}/{} tokens (game/general)",
        config.provider.timeout_secs, config.provider.game_max_tokens, config.provider.max_tokens
    );
    println!();
    println!("Command delivery:");
    match config.rcon.mode {
        RconMode::Docker => {
            println!("  mode:       docker exec");
            println!("  container:  {}", config.rcon.container);
        }
        RconMode::Direct => {
            println!("  mode:       direct rcon");
            println!("  address:    {}:{}", config.rcon.host, config.rcon.port);
            println!(
                "  password:   {}",
                if config.rcon.password.is_empty() {
                    "missing"
                } else {
                    "set"
                }
            );
        }
    }
    println!("  timeout:    {}s per command", config.rcon.timeout_secs);
    println!();
    println!("Watcher:");
    println!("  log:        {}", config.watcher.log_path.display());
    println!(
        "  poll:       {}ms, dedup window {}s",
        config.watcher.poll_interval_ms, config.watcher.dedup_window_secs
    );
    println!();
    println!("Cache:");
    if config.cache.enabled {
        println!("  enabled, {} entries max", config.cache.max_entries);
    } else {
        println!("  disabled");
    }
    Ok(())
}
