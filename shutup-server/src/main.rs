use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use shutup_common::models::ShutupConfig;
use shutup_common::traits::{DisplayDecoration, MessageEvent};
use shutup_core::ShutupPlugin;
use shutup_core::services::EventHandlerRegistry;

mod console;
use console::{ConsoleDisplay, parse_line};

#[derive(Parser, Debug, Clone)]
#[command(name = "shutup")]
#[command(author, version, about = "Per-conversation mute gate for chat bots, driven from stdin")]
struct Args {
    /// JSON config file. Falls back to $SHUTUP_CONFIG, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where silence_map.json lives. Falls back to $SHUTUP_DATA_DIR, then the
    /// platform data dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable display-label decoration against an in-memory console display
    #[arg(long, default_value = "false")]
    decorate: bool,

    /// Platform id of the bot, used for `@self` mentions
    #[arg(long, default_value = "shutup-bot")]
    self_id: String,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("shutup=info".parse().unwrap_or_default());
    let sub = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", e);
    }
}

fn resolve_config(args: &Args) -> ShutupConfig {
    let path = args
        .config
        .clone()
        .or_else(|| std::env::var_os("SHUTUP_CONFIG").map(PathBuf::from));

    let mut config = match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            ShutupConfig::load(&path)
        }
        None => ShutupConfig::default().validated(),
    };
    if args.decorate {
        config.group_card_enabled = true;
    }
    config
}

fn resolve_data_dir(args: &Args) -> PathBuf {
    args.data_dir
        .clone()
        .or_else(|| std::env::var_os("SHUTUP_DATA_DIR").map(PathBuf::from))
        .or_else(|| dirs::data_local_dir().map(|d| d.join("shutup")))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let config = resolve_config(&args);
    let data_dir = resolve_data_dir(&args);
    info!("shutup starting. data_dir={}, decorate={}", data_dir.display(), config.group_card_enabled);

    let plugin = ShutupPlugin::start(config, &data_dir).await;
    let registry = EventHandlerRegistry::new();
    let registration = plugin.registration();
    registry
        .register_with_priority(registration.handler, registration.priority)
        .await?;

    let display: Option<Arc<dyn DisplayDecoration>> = if args.decorate {
        Some(Arc::new(ConsoleDisplay::new(&args.self_id)))
    } else {
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let Some(mut event) = parse_line(&line, &args.self_id) else {
                            continue;
                        };
                        if let Some(display) = &display {
                            event = event.with_decoration(display.clone());
                        }
                        registry.dispatch(&event).await;

                        let replies = event.replies();
                        if !replies.is_empty() {
                            for reply in replies {
                                println!("REPLY {} {}", event.conversation_id(), reply);
                            }
                        } else if !event.should_call_llm() {
                            println!("SUPPRESS {}", event.conversation_id());
                        } else {
                            println!("ADMIT {}", event.conversation_id());
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        }
    }

    plugin.terminate().await;
    registry.clear().await;
    info!("Main finished. Goodbye!");
    Ok(())
}
