mod app;
mod cli;
mod handler;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{anyhow, bail, Result};
use clap::Parser;
use tracing::info;
use iq_chat_core::{ApiClient, Config, Conversation};

use app::App;
use cli::{Cli, Command, ConfigAction};
use tui::{EventHandler, Tui};

/// Initialize file logging. Returns a guard that must be held for the app lifetime.
fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, EnvFilter, prelude::*};

    let logs_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("iq-chat")
        .join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "iq-chat.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,iq_chat=debug,iq_chat_core=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Terminal belongs to the UI, so logs go to a file
    let _log_guard = init_logging();

    let config = Config::load()?;
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    info!(version = env!("CARGO_PKG_VERSION"), %api_url, "iq-chat starting");

    let conversation = match cli.conversation_id {
        Some(id) => Conversation::with_conversation_id(id),
        None => Conversation::new(),
    };

    match cli.command {
        None => run_tui(&api_url, conversation).await,
        Some(Command::Ask { message }) => ask(&api_url, conversation, &message).await,
        Some(Command::Config { action }) => run_config(config, action, &api_url),
    }
}

async fn run_tui(api_url: &str, conversation: Conversation) -> Result<()> {
    let backend = Arc::new(ApiClient::new(api_url));
    let mut app = App::new(backend, api_url, conversation);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!(messages = app.messages().len(), "iq-chat exiting");
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

async fn ask(api_url: &str, mut conversation: Conversation, message: &str) -> Result<()> {
    let client = ApiClient::new(api_url);

    match conversation.send(&client, message).await {
        None => bail!("Message is empty"),
        Some(Err(e)) => {
            if let Some(reply) = conversation.messages().last() {
                eprintln!("{}", reply.content);
            }
            Err(anyhow!(e).context(format!("Is the backend running at {}?", api_url)))
        }
        Some(Ok(())) => {
            if let Some(reply) = conversation.messages().last() {
                println!("{}", reply.content);

                let sources = reply.sources();
                if !sources.is_empty() {
                    println!("\nSources:");
                    for citation in sources {
                        println!("  • {}", citation.source);
                    }
                }
            }
            if let Some(id) = conversation.conversation_id() {
                println!("\nconversation: {}", id);
            }
            Ok(())
        }
    }
}

fn run_config(mut config: Config, action: ConfigAction, api_url: &str) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("api_url: {}", api_url);
            println!("config:  {}", Config::config_path()?.display());
        }
        ConfigAction::SetUrl { url } => {
            let url = url.trim().to_string();
            if url.is_empty() {
                bail!("URL must not be empty");
            }
            config.api_url = Some(url.clone());
            config.save()?;
            info!(%url, "saved api url");
            println!("Saved api_url: {}", url);
        }
    }
    Ok(())
}
