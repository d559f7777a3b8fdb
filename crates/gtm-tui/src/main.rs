use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use gtm_core::{Config, GtmClient};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod clipboard;
mod handler;
mod tui;
mod ui;

use app::App;
use cli::Cli;
use tui::{EventHandler, Tui};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gtm=info"))
}

/// The TUI owns the terminal, so its logs go to a file in the config dir
fn init_file_logging() -> Result<()> {
    let dir = Config::config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("gtm.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {}", e);
        Config::new()
    });
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let client = GtmClient::new(&api_url);

    match cli.command {
        Some(command) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .init();
            cli::run(command, &client, config).await
        }
        None => {
            if let Err(e) = init_file_logging() {
                eprintln!("Logging disabled: {}", e);
            }
            run_tui(client, &config).await
        }
    }
}

async fn run_tui(client: GtmClient, config: &Config) -> Result<()> {
    let api_url = client.base_url().to_string();
    tracing::info!("starting TUI against {}", api_url);

    let mut app = App::new(Arc::new(client), api_url, config.default_channel);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    app.start();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await,
            None => break,
        }
    }
    Ok(())
}
