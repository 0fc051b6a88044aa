//! services/app/src/bin/doclens.rs

use std::io;
use std::sync::Arc;
use std::time::Duration;

use app_lib::{
    adapters::{http::HttpBackend, storage::FileProfileStorage},
    config::Config,
    error::AppError,
    tui::{app::App, services::Services},
};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    // Stdout belongs to the terminal UI, so logs go to a file in the data
    // directory.
    let config = Arc::new(Config::from_env()?);
    std::fs::create_dir_all(&config.data_dir)?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.data_dir.join("doclens.log"))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();
    info!("Configuration loaded. Connecting to {}", config.api_base_url);

    // --- 2. Initialize Port Adapters ---
    let backend = Arc::new(HttpBackend::new(
        config.api_base_url.clone(),
        config.request_timeout,
    )?);
    let storage = Arc::new(FileProfileStorage::open(&config.data_dir)?);

    // --- 3. Build the Shared Services ---
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let services = Services::new(config.clone(), backend, storage, event_tx);

    // --- 4. Set Up the Terminal ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;

    // --- 5. Run the Event Loop ---
    let mut app = App::new(services, event_rx);
    let result = app.run(&mut terminal, Duration::from_millis(250)).await;

    // --- 6. Restore the Terminal ---
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    info!("Client shut down cleanly");
    Ok(())
}
