mod app;
mod client;
mod config;
mod error;
mod export;
mod filter;
mod form;
mod store;
mod sync;
#[cfg(test)]
mod testing;
mod ui;

use std::{fs::OpenOptions, sync::Mutex};

use crate::{config::AppConfig, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_tracing(&config)?;
    tracing::info!(base_url = %config.base_url, prefix = %config.api_prefix, "starting");

    let mut app = app::App::new(config)?;
    app.run().await?;
    Ok(())
}

/// The terminal belongs to the UI, so logs go to a file or nowhere.
fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = format!("cashbook_tui={level}", level = config.log_level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false);

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}
