//! Relay - binary entry point.
//!
//! Loads `.env` and the optional config file, resolves secrets, then hands a
//! [`relay_engine::Controller`] to the Telegram dispatcher in [`telegram`].
//!
//! ```text
//! main() -> ResolvedConfig -> OpenAIGateway + TelegramTransport -> Controller
//!                                                                     |
//!                                             Dispatcher (long polling) -> handle(event)
//! ```

mod telegram;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use relay_config::{RelayConfig, ResolvedConfig};
use relay_engine::{ApiConfig, OpenAIGateway};
use relay_providers::DEFAULT_MODEL;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Completion API settings from resolved config, with defaults filled in.
fn api_config(resolved: &ResolvedConfig) -> Result<ApiConfig> {
    let model = resolved
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let config = ApiConfig::new(resolved.api_key.clone(), model)?;
    Ok(match &resolved.base_url {
        Some(base_url) => config.with_base_url(base_url.clone()),
        None => config,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load before tracing so RUST_LOG from .env applies.
    let dotenv = dotenv::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => tracing::debug!("No .env file found"),
        Err(err) => tracing::warn!(%err, "Failed to load .env"),
    }

    let config = RelayConfig::load().context("failed to load config file")?;
    if config.is_none() {
        tracing::debug!("No config file; using environment only");
    }
    let resolved = ResolvedConfig::resolve(config.as_ref())?;
    let api = api_config(&resolved)?;
    tracing::info!(
        model = api.model(),
        base_url = api.base_url(),
        "Completion API configured"
    );

    telegram::run(&resolved.bot_token, OpenAIGateway::new(api)).await
}
