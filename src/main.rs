// Main entry point - Dependency injection and command dispatch
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_device::HttpDevice;
use crate::presentation::cli::Cli;
use crate::presentation::commands::Dashboard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = load_dashboard_config(cli.config.as_deref())
        .context("Failed to load dashboard configuration")?;
    if let Some(device) = cli.device {
        config.device.base_url = device;
    }
    tracing::debug!("Using device at {}", config.device.base_url);

    // Create device client (infrastructure layer)
    let device = Arc::new(
        HttpDevice::new(
            &config.device.base_url,
            config.request_timeout(),
            config.download_timeout(),
        )
            .context("Failed to build HTTP client")?,
    );

    Dashboard::new(config, device).run(cli.command).await
}
