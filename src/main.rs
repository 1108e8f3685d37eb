// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use caption_translate_node::{
    api::{ApiServer, AppState},
    cli::Cli,
    version,
};
use clap::Parser;
use std::env;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = Cli::parse().into_config();

    info!("🚀 Starting {}", version::get_version_string());
    info!("Features: {}", version::FEATURES.join(", "));
    info!("Caption model: {}", config.models.caption_model_dir.display());
    info!(
        "Translation model: {}",
        config.models.translation_model_dir.display()
    );
    info!("Caption failure policy: {:?}", config.caption_failure_policy);

    let state = AppState::from_config(&config);

    if config.preload_models {
        info!("Preloading models...");
        let registry = state.registry.clone();
        match tokio::task::spawn_blocking(move || registry.preload()).await {
            Ok(Ok(())) => info!("✅ Models preloaded"),
            Ok(Err(e)) => warn!("⚠️  Preload failed, requests will report it: {}", e),
            Err(e) => error!("Preload task failed: {}", e),
        }
    }

    let server = ApiServer::new(config.api.clone(), state);
    server
        .serve(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("⏹️  Shutting down...");
        })
        .await
}
