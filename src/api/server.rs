// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{models_handler, root_handler};
use super::upload_image::upload_image_handler;
use crate::config::{ApiConfig, ServiceConfig};
use crate::models::ModelRegistry;
use crate::pipeline::{CaptionGenerator, RequestOrchestrator};
use crate::storage::{SingleSlotStore, TempFileStore, UploadStore};
use crate::translation::Translator;

/// Shared application context handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RequestOrchestrator>,
    pub registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(orchestrator: Arc<RequestOrchestrator>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            orchestrator,
            registry,
        }
    }

    /// Wire the registry, upload store and orchestrator from configuration
    pub fn from_config(config: &ServiceConfig) -> Self {
        let registry = Arc::new(ModelRegistry::from_config(&config.models));

        let store: Arc<dyn UploadStore> = match &config.uploads.shared_upload_path {
            Some(path) => {
                info!("Uploads share a single slot at {}", path.display());
                Arc::new(SingleSlotStore::new(path.clone()))
            }
            None => {
                let store = TempFileStore::new(config.uploads.upload_dir.clone());
                info!("Uploads go to per-request files in {}", store.dir().display());
                Arc::new(store)
            }
        };

        // Whatever the HTTP layer accepts, the caption stage must be able to read
        let captioner = CaptionGenerator::new(registry.clone())
            .with_max_image_bytes(config.api.max_upload_bytes);
        let orchestrator = Arc::new(RequestOrchestrator::new(
            store,
            captioner,
            Translator::new(registry.clone()),
            config.caption_failure_policy,
        ));

        Self::new(orchestrator, registry)
    }
}

/// Build the HTTP router
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/upload-image/", post(upload_image_handler))
        .route("/models", get(models_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    config: ApiConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ApiConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.config.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.listen_addr))?;
        let addr: SocketAddr = listener.local_addr()?;

        info!("HTTP server listening on http://{}", addr);

        let app = create_router(self.state, self.config.max_upload_bytes);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error")?;

        info!("HTTP server stopped");
        Ok(())
    }
}
