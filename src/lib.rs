// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod translation;
pub mod version;
pub mod vision;

// Re-export main types
pub use api::{create_router, ApiServer, AppState};
pub use config::{CaptionFailurePolicy, ServiceConfig};
pub use models::{CaptionModel, ModelRegistry, TranslationModel};
pub use pipeline::{RequestOrchestrator, ResponseEnvelope};
