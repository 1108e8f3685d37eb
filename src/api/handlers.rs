// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::server::AppState;
use crate::models::ModelInfo;

pub const LIVENESS_MESSAGE: &str = "Backend is running!";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

/// GET / - liveness check
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: LIVENESS_MESSAGE.to_string(),
    })
}

/// GET /models - load state of both models, without loading them
pub async fn models_handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.registry.list_models(),
    })
}
