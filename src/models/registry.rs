// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lazily-initialized model handles shared across requests
//!
//! Each model is constructed at most once per process. Concurrent first
//! accesses block on the same initialization; the outcome, success or failure,
//! is cached. A failed load, panics included, is never retried.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

use super::{CaptionModel, TranslationModel};
use crate::config::ModelConfig;
use crate::translation::nllb::NllbTranslationModel;
use crate::vision::blip::BlipCaptionModel;

pub const CAPTION_MODEL_NAME: &str = "blip-caption";
pub const TRANSLATION_MODEL_NAME: &str = "nllb-200";

/// A model could not be constructed from its artifacts
#[derive(Debug, Clone, Error)]
#[error("model unavailable: {model} ({reason})")]
pub struct ModelUnavailable {
    pub model: &'static str,
    pub reason: String,
}

/// Load state of a model, reported without triggering a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    NotLoaded,
    Ready,
    Unavailable,
}

/// Information about a registered model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name
    pub name: String,
    /// Model kind (caption, translation)
    pub kind: String,
    pub status: ModelStatus,
}

type Loader<M> = Box<dyn Fn() -> Result<Arc<M>> + Send + Sync>;

/// A model handle created on first use
pub struct LazyModel<M: ?Sized> {
    name: &'static str,
    loader: Loader<M>,
    cell: OnceLock<Result<Arc<M>, ModelUnavailable>>,
}

impl<M: ?Sized> LazyModel<M> {
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<M>> + Send + Sync + 'static,
    {
        Self {
            name,
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the model, constructing it on the first call
    pub fn get(&self) -> Result<Arc<M>, ModelUnavailable> {
        self.cell
            .get_or_init(|| {
                info!("Loading {} model...", self.name);
                let start = Instant::now();
                // Panics are cached as failures too
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.loader)()))
                    .unwrap_or_else(|payload| {
                        Err(anyhow::anyhow!(
                            "loader panicked: {}",
                            panic_message(payload.as_ref())
                        ))
                    });
                match outcome {
                    Ok(model) => {
                        info!(
                            "✅ {} model ready in {}ms",
                            self.name,
                            start.elapsed().as_millis()
                        );
                        Ok(model)
                    }
                    Err(e) => {
                        error!("❌ {} model unavailable: {:#}", self.name, e);
                        Err(ModelUnavailable {
                            model: self.name,
                            reason: format!("{:#}", e),
                        })
                    }
                }
            })
            .clone()
    }

    pub fn status(&self) -> ModelStatus {
        match self.cell.get() {
            None => ModelStatus::NotLoaded,
            Some(Ok(_)) => ModelStatus::Ready,
            Some(Err(_)) => ModelStatus::Unavailable,
        }
    }
}

/// Text carried by a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Registry holding the captioning and translation models
///
/// Owned by the application context and shared behind an `Arc`.
pub struct ModelRegistry {
    caption: LazyModel<dyn CaptionModel>,
    translation: LazyModel<dyn TranslationModel>,
}

impl ModelRegistry {
    /// Registry backed by the ONNX models in the configured directories
    pub fn from_config(config: &ModelConfig) -> Self {
        let caption_dir = config.caption_model_dir.clone();
        let translation_dir = config.translation_model_dir.clone();
        let intra_threads = config.intra_threads;

        Self::with_loaders(
            move || {
                let model = BlipCaptionModel::load(&caption_dir, intra_threads)?;
                Ok(Arc::new(model) as Arc<dyn CaptionModel>)
            },
            move || {
                let model = NllbTranslationModel::load(&translation_dir, intra_threads)?;
                Ok(Arc::new(model) as Arc<dyn TranslationModel>)
            },
        )
    }

    /// Registry with custom constructors
    pub fn with_loaders<C, T>(caption_loader: C, translation_loader: T) -> Self
    where
        C: Fn() -> Result<Arc<dyn CaptionModel>> + Send + Sync + 'static,
        T: Fn() -> Result<Arc<dyn TranslationModel>> + Send + Sync + 'static,
    {
        Self {
            caption: LazyModel::new(CAPTION_MODEL_NAME, caption_loader),
            translation: LazyModel::new(TRANSLATION_MODEL_NAME, translation_loader),
        }
    }

    pub fn caption_model(&self) -> Result<Arc<dyn CaptionModel>, ModelUnavailable> {
        self.caption.get()
    }

    pub fn translation_model(&self) -> Result<Arc<dyn TranslationModel>, ModelUnavailable> {
        self.translation.get()
    }

    /// Load both models now instead of on first request
    pub fn preload(&self) -> Result<(), ModelUnavailable> {
        self.caption_model()?;
        self.translation_model()?;
        Ok(())
    }

    pub fn list_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                name: self.caption.name().to_string(),
                kind: "caption".to_string(),
                status: self.caption.status(),
            },
            ModelInfo {
                name: self.translation.name().to_string(),
                kind: "translation".to_string(),
                status: self.translation.status(),
            },
        ]
    }
}
