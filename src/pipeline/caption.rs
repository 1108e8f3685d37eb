// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption stage: persisted image file to English caption

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::inference::{DecodingParams, CAPTION_DECODING};
use crate::models::{ModelRegistry, ModelUnavailable};
use crate::vision::image_utils::{load_rgb_image, ImageError, DEFAULT_MAX_IMAGE_BYTES};

pub const CAPTION_FAILED: &str = "Caption generation failed";

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] ImageError),

    #[error(transparent)]
    ModelUnavailable(#[from] ModelUnavailable),

    #[error("caption inference failed: {0}")]
    Inference(String),

    #[error("model produced an empty caption")]
    EmptyCaption,
}

/// Generates captions with the registry's caption model
pub struct CaptionGenerator {
    registry: Arc<ModelRegistry>,
    params: DecodingParams,
    max_image_bytes: usize,
}

impl CaptionGenerator {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            params: CAPTION_DECODING,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    /// Accept image files up to `max_bytes`, normally the upload limit
    pub fn with_max_image_bytes(mut self, max_bytes: usize) -> Self {
        self.max_image_bytes = max_bytes;
        self
    }

    /// Caption the image stored at `image_path`
    ///
    /// A successful caption is never empty.
    pub fn generate(&self, image_path: &Path) -> Result<String, CaptionError> {
        let start = Instant::now();
        let result = self.try_generate(image_path);

        match &result {
            Ok(caption) => info!(
                "Caption generated in {}ms: {}",
                start.elapsed().as_millis(),
                caption
            ),
            Err(e @ CaptionError::ModelUnavailable(_)) => error!("Captioning skipped, {}", e),
            Err(e) => warn!("Caption generation failed: {}", e),
        }

        result
    }

    fn try_generate(&self, image_path: &Path) -> Result<String, CaptionError> {
        let (image, info) = load_rgb_image(image_path, self.max_image_bytes)?;
        debug!(
            "Loaded {}x{} {:?} image ({} bytes)",
            info.width,
            info.height,
            info.format,
            info.size_bytes
        );

        let model = self.registry.caption_model()?;
        let caption = model
            .caption(&image, &self.params)
            .map_err(|e| CaptionError::Inference(format!("{:#}", e)))?;

        let caption = caption.trim();
        if caption.is_empty() {
            return Err(CaptionError::EmptyCaption);
        }

        Ok(caption.to_string())
    }
}
