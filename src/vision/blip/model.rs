// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP captioning model
//!
//! Combines the vision encoder and text decoder behind [`CaptionModel`].

use anyhow::Result;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use super::decoder::BlipTextDecoder;
use super::encoder::BlipVisionEncoder;
use super::preprocessing::{preprocess_for_blip, PreprocessorConfig};
use crate::inference::session::{find_model_file, log_target};
use crate::inference::{generate, DecodingParams, ExecutionTarget};
use crate::models::CaptionModel;

/// BLIP image captioning model
pub struct BlipCaptionModel {
    encoder: BlipVisionEncoder,
    decoder: BlipTextDecoder,
    preprocessor: PreprocessorConfig,
    model_dir: PathBuf,
}

impl std::fmt::Debug for BlipCaptionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipCaptionModel")
            .field("model_dir", &self.model_dir)
            .field("target", &self.encoder.target())
            .finish_non_exhaustive()
    }
}

impl BlipCaptionModel {
    /// Load BLIP from a model directory
    ///
    /// Expected files:
    /// - vision_model.onnx (or encoder.onnx)
    /// - text_decoder.onnx (or decoder_model.onnx)
    /// - tokenizer.json
    /// - preprocessor_config.json (optional)
    pub fn load(model_dir: &Path, intra_threads: usize) -> Result<Self> {
        if !model_dir.exists() {
            anyhow::bail!("Caption model directory not found: {}", model_dir.display());
        }

        info!("Loading BLIP caption model from {}", model_dir.display());

        let encoder_path = find_model_file(model_dir, &["vision_model.onnx", "encoder.onnx"])?;
        let decoder_path =
            find_model_file(model_dir, &["text_decoder.onnx", "decoder_model.onnx"])?;
        let tokenizer_path = model_dir.join("tokenizer.json");

        let preferred = ExecutionTarget::detect();
        let encoder = BlipVisionEncoder::load(&encoder_path, preferred, intra_threads)?;
        // Keep both halves on the same device
        let decoder =
            BlipTextDecoder::load(&decoder_path, &tokenizer_path, encoder.target(), intra_threads)?;
        let preprocessor = PreprocessorConfig::load_or_default(model_dir)?;

        log_target("Caption model", encoder.target());

        Ok(Self {
            encoder,
            decoder,
            preprocessor,
            model_dir: model_dir.to_path_buf(),
        })
    }
}

impl CaptionModel for BlipCaptionModel {
    fn caption(&self, image: &DynamicImage, params: &DecodingParams) -> Result<String> {
        let start = Instant::now();

        let pixel_values = preprocess_for_blip(image, &self.preprocessor);
        let image_embeds = self.encoder.encode(&pixel_values)?;
        debug!("Image encoded in {}ms", start.elapsed().as_millis());

        let prefix = [self.decoder.bos_token_id()];
        let tokens = generate(
            &prefix,
            self.decoder.eos_token_id(),
            None,
            params,
            |sequences| self.decoder.next_token_logits(&image_embeds, sequences),
        )?;

        let caption = self.decoder.decode(&tokens[prefix.len()..])?;

        info!(
            "Caption generated in {}ms ({} tokens)",
            start.elapsed().as_millis(),
            tokens.len()
        );

        Ok(caption)
    }
}
