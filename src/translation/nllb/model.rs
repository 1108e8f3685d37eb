// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! NLLB-200 translation model
//!
//! Expected files:
//! - encoder_model.onnx
//! - decoder_model.onnx
//! - tokenizer.json

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::decoder::NllbDecoder;
use super::encoder::NllbEncoder;
use crate::inference::session::{find_model_file, log_target};
use crate::inference::{generate, DecodingParams, ExecutionTarget};
use crate::models::TranslationModel;

/// Longest source sequence fed to the encoder, special tokens included
pub const MAX_SOURCE_LENGTH: usize = 1024;

/// `</s>`, used both as decoder start and end of sequence
pub const DEFAULT_EOS_TOKEN_ID: u32 = 2;

/// NLLB-200 translation model over ONNX Runtime
pub struct NllbTranslationModel {
    encoder: NllbEncoder,
    decoder: NllbDecoder,
    tokenizer: Tokenizer,
    eos_token_id: u32,
    model_dir: PathBuf,
}

impl std::fmt::Debug for NllbTranslationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NllbTranslationModel")
            .field("model_dir", &self.model_dir)
            .field("target", &self.encoder.target())
            .finish_non_exhaustive()
    }
}

impl NllbTranslationModel {
    pub fn load(model_dir: &Path, intra_threads: usize) -> Result<Self> {
        if !model_dir.exists() {
            anyhow::bail!(
                "Translation model directory not found: {}",
                model_dir.display()
            );
        }

        info!("Loading NLLB translation model from {}", model_dir.display());

        let encoder_path = find_model_file(model_dir, &["encoder_model.onnx", "encoder.onnx"])?;
        let decoder_path = find_model_file(model_dir, &["decoder_model.onnx", "decoder.onnx"])?;
        let tokenizer_path = model_dir.join("tokenizer.json");
        if !tokenizer_path.exists() {
            anyhow::bail!("NLLB tokenizer not found: {}", tokenizer_path.display());
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        let eos_token_id = tokenizer
            .token_to_id("</s>")
            .unwrap_or(DEFAULT_EOS_TOKEN_ID);

        let preferred = ExecutionTarget::detect();
        let encoder = NllbEncoder::load(&encoder_path, preferred, intra_threads)?;
        let decoder = NllbDecoder::load(&decoder_path, encoder.target(), intra_threads)?;

        log_target("Translation model", encoder.target());

        Ok(Self {
            encoder,
            decoder,
            tokenizer,
            eos_token_id,
            model_dir: model_dir.to_path_buf(),
        })
    }

    fn language_token(&self, lang: &str) -> Result<u32> {
        self.tokenizer
            .token_to_id(lang)
            .with_context(|| format!("Tokenizer has no language token {}", lang))
    }
}

/// Lay out `[source_lang] tokens [</s>]`, truncating the text tokens to fit
pub fn build_source_ids(lang_token: u32, text_ids: &[u32], eos_token_id: u32) -> Vec<u32> {
    let keep = text_ids.len().min(MAX_SOURCE_LENGTH - 2);
    let mut ids = Vec::with_capacity(keep + 2);
    ids.push(lang_token);
    ids.extend_from_slice(&text_ids[..keep]);
    ids.push(eos_token_id);
    ids
}

impl TranslationModel for NllbTranslationModel {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        params: &DecodingParams,
    ) -> Result<String> {
        let start = Instant::now();

        let source_token = self.language_token(source_lang)?;
        let target_token = self.language_token(target_lang)?;

        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Failed to tokenize input: {}", e))?;
        let source_ids = build_source_ids(source_token, encoding.get_ids(), self.eos_token_id);
        debug!("Source sequence: {} tokens", source_ids.len());

        let (encoder_hidden, encoder_mask) = self.encoder.encode(&source_ids)?;

        let prefix = [self.eos_token_id];
        let tokens = generate(
            &prefix,
            self.eos_token_id,
            Some(target_token),
            params,
            |sequences| {
                self.decoder
                    .next_token_logits(&encoder_hidden, &encoder_mask, sequences)
            },
        )?;

        let generated: Vec<u32> = tokens
            .into_iter()
            .skip(prefix.len())
            .filter(|&id| id != target_token)
            .collect();

        let output = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

        info!(
            "Translated to {} in {}ms ({} tokens)",
            target_lang,
            start.elapsed().as_millis(),
            generated.len()
        );

        Ok(output.trim().to_string())
    }
}
