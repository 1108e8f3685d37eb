// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP text decoder
//!
//! Scores the next token of a batch of partial captions, cross-attending to the
//! image embeddings produced by the vision encoder.

use anyhow::{Context, Result};
use ndarray::Array3;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::inference::session::{batch_input_ids, last_position_logits, load_session};
use crate::inference::ExecutionTarget;

/// Decoder start token (`[DEC]`) for BLIP captioning
pub const DEFAULT_BOS_TOKEN_ID: u32 = 30522;

/// End-of-caption token (`[SEP]`)
pub const DEFAULT_EOS_TOKEN_ID: u32 = 102;

/// BLIP text decoder (`text_decoder.onnx`)
pub struct BlipTextDecoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    bos_token_id: u32,
    eos_token_id: u32,
}

impl std::fmt::Debug for BlipTextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipTextDecoder")
            .field("bos_token_id", &self.bos_token_id)
            .field("eos_token_id", &self.eos_token_id)
            .finish_non_exhaustive()
    }
}

impl BlipTextDecoder {
    /// Load the decoder and its tokenizer
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found
    /// - ONNX Runtime initialization fails
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        target: ExecutionTarget,
        intra_threads: usize,
    ) -> Result<Self> {
        if !tokenizer_path.exists() {
            anyhow::bail!("BLIP tokenizer not found: {}", tokenizer_path.display());
        }

        info!("Loading BLIP text decoder from {}", model_path.display());

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let (session, _) = load_session(model_path, target, intra_threads)?;

        let input_names: Vec<_> = session.inputs.iter().map(|i| &i.name).collect();
        debug!("Decoder inputs: {:?}", input_names);

        let bos_token_id = tokenizer
            .token_to_id("[DEC]")
            .unwrap_or(DEFAULT_BOS_TOKEN_ID);
        let eos_token_id = tokenizer
            .token_to_id("[SEP]")
            .unwrap_or(DEFAULT_EOS_TOKEN_ID);

        debug!("Special tokens - BOS: {}, EOS: {}", bos_token_id, eos_token_id);

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            bos_token_id,
            eos_token_id,
        })
    }

    pub fn bos_token_id(&self) -> u32 {
        self.bos_token_id
    }

    pub fn eos_token_id(&self) -> u32 {
        self.eos_token_id
    }

    /// Next-token logits for each sequence in `sequences`
    ///
    /// All sequences must have the same length. `image_embeds` has shape
    /// [1, patches, hidden] and is repeated across the batch.
    pub fn next_token_logits(
        &self,
        image_embeds: &Array3<f32>,
        sequences: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = batch_input_ids(sequences)?;
        let batch = sequences.len();
        let (_, patches, hidden) = image_embeds.dim();

        let encoder_hidden_states = image_embeds
            .broadcast((batch, patches, hidden))
            .context("Image embeddings cannot be broadcast to the batch")?
            .to_owned();

        let input_ids = Value::from_array(input_ids).context("Failed to create input IDs tensor")?;
        let attention_mask =
            Value::from_array(attention_mask).context("Failed to create attention mask tensor")?;
        let encoder_hidden_states = Value::from_array(encoder_hidden_states)
            .context("Failed to create encoder hidden states tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("BLIP decoder session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "encoder_hidden_states" => encoder_hidden_states,
            ])
            .context("Decoder inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract logits tensor")?;

        last_position_logits(&logits)
    }

    /// Turn generated ids into caption text, dropping special tokens
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let text = self
            .tokenizer
            .decode(ids, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;
        Ok(text.trim().to_string())
    }
}
