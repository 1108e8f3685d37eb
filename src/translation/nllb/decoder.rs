// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! NLLB decoder (`decoder_model.onnx`)

use anyhow::{Context, Result};
use ndarray::{Array2, Array3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

use crate::inference::session::{batch_input_ids, last_position_logits, load_session};
use crate::inference::ExecutionTarget;

pub struct NllbDecoder {
    session: Mutex<Session>,
}

impl NllbDecoder {
    pub fn load(model_path: &Path, target: ExecutionTarget, intra_threads: usize) -> Result<Self> {
        let (session, _) = load_session(model_path, target, intra_threads)?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Next-token logits for a batch of equal-length target prefixes
    pub fn next_token_logits(
        &self,
        encoder_hidden: &Array3<f32>,
        encoder_mask: &Array2<i64>,
        sequences: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        let (input_ids, _) = batch_input_ids(sequences)?;
        let batch = sequences.len();
        let (_, src_len, hidden) = encoder_hidden.dim();

        let encoder_hidden_states = encoder_hidden
            .broadcast((batch, src_len, hidden))
            .context("Encoder states cannot be broadcast to the batch")?
            .to_owned();
        let encoder_attention_mask = encoder_mask
            .broadcast((batch, src_len))
            .context("Encoder mask cannot be broadcast to the batch")?
            .to_owned();

        let input_ids = Value::from_array(input_ids).context("Failed to create input IDs tensor")?;
        let encoder_hidden_states = Value::from_array(encoder_hidden_states)
            .context("Failed to create encoder hidden states tensor")?;
        let encoder_attention_mask = Value::from_array(encoder_attention_mask)
            .context("Failed to create encoder attention mask tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("NLLB decoder session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "encoder_hidden_states" => encoder_hidden_states,
                "encoder_attention_mask" => encoder_attention_mask,
            ])
            .context("Decoder inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract logits tensor")?;

        last_position_logits(&logits)
    }
}
