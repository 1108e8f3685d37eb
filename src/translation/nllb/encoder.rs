// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! NLLB encoder (`encoder_model.onnx`)

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, Ix3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use crate::inference::session::load_session;
use crate::inference::ExecutionTarget;

pub struct NllbEncoder {
    session: Mutex<Session>,
    target: ExecutionTarget,
}

impl NllbEncoder {
    pub fn load(model_path: &Path, target: ExecutionTarget, intra_threads: usize) -> Result<Self> {
        let (session, target) = load_session(model_path, target, intra_threads)?;
        Ok(Self {
            session: Mutex::new(session),
            target,
        })
    }

    pub fn target(&self) -> ExecutionTarget {
        self.target
    }

    /// Encode one source sequence
    ///
    /// Returns the hidden states [1, T, D] and the attention mask [1, T].
    pub fn encode(&self, source_ids: &[u32]) -> Result<(Array3<f32>, Array2<i64>)> {
        if source_ids.is_empty() {
            anyhow::bail!("Cannot encode an empty source sequence");
        }

        let len = source_ids.len();
        let ids = Array2::from_shape_fn((1, len), |(_, t)| source_ids[t] as i64);
        let mask = Array2::<i64>::ones((1, len));

        let input_ids = Value::from_array(ids).context("Failed to create input IDs tensor")?;
        let attention_mask =
            Value::from_array(mask.clone()).context("Failed to create attention mask tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("NLLB encoder session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
            ])
            .context("Encoder inference failed")?;

        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder output")?;

        debug!("NLLB encoder output shape: {:?}", hidden.shape());

        let hidden = hidden
            .to_owned()
            .into_dimensionality::<Ix3>()
            .context("Encoder output is not [batch, seq, hidden]")?;

        Ok((hidden, mask))
    }
}
