// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP vision encoder
//!
//! Turns a preprocessed image tensor into the patch embeddings the text
//! decoder cross-attends to.

use anyhow::{Context, Result};
use ndarray::{Array3, Array4, Ix3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::inference::session::load_session;
use crate::inference::ExecutionTarget;

/// BLIP vision encoder (`vision_model.onnx`)
pub struct BlipVisionEncoder {
    session: Mutex<Session>,
    input_name: String,
    target: ExecutionTarget,
}

impl std::fmt::Debug for BlipVisionEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipVisionEncoder")
            .field("input_name", &self.input_name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl BlipVisionEncoder {
    /// Load the encoder from an ONNX file
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime cannot build a session
    pub fn load(model_path: &Path, target: ExecutionTarget, intra_threads: usize) -> Result<Self> {
        info!("Loading BLIP vision encoder from {}", model_path.display());

        let (session, target) = load_session(model_path, target, intra_threads)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        debug!("BLIP encoder input: {}, target: {}", input_name, target);

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            target,
        })
    }

    pub fn target(&self) -> ExecutionTarget {
        self.target
    }

    /// Encode an image tensor of shape [1, 3, H, W]
    ///
    /// Returns the last hidden state, shape [1, num_patches, hidden_dim].
    pub fn encode(&self, pixel_values: &Array4<f32>) -> Result<Array3<f32>> {
        let shape = pixel_values.shape();
        if shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        let input_value = Value::from_array(pixel_values.to_owned())
            .context("Failed to create pixel tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("BLIP encoder session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Encoder inference failed")?;

        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder output")?;

        debug!("Encoder output shape: {:?}", hidden.shape());

        hidden
            .to_owned()
            .into_dimensionality::<Ix3>()
            .context("Encoder output is not [batch, patches, hidden]")
    }
}
