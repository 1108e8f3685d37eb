// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime session construction shared by the caption and translation models
//!
//! CUDA is used when the execution provider reports itself available, otherwise
//! sessions run on CPU. A CUDA session that fails to build falls back to CPU.

use anyhow::{Context, Result};
use ndarray::{Array2, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default number of intra-op threads per session
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// Hardware a model's sessions run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionTarget {
    /// NVIDIA GPU via the CUDA execution provider
    Cuda,
    /// Standard compute
    Cpu,
}

impl ExecutionTarget {
    /// Probe ONNX Runtime for an accelerator
    pub fn detect() -> Self {
        match CUDAExecutionProvider::default().is_available() {
            Ok(true) => Self::Cuda,
            Ok(false) => Self::Cpu,
            Err(e) => {
                debug!("CUDA availability probe failed: {}", e);
                Self::Cpu
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
        }
    }
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a session on exactly the given target
pub fn build_session(
    model_path: &Path,
    target: ExecutionTarget,
    intra_threads: usize,
) -> Result<Session> {
    let builder = Session::builder().context("Failed to create session builder")?;

    let builder = match target {
        ExecutionTarget::Cuda => builder
            .with_execution_providers([CUDAExecutionProvider::default().build().error_on_failure()])
            .context("Failed to set CUDA execution provider")?,
        ExecutionTarget::Cpu => builder
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?,
    };

    builder
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!(
            "Failed to load ONNX model from {}",
            model_path.display()
        ))
}

/// Build a session on the preferred target, falling back to CPU if CUDA fails
///
/// Returns the session together with the target it actually runs on.
pub fn load_session(
    model_path: &Path,
    preferred: ExecutionTarget,
    intra_threads: usize,
) -> Result<(Session, ExecutionTarget)> {
    if !model_path.exists() {
        anyhow::bail!("ONNX model file not found: {}", model_path.display());
    }

    if preferred == ExecutionTarget::Cuda {
        match build_session(model_path, ExecutionTarget::Cuda, intra_threads) {
            Ok(session) => return Ok((session, ExecutionTarget::Cuda)),
            Err(e) => {
                warn!("⚠️  CUDA execution provider failed: {:#}", e);
                warn!("   Falling back to CPU execution provider");
            }
        }
    }

    let session = build_session(model_path, ExecutionTarget::Cpu, intra_threads)?;
    Ok((session, ExecutionTarget::Cpu))
}

/// Find a model file by trying multiple possible names
pub fn find_model_file(dir: &Path, names: &[&str]) -> Result<PathBuf> {
    for name in names {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
    }
    anyhow::bail!(
        "Model file not found in {}. Tried: {:?}",
        dir.display(),
        names
    );
}

/// Log the chosen target once per model
pub fn log_target(model: &str, target: ExecutionTarget) {
    match target {
        ExecutionTarget::Cuda => info!("🚀 {} using accelerator: {}", model, target),
        ExecutionTarget::Cpu => info!("{} using standard compute: {}", model, target),
    }
}

/// Pick out the logits of the last position of each sequence
///
/// Accepts decoder output of shape `[batch, seq_len, vocab]`.
pub fn last_position_logits(logits: &ndarray::ArrayViewD<'_, f32>) -> Result<Vec<Vec<f32>>> {
    let shape = logits.shape();
    if shape.len() != 3 || shape[1] == 0 {
        anyhow::bail!("Unexpected decoder output shape: {:?}", shape);
    }

    let last = shape[1] - 1;
    let rows = logits
        .index_axis(Axis(1), last)
        .axis_iter(Axis(0))
        .map(|row| row.iter().copied().collect())
        .collect();

    debug!("Decoder logits {:?}, sampled position {}", shape, last);

    Ok(rows)
}

/// Pack equal-length sequences into `[batch, len]` id and mask tensors
pub fn batch_input_ids(sequences: &[Vec<u32>]) -> Result<(Array2<i64>, Array2<i64>)> {
    let len = sequences.first().map(|s| s.len()).unwrap_or(0);
    if len == 0 {
        anyhow::bail!("Decoder called with an empty batch");
    }
    if sequences.iter().any(|s| s.len() != len) {
        anyhow::bail!("Decoder batch sequences have different lengths");
    }

    let mut ids = Array2::<i64>::zeros((sequences.len(), len));
    for (b, seq) in sequences.iter().enumerate() {
        for (t, &token) in seq.iter().enumerate() {
            ids[[b, t]] = token as i64;
        }
    }
    let mask = Array2::<i64>::ones((sequences.len(), len));

    Ok((ids, mask))
}
