// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::inference::DEFAULT_INTRA_THREADS;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_CAPTION_MODEL_PATH: &str = "./models/blip-caption-onnx";
pub const DEFAULT_TRANSLATION_MODEL_PATH: &str = "./models/nllb-200-onnx";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// What the orchestrator does when captioning fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptionFailurePolicy {
    /// Translate the caption sentinel text like any other caption
    #[default]
    TranslateSentinel,
    /// Skip translation and report "Translation failed"
    ShortCircuit,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Locations of the on-disk model bundles
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub caption_model_dir: PathBuf,
    pub translation_model_dir: PathBuf,
    /// Intra-op threads per ONNX session
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            caption_model_dir: PathBuf::from(DEFAULT_CAPTION_MODEL_PATH),
            translation_model_dir: PathBuf::from(DEFAULT_TRANSLATION_MODEL_PATH),
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory for request-scoped upload files
    pub upload_dir: PathBuf,
    /// When set, every upload overwrites this one file
    pub shared_upload_path: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: std::env::temp_dir(),
            shared_upload_path: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub api: ApiConfig,
    pub models: ModelConfig,
    pub uploads: UploadConfig,
    pub caption_failure_policy: CaptionFailurePolicy,
    /// Load both models at start-up instead of on first request
    pub preload_models: bool,
}
