// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::{
    ApiConfig, CaptionFailurePolicy, ModelConfig, ServiceConfig, UploadConfig,
    DEFAULT_CAPTION_MODEL_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_TRANSLATION_MODEL_PATH,
};
use crate::version;

/// Image caption and translation node
#[derive(Parser, Debug)]
#[command(name = "caption-translate-node")]
#[command(version = version::VERSION_NUMBER)]
#[command(about = "Captions uploaded images and translates the caption", long_about = None)]
pub struct Cli {
    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Directory holding the BLIP ONNX bundle
    #[arg(long, env = "CAPTION_MODEL_PATH", default_value = DEFAULT_CAPTION_MODEL_PATH)]
    pub caption_model_path: PathBuf,

    /// Directory holding the NLLB ONNX bundle
    #[arg(long, env = "TRANSLATION_MODEL_PATH", default_value = DEFAULT_TRANSLATION_MODEL_PATH)]
    pub translation_model_path: PathBuf,

    /// Directory for request-scoped upload files (defaults to the OS temp dir)
    #[arg(long, env = "UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Store every upload at this one path instead of per-request files
    #[arg(long, env = "SHARED_UPLOAD_PATH")]
    pub shared_upload_path: Option<PathBuf>,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = crate::config::DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Behaviour when captioning fails
    #[arg(long, env = "CAPTION_FAILURE_POLICY", value_enum, default_value_t = CaptionFailurePolicy::TranslateSentinel)]
    pub caption_failure_policy: CaptionFailurePolicy,

    /// Load both models before accepting requests
    #[arg(long, env = "PRELOAD_MODELS")]
    pub preload_models: bool,

    /// Intra-op threads per ONNX Runtime session
    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = crate::inference::DEFAULT_INTRA_THREADS)]
    pub intra_threads: usize,
}

impl Cli {
    pub fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            api: ApiConfig {
                listen_addr: self.listen_addr,
                max_upload_bytes: self.max_upload_bytes,
            },
            models: ModelConfig {
                caption_model_dir: self.caption_model_path,
                translation_model_dir: self.translation_model_path,
                intra_threads: self.intra_threads.max(1),
            },
            uploads: UploadConfig {
                upload_dir: self.upload_dir.unwrap_or_else(std::env::temp_dir),
                shared_upload_path: self.shared_upload_path,
            },
            caption_failure_policy: self.caption_failure_policy,
            preload_models: self.preload_models,
        }
    }
}
