// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Tests against the real ONNX bundles
//!
//! Run with `--ignored` once the models are exported to the paths below.

use caption_translate_node::config::{CaptionFailurePolicy, ModelConfig};
use caption_translate_node::models::ModelRegistry;
use caption_translate_node::pipeline::{RequestOrchestrator, CAPTION_FAILED, TRANSLATION_FAILED};
use caption_translate_node::storage::TempFileStore;
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::jpeg_bytes;

const CAPTION_MODEL_DIR: &str = "./models/blip-caption-onnx";
const TRANSLATION_MODEL_DIR: &str = "./models/nllb-200-onnx";

fn real_orchestrator() -> RequestOrchestrator {
    let registry = Arc::new(ModelRegistry::from_config(&ModelConfig {
        caption_model_dir: PathBuf::from(CAPTION_MODEL_DIR),
        translation_model_dir: PathBuf::from(TRANSLATION_MODEL_DIR),
        intra_threads: 4,
    }));
    RequestOrchestrator::from_registry(
        Arc::new(TempFileStore::default()),
        registry,
        CaptionFailurePolicy::default(),
    )
}

#[test]
#[ignore = "requires exported BLIP and NLLB ONNX models"]
fn test_real_models_caption_and_translate_hindi() {
    let response = real_orchestrator().handle_request(&jpeg_bytes(), "hi");

    assert!(!response.caption.is_empty());
    assert_ne!(response.caption, CAPTION_FAILED);
    assert!(!response.translations.is_empty());
    assert_ne!(response.translations, TRANSLATION_FAILED);
}

#[test]
#[ignore = "requires exported BLIP and NLLB ONNX models"]
fn test_real_models_every_language() {
    let orchestrator = real_orchestrator();
    for lang in ["ta", "te", "hi", "kn", "ml"] {
        let response = orchestrator.handle_request(&jpeg_bytes(), lang);
        assert_ne!(response.translations, TRANSLATION_FAILED, "lang {}", lang);
    }
}
