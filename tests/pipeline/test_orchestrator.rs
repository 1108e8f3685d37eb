// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request orchestrator end-to-end tests with mocked models
//!
//! These tests verify that:
//! - A valid image yields a caption and a polished translation
//! - Undecodable bytes yield the caption sentinel under both policies
//! - Unsupported languages keep the real caption
//! - Missing model artifacts degrade to sentinels
//! - Panics inside a model are contained

use caption_translate_node::config::CaptionFailurePolicy;
use caption_translate_node::inference::CAPTION_DECODING;
use caption_translate_node::models::{ModelRegistry, ModelStatus};
use caption_translate_node::pipeline::{RequestOrchestrator, ResponseEnvelope};
use caption_translate_node::storage::{SingleSlotStore, TempFileStore, UploadStore};
use image::DynamicImage;
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{
    corrupted_bytes, jpeg_bytes, png_bytes, registry_with, unavailable_registry, MockCaptioner,
    MockTranslation,
};

fn orchestrator(
    registry: Arc<ModelRegistry>,
    policy: CaptionFailurePolicy,
) -> (TempDir, RequestOrchestrator) {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn UploadStore> = Arc::new(TempFileStore::new(dir.path()));
    (dir, RequestOrchestrator::from_registry(store, registry, policy))
}

fn envelope(caption: &str, translations: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        caption: caption.to_string(),
        translations: translations.to_string(),
    }
}

#[test]
fn test_valid_jpeg_hindi() {
    let mut caption = MockCaptioner::new();
    caption
        .expect_caption()
        .withf(|image, params| {
            matches!(image, DynamicImage::ImageRgb8(_))
                && image.width() == 32
                && *params == CAPTION_DECODING
        })
        .times(1)
        .returning(|_, _| Ok("a dog running on the beach".to_string()));

    let mut translation = MockTranslation::new();
    translation
        .expect_translate()
        .withf(|text, _, target, _| text == "a dog running on the beach" && target == "hin_Deva")
        .times(1)
        .returning(|_, _, _, _| Ok("एक कुत्ता समुद्र तट पर दौड़ रहा है".to_string()));

    let (_dir, orchestrator) = orchestrator(
        registry_with(caption, translation),
        CaptionFailurePolicy::default(),
    );

    let response = orchestrator.handle_request(&jpeg_bytes(), "hi");
    assert_eq!(
        response,
        envelope("a dog running on the beach", "कुत्ता समुद्र तट पर दौड़ रहा है")
    );
}

#[test]
fn test_corrupted_image_short_circuit() {
    let mut caption = MockCaptioner::new();
    caption.expect_caption().times(0);
    let mut translation = MockTranslation::new();
    translation.expect_translate().times(0);

    let (_dir, orchestrator) = orchestrator(
        registry_with(caption, translation),
        CaptionFailurePolicy::ShortCircuit,
    );

    let response = orchestrator.handle_request(&corrupted_bytes(), "ta");
    assert_eq!(
        response,
        envelope("Caption generation failed", "Translation failed")
    );
}

#[test]
fn test_corrupted_image_translates_sentinel_by_default() {
    let mut caption = MockCaptioner::new();
    caption.expect_caption().times(0);
    let mut translation = MockTranslation::new();
    translation
        .expect_translate()
        .withf(|text, _, target, _| text == "Caption generation failed" && target == "tam_Taml")
        .times(1)
        .returning(|_, _, _, _| anyhow::bail!("cannot translate"));

    let (_dir, orchestrator) = orchestrator(
        registry_with(caption, translation),
        CaptionFailurePolicy::TranslateSentinel,
    );

    let response = orchestrator.handle_request(&corrupted_bytes(), "ta");
    assert_eq!(
        response,
        envelope("Caption generation failed", "Translation failed")
    );
}

#[test]
fn test_translated_sentinel_is_returned_by_default() {
    let caption = MockCaptioner::new();
    let mut translation = MockTranslation::new();
    translation
        .expect_translate()
        .times(1)
        .returning(|_, _, _, _| Ok("தலைப்பு உருவாக்கம் தோல்வியடைந்தது".to_string()));

    let (_dir, orchestrator) = orchestrator(
        registry_with(caption, translation),
        CaptionFailurePolicy::TranslateSentinel,
    );

    let response = orchestrator.handle_request(b"plain text upload", "ta");
    assert_eq!(response.caption, "Caption generation failed");
    assert_eq!(response.translations, "தலைப்பு உருவாக்கம் தோல்வியடைந்தது");
}

#[test]
fn test_unsupported_language_keeps_caption() {
    let mut caption = MockCaptioner::new();
    caption
        .expect_caption()
        .times(1)
        .returning(|_, _| Ok("a red car parked on a street".to_string()));
    let mut translation = MockTranslation::new();
    translation.expect_translate().times(0);

    let (_dir, orchestrator) = orchestrator(
        registry_with(caption, translation),
        CaptionFailurePolicy::default(),
    );

    let response = orchestrator.handle_request(&png_bytes(), "fr");
    assert_eq!(
        response,
        envelope("a red car parked on a street", "Unsupported language")
    );
}

#[test]
fn test_empty_caption_is_caption_failure() {
    let mut caption = MockCaptioner::new();
    caption
        .expect_caption()
        .returning(|_, _| Ok("   ".to_string()));
    let mut translation = MockTranslation::new();
    translation.expect_translate().times(0);

    let (_dir, orchestrator) = orchestrator(
        registry_with(caption, translation),
        CaptionFailurePolicy::ShortCircuit,
    );

    let response = orchestrator.handle_request(&png_bytes(), "te");
    assert_eq!(
        response,
        envelope("Caption generation failed", "Translation failed")
    );
}

#[test]
fn test_missing_artifacts_degrade_to_sentinels() {
    let registry = unavailable_registry();
    let (_dir, orchestrator) = orchestrator(registry.clone(), CaptionFailurePolicy::default());

    let response = orchestrator.handle_request(&png_bytes(), "kn");
    assert_eq!(
        response,
        envelope("Caption generation failed", "Translation failed")
    );

    let statuses: Vec<_> = registry.list_models().into_iter().map(|m| m.status).collect();
    assert_eq!(statuses, [ModelStatus::Unavailable, ModelStatus::Unavailable]);
}

#[test]
fn test_panicking_model_yields_error_pair() {
    let mut caption = MockCaptioner::new();
    caption
        .expect_caption()
        .returning(|_, _| panic!("onnxruntime aborted"));

    let (_dir, orchestrator) = orchestrator(
        registry_with(caption, MockTranslation::new()),
        CaptionFailurePolicy::default(),
    );

    let response = orchestrator.handle_request(&png_bytes(), "ml");
    assert_eq!(response, ResponseEnvelope::error());
}

#[test]
fn test_single_slot_store_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let slot = dir.path().join("uploaded_image.jpg");

    let mut caption = MockCaptioner::new();
    caption
        .expect_caption()
        .times(2)
        .returning(|_, _| Ok("a bowl of fruit".to_string()));
    let mut translation = MockTranslation::new();
    translation
        .expect_translate()
        .times(2)
        .returning(|_, _, _, _| Ok("ఒక పండ్ల గిన్నె".to_string()));

    let orchestrator = RequestOrchestrator::from_registry(
        Arc::new(SingleSlotStore::new(&slot)),
        registry_with(caption, translation),
        CaptionFailurePolicy::default(),
    );

    for _ in 0..2 {
        let response = orchestrator.handle_request(&png_bytes(), "te");
        assert_eq!(response, envelope("a bowl of fruit", "పండ్ల గిన్నె"));
    }
    assert_eq!(std::fs::read(&slot).unwrap(), png_bytes());
}
