// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model registry tests: at-most-once construction under concurrency

use caption_translate_node::models::{
    CaptionModel, ModelRegistry, ModelStatus, TranslationModel,
};
use caption_translate_node::translation::{TranslationError, Translator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::common::{MockCaptioner, MockTranslation};

const THREADS: usize = 8;

#[test]
fn test_concurrent_first_access_constructs_once() {
    let caption_loads = Arc::new(AtomicUsize::new(0));
    let translation_loads = Arc::new(AtomicUsize::new(0));

    let registry = {
        let caption_loads = caption_loads.clone();
        let translation_loads = translation_loads.clone();
        Arc::new(ModelRegistry::with_loaders(
            move || {
                caption_loads.fetch_add(1, Ordering::SeqCst);
                thread::sleep(std::time::Duration::from_millis(20));
                Ok(Arc::new(MockCaptioner::new()) as Arc<dyn CaptionModel>)
            },
            move || {
                translation_loads.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(MockTranslation::new()) as Arc<dyn TranslationModel>)
            },
        ))
    };

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let caption = registry.caption_model().is_ok();
                let translation = registry.translation_model().is_ok();
                caption && translation
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }

    assert_eq!(caption_loads.load(Ordering::SeqCst), 1);
    assert_eq!(translation_loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sequential_access_returns_same_handle() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let registry = ModelRegistry::with_loaders(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockCaptioner::new()) as Arc<dyn CaptionModel>)
        },
        || Ok(Arc::new(MockTranslation::new()) as Arc<dyn TranslationModel>),
    );

    let first = registry.caption_model().unwrap();
    for _ in 0..10 {
        let again = registry.caption_model().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_load_is_not_retried() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let registry = ModelRegistry::with_loaders(
        || Ok(Arc::new(MockCaptioner::new()) as Arc<dyn CaptionModel>),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("tokenizer.json is corrupt")
        },
    );

    for _ in 0..3 {
        let err = registry.translation_model().err().unwrap();
        assert!(err.to_string().contains("model unavailable"));
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let statuses: Vec<_> = registry.list_models().into_iter().map(|m| m.status).collect();
    assert_eq!(statuses, [ModelStatus::NotLoaded, ModelStatus::Unavailable]);
}

#[test]
fn test_preload_reports_first_failure() {
    let registry = ModelRegistry::with_loaders(
        || anyhow::bail!("vision_model.onnx missing"),
        || Ok(Arc::new(MockTranslation::new()) as Arc<dyn TranslationModel>),
    );

    let err = registry.preload().unwrap_err();
    assert_eq!(err.model, "blip-caption");
}

#[test]
fn test_panicking_loader_is_not_retried() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let registry = Arc::new(ModelRegistry::with_loaders(
        || Ok(Arc::new(MockCaptioner::new()) as Arc<dyn CaptionModel>),
        move || -> anyhow::Result<Arc<dyn TranslationModel>> {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("out of device memory")
        },
    ));
    let translator = Translator::new(registry.clone());

    for _ in 0..3 {
        let result = translator.translate("a cat on a mat", "ta");
        assert!(matches!(
            result.outcome,
            Err(TranslationError::ModelUnavailable(_))
        ));
        assert_eq!(result.text(), "Translation failed");
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let statuses: Vec<_> = registry.list_models().into_iter().map(|m| m.status).collect();
    assert_eq!(statuses, [ModelStatus::NotLoaded, ModelStatus::Unavailable]);
}
