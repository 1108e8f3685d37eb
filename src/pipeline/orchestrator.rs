// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Drives one upload through storage, captioning and translation

use anyhow::{Context, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

use super::caption::{CaptionGenerator, CAPTION_FAILED};
use super::ResponseEnvelope;
use crate::config::CaptionFailurePolicy;
use crate::models::registry::panic_message;
use crate::models::ModelRegistry;
use crate::storage::UploadStore;
use crate::translation::{Translator, TRANSLATION_FAILED};

pub struct RequestOrchestrator {
    store: Arc<dyn UploadStore>,
    captioner: CaptionGenerator,
    translator: Translator,
    policy: CaptionFailurePolicy,
}

impl RequestOrchestrator {
    pub fn new(
        store: Arc<dyn UploadStore>,
        captioner: CaptionGenerator,
        translator: Translator,
        policy: CaptionFailurePolicy,
    ) -> Self {
        Self {
            store,
            captioner,
            translator,
            policy,
        }
    }

    /// Orchestrator whose stages share one model registry
    pub fn from_registry(
        store: Arc<dyn UploadStore>,
        registry: Arc<ModelRegistry>,
        policy: CaptionFailurePolicy,
    ) -> Self {
        Self::new(
            store,
            CaptionGenerator::new(registry.clone()),
            Translator::new(registry),
            policy,
        )
    }

    pub fn policy(&self) -> CaptionFailurePolicy {
        self.policy
    }

    /// Caption and translate one image
    ///
    /// Always returns a well-formed envelope. Faults that escape the stages,
    /// panics included, produce [`ResponseEnvelope::error`].
    pub fn handle_request(&self, image_bytes: &[u8], language: &str) -> ResponseEnvelope {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(image_bytes, language))) {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(e)) => {
                error!("Request failed outside the pipeline stages: {:#}", e);
                ResponseEnvelope::error()
            }
            Err(payload) => {
                error!("Request panicked: {}", panic_message(payload.as_ref()));
                ResponseEnvelope::error()
            }
        }
    }

    fn run(&self, image_bytes: &[u8], language: &str) -> Result<ResponseEnvelope> {
        let upload = self
            .store
            .persist(image_bytes)
            .context("Failed to persist upload")?;

        let caption = self.captioner.generate(upload.path());

        let (caption, translations) = match (caption, self.policy) {
            (Ok(caption), _) => {
                let translations = self.translate(&caption, language);
                (caption, translations)
            }
            (Err(_), CaptionFailurePolicy::TranslateSentinel) => {
                let translations = self.translate(CAPTION_FAILED, language);
                (CAPTION_FAILED.to_string(), translations)
            }
            (Err(_), CaptionFailurePolicy::ShortCircuit) => {
                info!("Captioning failed, translation skipped");
                (CAPTION_FAILED.to_string(), TRANSLATION_FAILED.to_string())
            }
        };

        Ok(ResponseEnvelope {
            caption,
            translations,
        })
    }

    fn translate(&self, text: &str, language: &str) -> String {
        self.translator
            .translate(text, language)
            .to_map()
            .remove(language)
            .unwrap_or_else(|| TRANSLATION_FAILED.to_string())
    }
}
