// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Translation stage: English caption to a supported target language
//!
//! Never fails outward. Every outcome is a [`TranslationResult`] whose text is
//! either the polished translation or a sentinel naming the failure.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::languages::{LanguageTag, UnsupportedLanguage};
use crate::inference::{DecodingParams, TRANSLATION_DECODING};
use crate::models::{ModelRegistry, ModelUnavailable};

/// Source language of every caption
pub const SOURCE_LANGUAGE: &str = "eng_Latn";

pub const UNSUPPORTED_LANGUAGE: &str = "Unsupported language";
pub const TRANSLATION_FAILED: &str = "Translation failed";

#[derive(Debug, Clone, Error)]
pub enum TranslationError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("empty input text")]
    EmptyInput,

    #[error(transparent)]
    ModelUnavailable(#[from] ModelUnavailable),

    #[error("translation inference failed: {0}")]
    Inference(String),
}

impl TranslationError {
    /// Text returned to the caller in place of a translation
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::UnsupportedLanguage(_) => UNSUPPORTED_LANGUAGE,
            _ => TRANSLATION_FAILED,
        }
    }
}

impl From<UnsupportedLanguage> for TranslationError {
    fn from(e: UnsupportedLanguage) -> Self {
        Self::UnsupportedLanguage(e.0)
    }
}

/// Outcome of translating into one requested language
#[derive(Debug, Clone)]
pub struct TranslationResult {
    /// The tag as the caller sent it
    pub language: String,
    pub outcome: Result<String, TranslationError>,
}

impl TranslationResult {
    /// The translated text, or the sentinel for the failure
    pub fn text(&self) -> String {
        match &self.outcome {
            Ok(text) => text.clone(),
            Err(e) => e.sentinel().to_string(),
        }
    }

    /// Single-entry `{language: text}` mapping
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([(self.language.clone(), self.text())])
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Translates captions with the registry's translation model
pub struct Translator {
    registry: Arc<ModelRegistry>,
    params: DecodingParams,
}

impl Translator {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            params: TRANSLATION_DECODING,
        }
    }

    /// Translate `text` into the language named by `language`
    pub fn translate(&self, text: &str, language: &str) -> TranslationResult {
        let outcome = self.try_translate(text, language);

        match &outcome {
            Ok(translated) => debug!("Translation [{}]: {}", language, translated),
            Err(e @ TranslationError::ModelUnavailable(_)) => {
                error!("Translation skipped, {}", e)
            }
            Err(e) => warn!("Translation failed [{}]: {}", language, e),
        }

        TranslationResult {
            language: language.to_string(),
            outcome,
        }
    }

    fn try_translate(&self, text: &str, language: &str) -> Result<String, TranslationError> {
        // Unsupported tags never reach the model
        let tag: LanguageTag = language.parse()?;

        if text.trim().is_empty() {
            return Err(TranslationError::EmptyInput);
        }

        let model = self.registry.translation_model()?;
        let raw = model
            .translate(text, SOURCE_LANGUAGE, tag.model_code(), &self.params)
            .map_err(|e| TranslationError::Inference(format!("{:#}", e)))?;

        Ok(tag.polish(&raw))
    }
}
