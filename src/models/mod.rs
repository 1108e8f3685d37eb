// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model capabilities and the process-wide model registry
//!
//! The pipeline only sees two capabilities: captioning an image and translating
//! English text. Concrete ONNX implementations live in `vision::blip` and
//! `translation::nllb`.

pub mod registry;

use anyhow::Result;
use image::DynamicImage;

use crate::inference::DecodingParams;

pub use registry::{LazyModel, ModelInfo, ModelRegistry, ModelStatus, ModelUnavailable};

/// Given an image, produce a short descriptive text
pub trait CaptionModel: Send + Sync {
    /// Caption an RGB image with the given decoding parameters
    fn caption(&self, image: &DynamicImage, params: &DecodingParams) -> Result<String>;
}

/// Given English text and a target language, produce translated text
pub trait TranslationModel: Send + Sync {
    /// Translate `text` from `source_lang` into `target_lang`
    ///
    /// Language arguments are the model's own identifiers (e.g. `eng_Latn`).
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        params: &DecodingParams,
    ) -> Result<String>;
}
