// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures: mock models, registries and test images

#![allow(dead_code)]

use caption_translate_node::inference::DecodingParams;
use caption_translate_node::models::{CaptionModel, ModelRegistry, TranslationModel};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mockall::mock;
use std::io::Cursor;
use std::sync::Arc;

mock! {
    pub Captioner {}

    impl CaptionModel for Captioner {
        fn caption(&self, image: &DynamicImage, params: &DecodingParams) -> anyhow::Result<String>;
    }
}

mock! {
    pub Translation {}

    impl TranslationModel for Translation {
        fn translate(
            &self,
            text: &str,
            source_lang: &str,
            target_lang: &str,
            params: &DecodingParams,
        ) -> anyhow::Result<String>;
    }
}

/// Registry whose loaders hand out the given mocks
pub fn registry_with(caption: MockCaptioner, translation: MockTranslation) -> Arc<ModelRegistry> {
    let caption: Arc<dyn CaptionModel> = Arc::new(caption);
    let translation: Arc<dyn TranslationModel> = Arc::new(translation);
    Arc::new(ModelRegistry::with_loaders(
        move || Ok(caption.clone()),
        move || Ok(translation.clone()),
    ))
}

/// Registry whose models can never be constructed
pub fn unavailable_registry() -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::with_loaders(
        || anyhow::bail!("caption artifacts missing"),
        || anyhow::bail!("translation artifacts missing"),
    ))
}

/// A small encoded image
pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(32, 24, |x, y| {
        Rgb([(x * 8) as u8, (y * 10) as u8, 128])
    }));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn png_bytes() -> Vec<u8> {
    image_bytes(ImageFormat::Png)
}

pub fn jpeg_bytes() -> Vec<u8> {
    image_bytes(ImageFormat::Jpeg)
}

/// Bytes with a JPEG signature that do not decode
pub fn corrupted_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(b"this is not really a jpeg");
    bytes
}
