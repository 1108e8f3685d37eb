// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the BLIP vision model

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Default square input size for BLIP
pub const BLIP_INPUT_SIZE: u32 = 384;

/// CLIP normalization mean values (BLIP reuses CLIP statistics)
pub const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std values
pub const STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_1];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SizeSpec {
    Square(u32),
    Dims { height: u32, width: u32 },
    ShortestEdge { shortest_edge: u32 },
}

#[derive(Debug, Deserialize)]
struct RawPreprocessorConfig {
    #[serde(default)]
    image_size: Option<u32>,
    #[serde(default)]
    size: Option<SizeSpec>,
    #[serde(default)]
    image_mean: Option<[f32; 3]>,
    #[serde(default)]
    image_std: Option<[f32; 3]>,
}

/// Resize and normalization settings
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessorConfig {
    pub width: u32,
    pub height: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            width: BLIP_INPUT_SIZE,
            height: BLIP_INPUT_SIZE,
            mean: MEAN,
            std: STD,
        }
    }
}

impl PreprocessorConfig {
    /// Parse a `preprocessor_config.json`, filling unset fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawPreprocessorConfig =
            serde_json::from_str(json).context("Invalid preprocessor config")?;

        let (width, height) = match (raw.size, raw.image_size) {
            (Some(SizeSpec::Dims { height, width }), _) => (width, height),
            (Some(SizeSpec::Square(s)), _) | (Some(SizeSpec::ShortestEdge { shortest_edge: s }), _) => (s, s),
            (None, Some(s)) => (s, s),
            (None, None) => (BLIP_INPUT_SIZE, BLIP_INPUT_SIZE),
        };

        if width == 0 || height == 0 {
            anyhow::bail!("Preprocessor size must be non-zero, got {}x{}", width, height);
        }

        Ok(Self {
            width,
            height,
            mean: raw.image_mean.unwrap_or(MEAN),
            std: raw.image_std.unwrap_or(STD),
        })
    }

    /// Read `preprocessor_config.json` from a model directory if present
    pub fn load_or_default(model_dir: &Path) -> Result<Self> {
        let path = model_dir.join("preprocessor_config.json");
        if !path.exists() {
            debug!("No preprocessor config in {}, using defaults", model_dir.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// Preprocess an image for the BLIP vision model
///
/// Steps:
/// 1. Resize to the configured size (bicubic, aspect ratio not preserved)
/// 2. Convert to RGB
/// 3. Normalize: (pixel/255 - mean) / std
/// 4. Convert to NCHW tensor format [1, 3, H, W]
pub fn preprocess_for_blip(image: &DynamicImage, config: &PreprocessorConfig) -> Array4<f32> {
    let resized = image.resize_exact(config.width, config.height, FilterType::CatmullRom);
    let rgb = resized.to_rgb8();

    let (width, height) = (config.width as usize, config.height as usize);
    let mut tensor = Array4::zeros((1, 3, height, width));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            let normalized = (pixel[c] as f32 / 255.0 - config.mean[c]) / config.std[c];
            tensor[[0, c, y as usize, x as usize]] = normalized;
        }
    }

    tensor
}
