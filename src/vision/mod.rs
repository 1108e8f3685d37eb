// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and the BLIP captioning model

pub mod blip;
pub mod image_utils;

pub use blip::BlipCaptionModel;
pub use image_utils::{
    decode_image_bytes, detect_format, load_rgb_image, ImageError, ImageInfo,
    DEFAULT_MAX_IMAGE_BYTES,
};
