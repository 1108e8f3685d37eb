// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP image captioning over ONNX Runtime

pub mod decoder;
pub mod encoder;
pub mod model;
pub mod preprocessing;

pub use decoder::BlipTextDecoder;
pub use encoder::BlipVisionEncoder;
pub use model::BlipCaptionModel;
pub use preprocessing::{preprocess_for_blip, PreprocessorConfig, BLIP_INPUT_SIZE};
