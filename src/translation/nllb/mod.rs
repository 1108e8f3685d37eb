// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! NLLB-200 translation over ONNX Runtime

pub mod decoder;
pub mod encoder;
pub mod model;

pub use model::{build_source_ids, NllbTranslationModel, MAX_SOURCE_LENGTH};
