// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Two-stage pipeline: caption the image, then translate the caption

pub mod caption;
pub mod orchestrator;

use serde::{Deserialize, Serialize};

pub use caption::{CaptionError, CaptionGenerator, CAPTION_FAILED};
pub use orchestrator::RequestOrchestrator;
pub use crate::translation::{TRANSLATION_FAILED, UNSUPPORTED_LANGUAGE};

pub const ERROR_GENERATING_CAPTION: &str = "Error generating caption";
pub const ERROR_TRANSLATING_CAPTION: &str = "Error translating caption";

/// Body of the `/upload-image/` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub caption: String,
    pub translations: String,
}

impl ResponseEnvelope {
    /// Fixed pair returned when a request fails outside the stages
    pub fn error() -> Self {
        Self {
            caption: ERROR_GENERATING_CAPTION.to_string(),
            translations: ERROR_TRANSLATING_CAPTION.to_string(),
        }
    }
}
