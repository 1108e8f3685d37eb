// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the caption translate node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-caption-translate-2026-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "blip-captioning",
    "nllb-translation",
    "onnx-runtime",
    "cuda-auto-detect",
    "lazy-model-loading",
    "request-scoped-uploads",
];

/// Target languages accepted by /upload-image/
pub const SUPPORTED_LANGUAGES: &[&str] = &["ta", "te", "hi", "kn", "ml"];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Caption Translate Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
