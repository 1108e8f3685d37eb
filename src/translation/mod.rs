// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption translation into Indic languages

pub mod languages;
pub mod nllb;
pub mod translator;

pub use languages::{LanguageTag, PolishRule, UnsupportedLanguage};
pub use translator::{
    TranslationError, TranslationResult, Translator, SOURCE_LANGUAGE, TRANSLATION_FAILED,
    UNSUPPORTED_LANGUAGE,
};
