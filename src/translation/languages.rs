// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Supported target languages and per-language output polishing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Language tag outside the supported set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

/// Post-processing applied to a successful translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolishRule {
    /// Trim, remove one leading occurrence of the filler, then trim again
    StripPrefix(&'static str),
}

impl PolishRule {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::StripPrefix(filler) => {
                let text = text.trim();
                text.strip_prefix(filler).unwrap_or(text).trim().to_string()
            }
        }
    }
}

/// Target language accepted by the upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Ta,
    Te,
    Hi,
    Kn,
    Ml,
}

impl LanguageTag {
    pub const ALL: [LanguageTag; 5] = [Self::Ta, Self::Te, Self::Hi, Self::Kn, Self::Ml];

    /// External two-letter code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ta => "ta",
            Self::Te => "te",
            Self::Hi => "hi",
            Self::Kn => "kn",
            Self::Ml => "ml",
        }
    }

    /// Language identifier expected by the translation model
    pub fn model_code(&self) -> &'static str {
        match self {
            Self::Ta => "tam_Taml",
            Self::Te => "tel_Telu",
            Self::Hi => "hin_Deva",
            Self::Kn => "kan_Knda",
            Self::Ml => "mal_Mlym",
        }
    }

    /// The translator prepends an indefinite article in these languages
    pub fn polish_rule(&self) -> Option<PolishRule> {
        let filler = match self {
            Self::Ta => "ஒரு ",
            Self::Te => "ఒక ",
            Self::Hi => "एक ",
            Self::Kn => "ಒಂದು ",
            Self::Ml => "ഒരു ",
        };
        Some(PolishRule::StripPrefix(filler))
    }

    pub fn polish(&self, text: &str) -> String {
        match self.polish_rule() {
            Some(rule) => rule.apply(text),
            None => text.to_string(),
        }
    }
}

impl FromStr for LanguageTag {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.code() == s)
            .ok_or_else(|| UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
