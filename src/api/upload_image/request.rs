// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart form parsing for the upload endpoint

use axum_extra::extract::Multipart;
use thiserror::Error;
use tracing::debug;

/// Form field carrying the image bytes
pub const FILE_FIELD: &str = "file";

/// Form field carrying the target language tag
pub const LANG_FIELD: &str = "lang";

#[derive(Debug, Error)]
pub enum FormError {
    #[error("invalid multipart body: {0}")]
    Multipart(String),

    #[error("missing form field: {0}")]
    MissingField(&'static str),
}

/// Parsed `/upload-image/` form
#[derive(Debug, Clone)]
pub struct UploadImageForm {
    pub file: Vec<u8>,
    pub file_name: Option<String>,
    /// Target language as sent, validated later by the translator
    pub lang: String,
}

impl UploadImageForm {
    /// Read the `file` and `lang` fields; unknown fields are ignored
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, FormError> {
        let mut file = None;
        let mut file_name = None;
        let mut lang = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| FormError::Multipart(e.to_string()))?
        {
            match field.name() {
                Some(FILE_FIELD) => {
                    file_name = field.file_name().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| FormError::Multipart(e.to_string()))?;
                    file = Some(bytes.to_vec());
                }
                Some(LANG_FIELD) => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| FormError::Multipart(e.to_string()))?;
                    lang = Some(text);
                }
                other => debug!("Ignoring form field {:?}", other),
            }
        }

        Ok(Self {
            file: file.ok_or(FormError::MissingField(FILE_FIELD))?,
            file_name,
            lang: lang.ok_or(FormError::MissingField(LANG_FIELD))?,
        })
    }
}
