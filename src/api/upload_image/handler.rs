// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload image endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::MultipartRejection;
use axum_extra::extract::Multipart;
use tracing::{error, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::request::UploadImageForm;
use crate::api::server::AppState;
use crate::pipeline::ResponseEnvelope;

/// POST /upload-image/ - Caption an image and translate the caption
///
/// Always answers 200. Failures are reported through sentinel text in the body.
pub async fn upload_image_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<ResponseEnvelope> {
    let request_id = Uuid::new_v4();
    let span = info_span!("upload_image", %request_id, lang = field::Empty);

    async move {
        let multipart = match multipart {
            Ok(multipart) => multipart,
            Err(rejection) => {
                warn!("Rejected upload: {}", rejection);
                return Json(ResponseEnvelope::error());
            }
        };

        let form = match UploadImageForm::from_multipart(multipart).await {
            Ok(form) => form,
            Err(e) => {
                warn!("Malformed upload form: {}", e);
                return Json(ResponseEnvelope::error());
            }
        };

        Span::current().record("lang", form.lang.as_str());
        info!(
            "Received {} byte image{}",
            form.file.len(),
            form.file_name
                .as_deref()
                .map(|n| format!(" ({})", n))
                .unwrap_or_default()
        );

        let orchestrator = state.orchestrator.clone();
        let span = Span::current();
        let result = tokio::task::spawn_blocking(move || {
            span.in_scope(|| orchestrator.handle_request(&form.file, &form.lang))
        })
        .await;

        match result {
            Ok(envelope) => Json(envelope),
            Err(e) => {
                error!("Pipeline task failed: {}", e);
                Json(ResponseEnvelope::error())
            }
        }
    }
    .instrument(span)
    .await
}
