// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! HTTP contract tests for the router
//!
//! These tests verify that:
//! - GET / reports liveness
//! - POST /upload-image/ always answers 200 with {caption, translations}
//! - Malformed or oversized forms produce the error pair
//! - GET /models reports load state

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use caption_translate_node::api::{create_router, AppState};
use caption_translate_node::config::{CaptionFailurePolicy, DEFAULT_MAX_UPLOAD_BYTES};
use caption_translate_node::models::ModelRegistry;
use caption_translate_node::pipeline::RequestOrchestrator;
use caption_translate_node::storage::TempFileStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use crate::common::{png_bytes, registry_with, MockCaptioner, MockTranslation};

const BOUNDARY: &str = "----caption-translate-test-boundary";

fn app_with(registry: Arc<ModelRegistry>, max_upload_bytes: usize) -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Arc::new(RequestOrchestrator::from_registry(
        Arc::new(TempFileStore::new(dir.path())),
        registry.clone(),
        CaptionFailurePolicy::default(),
    ));
    let state = AppState::new(orchestrator, registry);
    (dir, create_router(state, max_upload_bytes))
}

fn healthy_registry() -> Arc<ModelRegistry> {
    let mut caption = MockCaptioner::new();
    caption
        .expect_caption()
        .returning(|_, _| Ok("a cat sleeping on a bed".to_string()));
    let mut translation = MockTranslation::new();
    translation
        .expect_translate()
        .returning(|_, _, _, _| Ok("एक बिस्तर पर सोती हुई बिल्ली".to_string()));
    registry_with(caption, translation)
}

/// Build a multipart/form-data body from (name, filename, bytes) parts
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload-image/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn error_pair() -> Value {
    json!({
        "caption": "Error generating caption",
        "translations": "Error translating caption"
    })
}

#[tokio::test]
async fn test_root_liveness() {
    let (_dir, app) = app_with(healthy_registry(), DEFAULT_MAX_UPLOAD_BYTES);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"message": "Backend is running!"}));
}

#[tokio::test]
async fn test_upload_image_success() {
    let (_dir, app) = app_with(healthy_registry(), DEFAULT_MAX_UPLOAD_BYTES);
    let image = png_bytes();
    let body = multipart_body(&[
        ("file", Some("cat.png"), image.as_slice()),
        ("lang", None, &b"hi"[..]),
    ]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "caption": "a cat sleeping on a bed",
            "translations": "बिस्तर पर सोती हुई बिल्ली"
        })
    );
}

#[tokio::test]
async fn test_upload_image_unsupported_language() {
    let (_dir, app) = app_with(healthy_registry(), DEFAULT_MAX_UPLOAD_BYTES);
    let image = png_bytes();
    let body = multipart_body(&[
        ("lang", None, &b"fr"[..]),
        ("file", Some("cat.png"), image.as_slice()),
    ]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["caption"], "a cat sleeping on a bed");
    assert_eq!(body["translations"], "Unsupported language");
}

#[tokio::test]
async fn test_upload_image_lang_is_not_trimmed() {
    let (_dir, app) = app_with(healthy_registry(), DEFAULT_MAX_UPLOAD_BYTES);
    let image = png_bytes();
    let body = multipart_body(&[
        ("file", Some("cat.png"), image.as_slice()),
        ("lang", None, &b" ta"[..]),
    ]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    let body = json_body(response).await;
    assert_eq!(body["caption"], "a cat sleeping on a bed");
    assert_eq!(body["translations"], "Unsupported language");
}

#[tokio::test]
async fn test_upload_image_missing_lang_is_error_pair() {
    let (_dir, app) = app_with(healthy_registry(), DEFAULT_MAX_UPLOAD_BYTES);
    let image = png_bytes();
    let body = multipart_body(&[("file", Some("cat.png"), image.as_slice())]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, error_pair());
}

#[tokio::test]
async fn test_upload_image_not_multipart_is_error_pair() {
    let (_dir, app) = app_with(healthy_registry(), DEFAULT_MAX_UPLOAD_BYTES);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload-image/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"lang": "hi"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, error_pair());
}

#[tokio::test]
async fn test_upload_image_over_limit_is_error_pair() {
    let (_dir, app) = app_with(healthy_registry(), 1024);
    let large = vec![0xABu8; 16 * 1024];
    let body = multipart_body(&[
        ("lang", None, &b"ta"[..]),
        ("file", Some("big.jpg"), large.as_slice()),
    ]);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, error_pair());
}

#[tokio::test]
async fn test_models_endpoint_reports_status() {
    let registry = healthy_registry();
    let (_dir, app) = app_with(registry.clone(), DEFAULT_MAX_UPLOAD_BYTES);

    let request = Request::builder().uri("/models").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["models"][0]["name"], "blip-caption");
    assert_eq!(body["models"][0]["status"], "not_loaded");

    registry.preload().unwrap();

    let request = Request::builder().uri("/models").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["models"][0]["status"], "ready");
    assert_eq!(body["models"][1]["kind"], "translation");
}
