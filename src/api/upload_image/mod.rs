// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload image API endpoint module
//!
//! Provides POST /upload-image/ for captioning and translating an image.

pub mod handler;
pub mod request;

pub use handler::upload_image_handler;
pub use request::{FormError, UploadImageForm};
