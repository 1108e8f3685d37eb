// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod handlers;
pub mod server;
pub mod upload_image;

pub use handlers::{models_handler, root_handler, ModelsResponse, RootResponse};
pub use server::{create_router, ApiServer, AppState};
pub use upload_image::upload_image_handler;
