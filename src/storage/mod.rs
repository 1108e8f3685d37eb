// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod upload;

// Re-export main types for convenience
pub use upload::{SingleSlotStore, StoredUpload, TempFileStore, UploadStore};
