// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistence of uploaded image bytes before captioning

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::vision::image_utils::{detect_format, format_to_extension};

/// An upload written to disk
///
/// Request-scoped uploads are deleted when this value is dropped.
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
    _guard: Option<NamedTempFile>,
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self._guard.is_some()
    }
}

/// Writes uploaded bytes to a path the caption stage can read
pub trait UploadStore: Send + Sync {
    fn persist(&self, bytes: &[u8]) -> io::Result<StoredUpload>;
}

/// One temp file per request, removed when the request finishes
#[derive(Debug, Clone)]
pub struct TempFileStore {
    dir: PathBuf,
}

impl TempFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for TempFileStore {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl UploadStore for TempFileStore {
    fn persist(&self, bytes: &[u8]) -> io::Result<StoredUpload> {
        std::fs::create_dir_all(&self.dir)?;

        let extension = detect_format(bytes)
            .map(format_to_extension)
            .unwrap_or("bin");

        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(&self.dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        debug!("Stored {} byte upload at {}", bytes.len(), path.display());

        Ok(StoredUpload {
            path,
            _guard: Some(file),
        })
    }
}

/// Every upload overwrites the same file
///
/// Concurrent requests race on the slot.
#[derive(Debug, Clone)]
pub struct SingleSlotStore {
    path: PathBuf,
}

impl SingleSlotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UploadStore for SingleSlotStore {
    fn persist(&self, bytes: &[u8]) -> io::Result<StoredUpload> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;

        debug!("Stored {} byte upload at {}", bytes.len(), self.path.display());

        Ok(StoredUpload {
            path: self.path.clone(),
            _guard: None,
        })
    }
}
