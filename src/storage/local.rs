// src/storage/local.rs

//! Local filesystem storage backend.
//!
//! Reads memory-map files above a configurable size threshold; writes go
//! through a temporary file in the same directory followed by a rename, so a
//! slot file is either absent, the old version, or the complete new version.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;

use super::traits::{FileBytes, StorageBackend};
use crate::config::StorageConfig;
use crate::error::{PipelineError, Result};

/// Local filesystem storage.
pub struct LocalStorage {
    use_mmap: bool,
    mmap_threshold: u64,
}

impl LocalStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            use_mmap: config.use_mmap,
            mmap_threshold: config.mmap_threshold,
        }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(&StorageConfig::default())
    }
}

impl StorageBackend for LocalStorage {
    fn exists(&self, path: &Path) -> Result<bool> {
        Ok(path.exists())
    }

    fn read(&self, path: &Path) -> Result<FileBytes> {
        let file = File::open(path)
            .map_err(|e| PipelineError::storage_with_source(path, "failed to open file", e))?;

        let meta = file.metadata().map_err(|e| {
            PipelineError::storage_with_source(path, "failed to read file metadata", e)
        })?;

        if self.use_mmap && meta.len() >= self.mmap_threshold {
            // SAFETY: the file is opened read-only and the Mmap owns the
            // handle for the lifetime of the returned bytes.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
                PipelineError::storage_with_source(path, "failed to memory-map file", e)
            })?;
            Ok(FileBytes::Mapped(mmap))
        } else {
            let data = fs::read(path)
                .map_err(|e| PipelineError::storage_with_source(path, "failed to read file", e))?;
            Ok(FileBytes::Buffered(data))
        }
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            PipelineError::storage(path, "path has no parent directory")
        })?;

        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                PipelineError::storage_with_source(parent, "failed to create parent directories", e)
            })?;
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PipelineError::storage(path, "path has no valid file name"))?;

        // Temp file lives next to the destination so the rename stays on the
        // same filesystem.
        let temp_path = parent.join(format!(".{file_name}.tmp"));

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| {
                PipelineError::storage_with_source(&temp_path, "failed to create temp file", e)
            })?;

        file.write_all(data).map_err(|e| {
            PipelineError::storage_with_source(&temp_path, "failed to write temp file", e)
        })?;
        file.sync_all().map_err(|e| {
            PipelineError::storage_with_source(&temp_path, "failed to sync temp file", e)
        })?;
        drop(file);

        fs::rename(&temp_path, path).map_err(|e| {
            PipelineError::storage_with_source(
                &temp_path,
                format!("failed to rename to {}", path.display()),
                e,
            )
        })
    }
}
