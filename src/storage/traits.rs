// src/storage/traits.rs

use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use crate::error::Result;

/// Abstraction over where slot files live.
///
/// The repeat cache never interprets slot contents; it only needs existence
/// checks, whole-file reads, and atomic whole-file writes. Keeping this behind
/// a trait lets tests substitute in-memory backends and inject failures.
pub trait StorageBackend: Send + Sync {
    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> Result<bool>;

    /// Read the entire file at `path`.
    fn read(&self, path: &Path) -> Result<FileBytes>;

    /// Write `data` to `path` so that concurrent readers never observe a
    /// partially written file. Parent directories are created as needed.
    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()>;
}

/// Bytes returned by a whole-file read.
///
/// Large files may come back memory-mapped instead of buffered; callers only
/// ever see a `&[u8]` either way.
pub enum FileBytes {
    Buffered(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileBytes::Buffered(v) => v,
            FileBytes::Mapped(m) => m,
        }
    }
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl std::fmt::Debug for FileBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            FileBytes::Buffered(_) => "Buffered",
            FileBytes::Mapped(_) => "Mapped",
        };
        write!(f, "FileBytes::{}({} bytes)", kind, self.len())
    }
}
