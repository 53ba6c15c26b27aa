// src/storage/mod.rs

//! Storage abstraction for slot files.
//!
//! The repeat cache talks to the filesystem only through [`StorageBackend`]:
//! existence checks, whole-file reads, and atomic whole-file writes. The
//! default implementation is [`LocalStorage`]; tests substitute in-memory
//! backends to inject failures.

mod local;
mod traits;

pub use local::LocalStorage;
pub use traits::{FileBytes, StorageBackend};
