// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {

    #[error("Storage error at '{}': {message}", .path.display())]
    Storage {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Transform failed for '{item}': {message}")]
    Transform {
        item: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Corrupt slot at '{}': {message}", .path.display())]
    CorruptSlot {
        path: PathBuf,
        message: String,
    },

    #[error("Index {index} out of range (dataset length: {len})")]
    IndexOutOfRange {
        index: usize,
        len: usize,
    },

    #[error("Dataset not found under '{}': no items match <label>/<split>/*.obj", .root.display())]
    DatasetNotFound {
        root: PathBuf,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// Convenience constructors
impl PipelineError {

    pub fn storage(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn transform(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            item: item.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn transform_with_source(
        item: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transform {
            item: item.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn corrupt_slot(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptSlot {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    pub fn dataset_not_found(root: impl Into<PathBuf>) -> Self {
        Self::DatasetNotFound { root: root.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether this error is recoverable by recomputing the slot it came from.
    ///
    /// Storage read failures and decode failures both mean "treat the slot as
    /// missing"; everything else must propagate to the caller.
    pub fn is_slot_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CorruptSlot { .. } | Self::Storage { .. } | Self::Serialization { .. }
        )
    }
}
