// src/lib.rs

//! voxelset - dataset preparation for voxelized 3D-shape learning.
//!
//! This crate provides the data-side plumbing for training rotation-aware
//! models on mesh corpora such as ModelNet-10:
//!
//! - a filesystem-backed **repeat cache** ([`RepeatCache`]) that stores
//!   several independently indexed outputs of an expensive, randomizable
//!   transform per item and serves them back without recomputation;
//! - a **dataset iterator** ([`ModelNetDataset`]) over a
//!   `<label>/<split>/<item>.obj` corpus tree, producing (artifact, label)
//!   pairs through the cache;
//! - the external **mesh voxelization** transform ([`Obj2Voxel`]) and the
//!   [`VoxelGrid`] artifact type it produces.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use voxelset::{
//!     BincodeSerializer, CacheConfig, LocalStorage, ModelNetDataset, Obj2Voxel,
//!     RepeatCache, Split, modelnet10_class_index,
//! };
//!
//! let cache = RepeatCache::new(
//!     CacheConfig { prefix: "v64_".into(), repeat: 24, pick_randomly: true },
//!     Arc::new(Obj2Voxel::new(64)),
//!     Arc::new(BincodeSerializer),
//!     Arc::new(LocalStorage::default()),
//! )?;
//!
//! let dataset = ModelNetDataset::new(
//!     "./modelnet10",
//!     Split::Train,
//!     cache,
//!     Arc::new(modelnet10_class_index),
//! )?;
//!
//! let (grid, class) = dataset.get(0)?;
//! ```

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod storage;
pub mod transform;
pub mod voxel;

// Re-export commonly used types for convenience
pub use cache::{BincodeSerializer, Cached, RawBytesSerializer, RepeatCache, Serializer};
pub use config::{CacheConfig, DatasetConfig, PipelineConfig, Split, StorageConfig};
pub use dataset::{modelnet10_class_index, LabelMap, ModelNetDataset, MODELNET10_CLASSES};
pub use error::{PipelineError, Result};
pub use storage::{FileBytes, LocalStorage, StorageBackend};
pub use transform::{FnTransform, Obj2Voxel, Transform};
pub use voxel::VoxelGrid;
