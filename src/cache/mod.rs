// src/cache/mod.rs

//! Filesystem-backed repeat caching.
//!
//! This module provides [`RepeatCache`], which stores up to `repeat`
//! independently indexed outputs of an expensive transform per item and
//! serves them back without recomputation. See [`slot`] for the on-disk
//! layout.
//!
//! There is deliberately no eviction, no TTL, and no cross-process
//! coordination: this is a local, per-process memoization layer addressed
//! purely through deterministic file paths.

mod locks;
mod repeat;
mod serializer;
pub mod slot;

pub use locks::{KeyGuard, KeyLocks};
pub use repeat::{Cached, RepeatCache};
pub use serializer::{BincodeSerializer, RawBytesSerializer, Serializer};
