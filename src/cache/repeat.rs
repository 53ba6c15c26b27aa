// src/cache/repeat.rs

//! The per-item repeat cache.
//!
//! `RepeatCache` memoizes the output of an expensive, possibly randomized
//! transform. Each item owns up to `repeat` independently stored slots, so a
//! non-deterministic transform (a randomly rotated voxelization, say) can be
//! rendered several times up front and served cheaply afterwards.
//!
//! Slots are created lazily on first miss and never deleted; a slot is only
//! rewritten after it has been judged corrupt on load. Slot existence is
//! decided purely by the deterministic slot path, so separate processes
//! sharing a directory reuse each other's work.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use voxelset::{BincodeSerializer, CacheConfig, LocalStorage, Obj2Voxel, RepeatCache};
//!
//! let config = CacheConfig { prefix: "v64_".into(), repeat: 24, pick_randomly: true };
//! let cache = RepeatCache::new(
//!     config,
//!     Arc::new(Obj2Voxel::new(64).rotate(true)),
//!     Arc::new(BincodeSerializer),
//!     Arc::new(LocalStorage::default()),
//! )?;
//!
//! let grid = cache.fetch_one(Path::new("corpus/chair/train/chair_0001.obj"))?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::storage::StorageBackend;
use crate::transform::Transform;

use super::locks::KeyLocks;
use super::serializer::Serializer;
use super::slot;

/// Result of a dispatching [`RepeatCache::fetch`] call.
#[derive(Debug, PartialEq)]
pub enum Cached<A> {
    /// One randomly selected variant (`pick_randomly = true`).
    One(A),
    /// All variants in slot-index order (`pick_randomly = false`).
    Many(Vec<A>),
}

impl<A> Cached<A> {
    /// Number of artifacts carried.
    pub fn count(&self) -> usize {
        match self {
            Cached::One(_) => 1,
            Cached::Many(v) => v.len(),
        }
    }
}

/// Filesystem-backed memoization of a one-to-many repeated transform.
pub struct RepeatCache<A> {
    config: CacheConfig,
    transform: Arc<dyn Transform<A>>,
    serializer: Arc<dyn Serializer<A>>,
    storage: Arc<dyn StorageBackend>,
    locks: KeyLocks,
}

impl<A> RepeatCache<A> {
    /// Creates a cache. Fails if the configuration is invalid
    /// (`repeat == 0` or an unusable prefix).
    pub fn new(
        config: CacheConfig,
        transform: Arc<dyn Transform<A>>,
        serializer: Arc<dyn Serializer<A>>,
        storage: Arc<dyn StorageBackend>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transform,
            serializer,
            storage,
            locks: KeyLocks::new(),
        })
    }

    /// Serve an artifact for `source`, dispatching on `pick_randomly`.
    pub fn fetch(&self, source: &Path) -> Result<Cached<A>> {
        if self.config.pick_randomly {
            self.fetch_one(source).map(Cached::One)
        } else {
            self.fetch_all(source).map(Cached::Many)
        }
    }

    /// Randomized mode: serve one variant.
    ///
    /// If every slot exists, a uniformly random one is loaded and returned.
    /// A failed load marks that slot missing and falls through to
    /// recomputation (the fresh sample is not traded for another stored
    /// slot). Otherwise the transform runs once and the result is persisted
    /// to the lowest missing slot index and returned directly, without a
    /// re-read. At most one transform invocation per call.
    pub fn fetch_one(&self, source: &Path) -> Result<A> {
        let key = slot::item_key(source)?;
        let _guard = self.locks.lock(&key);

        let paths = self.slot_paths(source)?;
        let mut exists = Vec::with_capacity(paths.len());
        for path in &paths {
            exists.push(self.storage.exists(path)?);
        }

        let fill_index = match exists.iter().position(|&e| !e) {
            Some(first_missing) => first_missing,
            None => {
                // All slots present: pick one at random.
                let i = rand::thread_rng().gen_range(0..self.config.repeat);
                match self.load_slot(&paths[i]) {
                    Ok(artifact) => return Ok(artifact),
                    Err(e) if e.is_slot_recoverable() => {
                        tracing::warn!(
                            "slot {} unreadable, recomputing: {}",
                            paths[i].display(),
                            e
                        );
                        i
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let artifact = self.run_transform(source)?;
        self.store_slot(&paths[fill_index], &artifact)?;
        Ok(artifact)
    }

    /// Exhaustive mode: materialize and return every variant in index order.
    ///
    /// Each slot that fails to load (including "does not exist") is
    /// recomputed and persisted at its own index. A fully materialized,
    /// uncorrupted item costs zero transform invocations.
    pub fn fetch_all(&self, source: &Path) -> Result<Vec<A>> {
        let key = slot::item_key(source)?;
        let _guard = self.locks.lock(&key);

        let paths = self.slot_paths(source)?;
        let mut output = Vec::with_capacity(paths.len());

        for path in &paths {
            let artifact = match self.load_slot(path) {
                Ok(artifact) => artifact,
                Err(e) if e.is_slot_recoverable() => {
                    if self.storage.exists(path)? {
                        tracing::warn!("slot {} unreadable, recomputing: {}", path.display(), e);
                    }
                    let artifact = self.run_transform(source)?;
                    self.store_slot(path, &artifact)?;
                    artifact
                }
                Err(e) => return Err(e),
            };
            output.push(artifact);
        }

        Ok(output)
    }

    /// Configured number of slots per item.
    pub fn repeat(&self) -> usize {
        self.config.repeat
    }

    /// Configured slot-file prefix.
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    fn slot_paths(&self, source: &Path) -> Result<Vec<PathBuf>> {
        (0..self.config.repeat)
            .map(|i| slot::slot_path(source, &self.config.prefix, i))
            .collect()
    }

    fn load_slot(&self, path: &Path) -> Result<A> {
        let bytes = self.storage.read(path)?;
        let payload = slot::decode_slot(path, &bytes)?;
        self.serializer.decode(payload)
    }

    fn store_slot(&self, path: &Path, artifact: &A) -> Result<()> {
        let payload = self.serializer.encode(artifact)?;
        let framed = slot::encode_slot(&payload)?;
        self.storage.write_atomic(path, &framed)
    }

    fn run_transform(&self, source: &Path) -> Result<A> {
        let name = self.transform.name();
        tracing::info!("{} transforming {}", name, source.display());
        match self.transform.apply(source) {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                tracing::error!("{} failed for {}: {}", name, source.display(), e);
                Err(e)
            }
        }
    }
}
