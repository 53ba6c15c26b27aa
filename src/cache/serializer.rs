// src/cache/serializer.rs

//! Pluggable artifact serialization.
//!
//! The cache treats artifacts as opaque blobs; encoding and decoding go
//! through the [`Serializer`] trait so any artifact type with a stable byte
//! encoding can be cached. The required contract is byte-for-byte fidelity:
//! `decode(encode(x)) == x`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Encodes artifacts to bytes and back.
pub trait Serializer<A>: Send + Sync {
    fn encode(&self, artifact: &A) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<A>;
}

/// Default serializer: bincode over serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

impl<A> Serializer<A> for BincodeSerializer
where
    A: Serialize + DeserializeOwned,
{
    fn encode(&self, artifact: &A) -> Result<Vec<u8>> {
        bincode::serialize(artifact)
            .map_err(|e| PipelineError::serialization(format!("failed to encode artifact: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<A> {
        bincode::deserialize(bytes)
            .map_err(|e| PipelineError::serialization(format!("failed to decode artifact: {e}")))
    }
}

/// Serializer for artifacts that already are raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytesSerializer;

impl Serializer<Vec<u8>> for RawBytesSerializer {
    fn encode(&self, artifact: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(artifact.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
