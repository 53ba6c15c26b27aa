// src/cache/slot.rs

//! Slot file naming and on-disk framing.
//!
//! A slot file holds one persisted artifact for one (item key, repeat index)
//! pair. The layout is:
//!
//! ```text
//! +--------------------+
//! | header len (u32 LE)|
//! +--------------------+
//! | Header (bincode)   |  <- SlotHeader
//! +--------------------+
//! | Payload            |  <- artifact bytes from the serializer
//! +--------------------+
//! ```
//!
//! The header carries an XXHash64 checksum of the payload so that truncated
//! or garbled files are detected on load instead of being handed back to the
//! caller.

use std::hash::Hasher;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::error::{PipelineError, Result};

/// File extension for slot files.
pub const SLOT_EXTENSION: &str = "slot";

/// Header for a slot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotHeader {
    /// Magic bytes identifying this as a slot file ("VXSL")
    pub magic: [u8; 4],
    /// Format version number
    pub version: u32,
    /// Payload size in bytes
    pub payload_len: u64,
    /// XXHash64 checksum of the payload
    pub checksum: u64,
}

impl SlotHeader {
    pub const MAGIC: [u8; 4] = *b"VXSL";
    pub const VERSION: u32 = 1;

    pub fn new(payload: &[u8]) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            payload_len: payload.len() as u64,
            checksum: checksum(payload),
        }
    }
}

fn checksum(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

/// Derive the item key for a source path: its file stem.
///
/// Distinct items must map to distinct keys; two source files that differ
/// only in extension or directory would collide, which the corpus layout
/// rules out.
pub fn item_key(source: &Path) -> Result<String> {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::storage(source, "source path has no file stem"))
}

/// Compute the slot path for `(source item, prefix, index)`.
///
/// Slots live next to the source item: `<dir>/<prefix><key>_<index>.slot`.
/// This function is the sole authority on slot naming; the filesystem is the
/// source of truth for which slots exist.
pub fn slot_path(source: &Path, prefix: &str, index: usize) -> Result<PathBuf> {
    let key = item_key(source)?;
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(format!("{prefix}{key}_{index}.{SLOT_EXTENSION}")))
}

/// Frame a serialized artifact payload into slot file bytes.
pub fn encode_slot(payload: &[u8]) -> Result<Vec<u8>> {
    let header = SlotHeader::new(payload);
    let header_bytes = bincode::serialize(&header)
        .map_err(|e| PipelineError::serialization(format!("failed to encode slot header: {e}")))?;

    let header_len = header_bytes.len() as u32;
    let mut out = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Validate slot file bytes and return the payload.
///
/// Any framing defect (short file, bad magic, version mismatch, length or
/// checksum mismatch) is reported as [`PipelineError::CorruptSlot`]; callers
/// recover by treating the slot as missing.
pub fn decode_slot<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a [u8]> {
    if bytes.len() < 4 {
        return Err(PipelineError::corrupt_slot(path, "file shorter than length prefix"));
    }

    let header_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let header_end = 4usize.checked_add(header_len).ok_or_else(|| {
        PipelineError::corrupt_slot(path, "header length overflows")
    })?;
    if bytes.len() < header_end {
        return Err(PipelineError::corrupt_slot(path, "file shorter than header"));
    }

    let header: SlotHeader = bincode::deserialize(&bytes[4..header_end])
        .map_err(|e| PipelineError::corrupt_slot(path, format!("unreadable header: {e}")))?;

    if header.magic != SlotHeader::MAGIC {
        return Err(PipelineError::corrupt_slot(path, "bad magic bytes"));
    }
    if header.version != SlotHeader::VERSION {
        return Err(PipelineError::corrupt_slot(
            path,
            format!("unsupported version {}", header.version),
        ));
    }

    let payload = &bytes[header_end..];
    if payload.len() as u64 != header.payload_len {
        return Err(PipelineError::corrupt_slot(
            path,
            format!(
                "payload length {} does not match header {}",
                payload.len(),
                header.payload_len
            ),
        ));
    }
    if checksum(payload) != header.checksum {
        return Err(PipelineError::corrupt_slot(path, "checksum mismatch"));
    }

    Ok(payload)
}
