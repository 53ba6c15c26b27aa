// src/voxel.rs

//! The voxel-grid artifact type and a minimal NumPy `.npy` reader for the
//! external voxelizer's output.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// A dense cubic occupancy grid of `size^3` signed byte counts, C-ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelGrid {
    size: u32,
    data: Vec<i8>,
}

impl VoxelGrid {
    /// Creates a grid from flat C-ordered data. The length must be `size^3`.
    pub fn new(size: u32, data: Vec<i8>) -> Result<Self> {
        let expected = (size as usize).pow(3);
        if data.len() != expected {
            return Err(PipelineError::serialization(format!(
                "voxel data has {} elements, expected {}^3 = {}",
                data.len(),
                size,
                expected
            )));
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn data(&self) -> &[i8] {
        &self.data
    }

    /// Value at `(x, y, z)`. Panics if any coordinate is out of range.
    pub fn get(&self, x: u32, y: u32, z: u32) -> i8 {
        assert!(x < self.size && y < self.size && z < self.size);
        let n = self.size as usize;
        self.data[(x as usize * n + y as usize) * n + z as usize]
    }

    /// Number of occupied (non-zero) voxels.
    pub fn occupancy(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Parse a NumPy `.npy` file holding a byte-typed array of `size^3`
    /// elements (any shape; only the element count matters).
    pub fn from_npy(bytes: &[u8], size: u32) -> Result<Self> {
        let data = read_npy_bytes(bytes)?;
        let data: Vec<i8> = data.iter().map(|&b| b as i8).collect();
        Self::new(size, data)
    }
}

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Read the raw element bytes of a `.npy` file holding a C-ordered array of
/// single-byte elements (`|i1` or `|u1`).
///
/// This covers exactly what the voxelizer emits; anything fancier (wider
/// dtypes, Fortran order, format v3 strings) is rejected.
fn read_npy_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(PipelineError::serialization("not an NPY file"));
    }
    let major = bytes[6];

    let (header_start, header_len) = match major {
        1 => {
            let len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
            (10usize, len)
        }
        2 => {
            if bytes.len() < 12 {
                return Err(PipelineError::serialization("truncated NPY v2 header"));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
            (12usize, len)
        }
        v => {
            return Err(PipelineError::serialization(format!(
                "unsupported NPY major version {v}"
            )));
        }
    };

    let data_start = header_start
        .checked_add(header_len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| PipelineError::serialization("truncated NPY header"))?;

    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| PipelineError::serialization("NPY header is not valid UTF-8"))?;

    if !(header.contains("'|i1'") || header.contains("'|u1'")) {
        return Err(PipelineError::serialization(format!(
            "unsupported NPY dtype in header: {}",
            header.trim_end()
        )));
    }
    if !header.contains("'fortran_order': False") {
        return Err(PipelineError::serialization(
            "Fortran-ordered NPY arrays are not supported",
        ));
    }

    Ok(bytes[data_start..].to_vec())
}
