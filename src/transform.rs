// src/transform.rs

//! The transform contract consumed by the repeat cache, and the external
//! mesh-to-voxel conversion that implements it.
//!
//! A transform takes a source item path and produces an artifact. It must
//! report failure as an error; returning a sentinel artifact instead of
//! failing would poison the cache.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PipelineError, Result};
use crate::voxel::VoxelGrid;

/// A single-argument callable `source -> artifact`.
pub trait Transform<A>: Send + Sync {
    /// Produce an artifact for `source`. Blocking; may launch a subprocess.
    fn apply(&self, source: &Path) -> Result<A>;

    /// Short human-readable name for log lines.
    fn name(&self) -> &'static str {
        "transform"
    }
}

/// Adapter turning a closure into a [`Transform`].
pub struct FnTransform<F> {
    f: F,
}

impl<F> FnTransform<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<A, F> Transform<A> for FnTransform<F>
where
    F: Fn(&Path) -> Result<A> + Send + Sync,
{
    fn apply(&self, source: &Path) -> Result<A> {
        (self.f)(source)
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}

/// Voxelizes an OBJ mesh by running the external `obj2voxel` tool.
///
/// The tool rasterizes a mesh into a `size^3` occupancy grid and writes it
/// as a NumPy `.npy` file, which is then parsed into a [`VoxelGrid`]. With
/// `rotate` enabled the mesh is randomly rotated first, so repeated
/// invocations on the same item yield different grids; that is exactly the
/// one-to-many sampling the repeat cache exists to amortize.
pub struct Obj2Voxel {
    size: u32,
    rotate: bool,
    tmp_dir: PathBuf,
}

impl Obj2Voxel {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            rotate: true,
            tmp_dir: std::env::temp_dir(),
        }
    }

    /// Whether to randomly rotate the mesh before voxelizing.
    #[must_use]
    pub fn rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    /// Directory for the tool's intermediate output file.
    #[must_use]
    pub fn tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = dir.into();
        self
    }

    fn output_path(&self, source: &Path) -> PathBuf {
        // One scratch file per (process, item) so concurrent transforms of
        // different items do not clobber each other's output.
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("item");
        self.tmp_dir
            .join(format!("obj2voxel_{}_{}.npy", std::process::id(), stem))
    }
}

impl Transform<VoxelGrid> for Obj2Voxel {
    fn apply(&self, source: &Path) -> Result<VoxelGrid> {
        let item = source.display().to_string();
        let output = self.output_path(source);

        let mut command = Command::new("obj2voxel");
        command
            .arg("--size")
            .arg(self.size.to_string())
            .arg(source)
            .arg(&output);
        if self.rotate {
            command.arg("--rotate");
        }

        let status = command.status().map_err(|e| {
            PipelineError::transform_with_source(item.clone(), "failed to launch obj2voxel", e)
        })?;
        if !status.success() {
            return Err(PipelineError::transform(
                item,
                format!("obj2voxel exited with {status}"),
            ));
        }

        let bytes = std::fs::read(&output).map_err(|e| {
            PipelineError::transform_with_source(item.clone(), "failed to read obj2voxel output", e)
        })?;
        // Scratch file is consumed; best effort removal.
        let _ = std::fs::remove_file(&output);

        VoxelGrid::from_npy(&bytes, self.size)
    }

    fn name(&self) -> &'static str {
        "obj2voxel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_transform() {
        let t = FnTransform::new(|source: &Path| Ok(source.to_path_buf()));
        let out = t.apply(Path::new("a/b.obj")).unwrap();
        assert_eq!(out, Path::new("a/b.obj"));
        assert_eq!(t.name(), "fn");
    }

    #[test]
    fn test_obj2voxel_builder() {
        let t = Obj2Voxel::new(64).rotate(false).tmp_dir("/tmp/scratch");
        assert_eq!(t.size, 64);
        assert!(!t.rotate);
        assert_eq!(t.tmp_dir, Path::new("/tmp/scratch"));
        assert_eq!(Transform::<VoxelGrid>::name(&t), "obj2voxel");
    }

    #[test]
    fn test_obj2voxel_output_path_distinct_per_item() {
        let t = Obj2Voxel::new(32);
        let a = t.output_path(Path::new("chair_0001.obj"));
        let b = t.output_path(Path::new("chair_0002.obj"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_obj2voxel_missing_binary_is_transform_error() {
        // `obj2voxel` is not expected on test machines; launching must fail
        // with a Transform error carrying the item identity.
        let t = Obj2Voxel::new(8).tmp_dir(std::env::temp_dir());
        let err = t.apply(Path::new("no_such_item.obj")).unwrap_err();
        match err {
            PipelineError::Transform { item, .. } => assert_eq!(item, "no_such_item.obj"),
            other => panic!("expected Transform error, got {other}"),
        }
    }
}
