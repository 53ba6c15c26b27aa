// src/dataset/layout.rs

//! Corpus tree layout: enumeration, label derivation, and legacy-format
//! conversion.
//!
//! The expected on-disk layout is `<root>/<label>/<split>/<item>.obj`. The
//! label of an item is a path-structural fact: the third-from-last path
//! component. Enumeration is sorted so indices are reproducible across runs
//! and processes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Split;
use crate::error::{PipelineError, Result};

/// Enumerate all `.obj` items under `<root>/<label>/<split>/`, sorted.
///
/// A missing root or an empty tree yields an empty vector; deciding whether
/// that is fatal is the caller's job.
pub fn scan(root: &Path, split: Split) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !root.is_dir() {
        return Ok(files);
    }

    let labels = fs::read_dir(root)
        .map_err(|e| PipelineError::storage_with_source(root, "failed to read corpus root", e))?;

    for label_entry in labels {
        let label_entry = label_entry.map_err(|e| {
            PipelineError::storage_with_source(root, "failed to read corpus root entry", e)
        })?;
        let split_dir = label_entry.path().join(split.dir_name());
        if !split_dir.is_dir() {
            continue;
        }

        let items = fs::read_dir(&split_dir).map_err(|e| {
            PipelineError::storage_with_source(&split_dir, "failed to read split directory", e)
        })?;
        for item in items {
            let item = item.map_err(|e| {
                PipelineError::storage_with_source(&split_dir, "failed to read split entry", e)
            })?;
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) == Some("obj") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Derive the label token for an item path: its third-from-last component.
///
/// For `root/chair/train/chair_0001.obj` this is `chair`.
pub fn label_token(path: &Path) -> Result<&str> {
    path.iter()
        .rev()
        .nth(2)
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            PipelineError::storage(path, "item path too shallow to carry a <label>/<split> prefix")
        })
}

/// Convert every legacy `.off` mesh under `<root>/<label>/<split>/` into a
/// sibling `.obj` file. Existing `.obj` files are left alone. Returns the
/// number of files converted.
pub fn convert_off_tree(root: &Path) -> Result<usize> {
    let mut converted = 0;

    for label_entry in read_dir(root)? {
        for split_entry in read_dir(&label_entry)? {
            for path in read_dir(&split_entry)? {
                if path.extension().and_then(|e| e.to_str()) != Some("off") {
                    continue;
                }
                let target = path.with_extension("obj");
                if target.exists() {
                    continue;
                }

                let content = fs::read_to_string(&path).map_err(|e| {
                    PipelineError::storage_with_source(&path, "failed to read OFF file", e)
                })?;
                let obj = off_to_obj(&content).map_err(|e| {
                    PipelineError::storage(&path, format!("OFF conversion failed: {e}"))
                })?;
                fs::write(&target, obj).map_err(|e| {
                    PipelineError::storage_with_source(&target, "failed to write OBJ file", e)
                })?;
                converted += 1;
            }
        }
    }

    Ok(converted)
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| PipelineError::storage_with_source(dir, "failed to read directory", e))?
    {
        let entry = entry
            .map_err(|e| PipelineError::storage_with_source(dir, "failed to read entry", e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// Translate one OFF mesh into OBJ text.
///
/// Handles the plain OFF dialect the corpus uses: an `OFF` marker line, a
/// `<vertices> <faces> <edges>` count line, vertex lines, then face lines
/// whose first token is the vertex count of that face. OBJ face indices are
/// 1-based.
pub fn off_to_obj(content: &str) -> Result<String> {
    let mut lines = content.lines();

    let marker = lines
        .next()
        .ok_or_else(|| PipelineError::serialization("empty OFF file"))?;
    if marker.trim() != "OFF" {
        return Err(PipelineError::serialization(format!(
            "expected OFF marker, found '{marker}'"
        )));
    }

    let counts = lines
        .next()
        .ok_or_else(|| PipelineError::serialization("OFF file missing count line"))?;
    let mut count_iter = counts.split_whitespace();
    let n_vertices: usize = parse_count(count_iter.next(), "vertex count")?;
    let n_faces: usize = parse_count(count_iter.next(), "face count")?;

    let mut out = String::from("o object\n");

    for i in 0..n_vertices {
        let line = lines.next().ok_or_else(|| {
            PipelineError::serialization(format!("OFF file truncated at vertex {i}"))
        })?;
        out.push_str("v ");
        out.push_str(line.trim());
        out.push('\n');
    }

    for i in 0..n_faces {
        let line = lines.next().ok_or_else(|| {
            PipelineError::serialization(format!("OFF file truncated at face {i}"))
        })?;
        let mut tokens = line.split_whitespace();
        let arity: usize = parse_count(tokens.next(), "face arity")?;

        out.push('f');
        for _ in 0..arity {
            let index: usize = parse_count(tokens.next(), "face index")?;
            // OBJ indices are 1-based.
            out.push(' ');
            out.push_str(&(index + 1).to_string());
        }
        out.push('\n');
    }

    Ok(out)
}

fn parse_count(token: Option<&str>, what: &str) -> Result<usize> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| PipelineError::serialization(format!("OFF file has invalid {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plant(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_sorted_across_labels() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0002.obj", "");
        plant(temp.path(), "chair/train/chair_0001.obj", "");
        plant(temp.path(), "bed/train/bed_0001.obj", "");
        plant(temp.path(), "bed/test/bed_9001.obj", "");
        plant(temp.path(), "chair/train/notes.txt", "");

        let files = scan(temp.path(), Split::Train).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "bed/train/bed_0001.obj",
                "chair/train/chair_0001.obj",
                "chair/train/chair_0002.obj"
            ]
        );
    }

    #[test]
    fn test_scan_test_split() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "bed/train/bed_0001.obj", "");
        plant(temp.path(), "bed/test/bed_9001.obj", "");

        let files = scan(temp.path(), Split::Test).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("bed/test/bed_9001.obj"));
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let files = scan(&temp.path().join("nope"), Split::Train).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_label_token() {
        assert_eq!(
            label_token(Path::new("root/chair/train/item1.obj")).unwrap(),
            "chair"
        );
        assert_eq!(
            label_token(Path::new("/data/modelnet10/night_stand/test/night_stand_0200.obj"))
                .unwrap(),
            "night_stand"
        );
    }

    #[test]
    fn test_label_token_too_shallow() {
        assert!(label_token(Path::new("item1.obj")).is_err());
        assert!(label_token(Path::new("train/item1.obj")).is_err());
    }

    const OFF_TETRAHEDRON: &str = "OFF\n4 4 6\n0 0 0\n1 0 0\n0 1 0\n0 0 1\n3 0 1 2\n3 0 1 3\n3 0 2 3\n3 1 2 3\n";

    #[test]
    fn test_off_to_obj() {
        let obj = off_to_obj(OFF_TETRAHEDRON).unwrap();
        let lines: Vec<_> = obj.lines().collect();
        assert_eq!(lines[0], "o object");
        assert_eq!(lines[1], "v 0 0 0");
        assert_eq!(lines[4], "v 0 0 1");
        assert_eq!(lines[5], "f 1 2 3");
        assert_eq!(lines[8], "f 2 3 4");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_off_to_obj_quad_face() {
        let off = "OFF\n4 1 4\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n";
        let obj = off_to_obj(off).unwrap();
        assert!(obj.lines().any(|l| l == "f 1 2 3 4"));
    }

    #[test]
    fn test_off_to_obj_rejects_bad_marker() {
        assert!(off_to_obj("PLY\n0 0 0\n").is_err());
        assert!(off_to_obj("").is_err());
    }

    #[test]
    fn test_off_to_obj_rejects_truncation() {
        assert!(off_to_obj("OFF\n4 4 6\n0 0 0\n").is_err());
    }

    #[test]
    fn test_convert_off_tree() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0001.off", OFF_TETRAHEDRON);
        plant(temp.path(), "chair/train/chair_0002.off", OFF_TETRAHEDRON);
        plant(temp.path(), "bed/test/bed_0001.off", OFF_TETRAHEDRON);

        let converted = convert_off_tree(temp.path()).unwrap();
        assert_eq!(converted, 3);
        assert!(temp.path().join("chair/train/chair_0001.obj").exists());
        assert!(temp.path().join("bed/test/bed_0001.obj").exists());

        // Idempotent: nothing left to convert.
        assert_eq!(convert_off_tree(temp.path()).unwrap(), 0);
    }

    #[test]
    fn test_convert_off_tree_skips_existing_obj() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0001.off", OFF_TETRAHEDRON);
        plant(temp.path(), "chair/train/chair_0001.obj", "o pre-existing\n");

        assert_eq!(convert_off_tree(temp.path()).unwrap(), 0);
        let kept = fs::read_to_string(temp.path().join("chair/train/chair_0001.obj")).unwrap();
        assert_eq!(kept, "o pre-existing\n");
    }
}
