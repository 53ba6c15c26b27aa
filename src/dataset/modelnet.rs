// src/dataset/modelnet.rs

//! ModelNet-style dataset iteration.
//!
//! `ModelNetDataset` presents (artifact, label) pairs over a
//! `<root>/<label>/<split>/<item>.obj` corpus, routing artifact production
//! through a [`RepeatCache`] and label mapping through an injected pure
//! function.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{Cached, RepeatCache, Serializer};
use crate::config::{PipelineConfig, Split};
use crate::error::{PipelineError, Result};
use crate::storage::LocalStorage;
use crate::transform::Transform;

use super::layout;

/// The ten ModelNet-10 categories, in canonical (sorted) order.
pub const MODELNET10_CLASSES: [&str; 10] = [
    "bathtub",
    "bed",
    "chair",
    "desk",
    "dresser",
    "monitor",
    "night_stand",
    "sofa",
    "table",
    "toilet",
];

/// Label map from a category token to its ModelNet-10 class index.
pub fn modelnet10_class_index(token: &str) -> Result<usize> {
    MODELNET10_CLASSES
        .iter()
        .position(|&c| c == token)
        .ok_or_else(|| {
            PipelineError::config(format!("'{token}' is not a ModelNet-10 category"))
        })
}

/// Pure function turning a raw label token into the consumer's label type.
pub type LabelMap<L> = Arc<dyn Fn(&str) -> Result<L> + Send + Sync>;

/// A sequence of (artifact, label) pairs over an on-disk mesh corpus.
///
/// The item list is enumerated once, sorted, at construction time; indices
/// are stable across runs for the same tree. Artifacts come from the repeat
/// cache, so iterating an already-materialized corpus performs no transform
/// work.
pub struct ModelNetDataset<A, L> {
    files: Vec<PathBuf>,
    cache: RepeatCache<A>,
    label_map: LabelMap<L>,
}

impl<A, L> std::fmt::Debug for ModelNetDataset<A, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelNetDataset")
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl<A, L> ModelNetDataset<A, L> {
    /// Enumerate `<root>/<label>/<split>/*.obj` and build the dataset.
    ///
    /// The corpus must already be materialized on disk (fetched, extracted,
    /// and converted to OBJ); an empty enumeration is
    /// [`PipelineError::DatasetNotFound`].
    pub fn new(
        root: impl AsRef<Path>,
        split: Split,
        cache: RepeatCache<A>,
        label_map: LabelMap<L>,
    ) -> Result<Self> {
        let root = root.as_ref();
        let files = layout::scan(root, split)?;
        if files.is_empty() {
            return Err(PipelineError::dataset_not_found(root));
        }
        Ok(Self {
            files,
            cache,
            label_map,
        })
    }

    /// Build the cache and dataset from a parsed [`PipelineConfig`].
    ///
    /// `config.cache` drives the repeat cache, `config.storage` the local
    /// backend, and `config.dataset` the corpus root and split. Transform,
    /// serializer, and label map stay caller-supplied; they carry type
    /// parameters a config file cannot express.
    pub fn from_config(
        config: &PipelineConfig,
        transform: Arc<dyn Transform<A>>,
        serializer: Arc<dyn Serializer<A>>,
        label_map: LabelMap<L>,
    ) -> Result<Self> {
        let storage = Arc::new(LocalStorage::new(&config.storage));
        let cache = RepeatCache::new(config.cache.clone(), transform, serializer, storage)?;
        Self::new(&config.dataset.root, config.dataset.split, cache, label_map)
    }

    /// Number of enumerable items.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The enumerated item paths, in index order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Resolve the item at `index` into its artifact(s) and mapped label.
    ///
    /// Out-of-range indices are reported, never clamped.
    pub fn get(&self, index: usize) -> Result<(Cached<A>, L)> {
        let path = self
            .files
            .get(index)
            .ok_or_else(|| PipelineError::index_out_of_range(index, self.files.len()))?;

        let token = layout::label_token(path)?;
        let label = (self.label_map.as_ref())(token)?;
        let artifact = self.cache.fetch(path)?;
        Ok((artifact, label))
    }

    /// Iterate all items in index order.
    pub fn iter(&self) -> impl Iterator<Item = Result<(Cached<A>, L)>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BincodeSerializer;
    use crate::config::CacheConfig;
    use crate::storage::LocalStorage;
    use crate::transform::{FnTransform, Transform};
    use std::fs;
    use tempfile::TempDir;

    fn plant(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "o object\n").unwrap();
    }

    fn stem_cache(pick_randomly: bool) -> RepeatCache<String> {
        let transform: Arc<dyn Transform<String>> = Arc::new(FnTransform::new(|source: &Path| {
            Ok(source.file_stem().unwrap().to_str().unwrap().to_string())
        }));
        RepeatCache::new(
            CacheConfig {
                prefix: "t_".to_string(),
                repeat: 1,
                pick_randomly,
            },
            transform,
            Arc::new(BincodeSerializer),
            Arc::new(LocalStorage::default()),
        )
        .unwrap()
    }

    fn identity_labels() -> LabelMap<String> {
        Arc::new(|token: &str| Ok(token.to_string()))
    }

    #[test]
    fn test_len_fixed_at_construction() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0001.obj");
        plant(temp.path(), "bed/train/bed_0001.obj");

        let dataset =
            ModelNetDataset::new(temp.path(), Split::Train, stem_cache(true), identity_labels())
                .unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.is_empty());

        // Files added after construction are not observed.
        plant(temp.path(), "sofa/train/sofa_0001.obj");
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_get_returns_artifact_and_label() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/item1.obj");

        let dataset =
            ModelNetDataset::new(temp.path(), Split::Train, stem_cache(true), identity_labels())
                .unwrap();
        let (artifact, label) = dataset.get(0).unwrap();
        assert_eq!(artifact, Cached::One("item1".to_string()));
        assert_eq!(label, "chair");
    }

    #[test]
    fn test_label_mapping_applied() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0001.obj");
        plant(temp.path(), "bed/train/bed_0001.obj");

        let label_map: LabelMap<usize> = Arc::new(modelnet10_class_index);
        let dataset =
            ModelNetDataset::new(temp.path(), Split::Train, stem_cache(true), label_map).unwrap();

        // Sorted enumeration puts bed before chair.
        let (_, bed) = dataset.get(0).unwrap();
        let (_, chair) = dataset.get(1).unwrap();
        assert_eq!(bed, 1);
        assert_eq!(chair, 2);
    }

    #[test]
    fn test_get_out_of_range() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0001.obj");

        let dataset =
            ModelNetDataset::new(temp.path(), Split::Train, stem_cache(true), identity_labels())
                .unwrap();
        let err = dataset.get(dataset.len()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::IndexOutOfRange { index: 1, len: 1 }
        ));
    }

    #[test]
    fn test_missing_corpus_is_dataset_not_found() {
        let temp = TempDir::new().unwrap();
        let err = ModelNetDataset::new(
            temp.path().join("absent"),
            Split::Train,
            stem_cache(true),
            identity_labels(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::DatasetNotFound { .. }));
    }

    #[test]
    fn test_exhaustive_mode_returns_many() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/test/chair_0900.obj");

        let dataset =
            ModelNetDataset::new(temp.path(), Split::Test, stem_cache(false), identity_labels())
                .unwrap();
        let (artifact, _) = dataset.get(0).unwrap();
        assert_eq!(artifact, Cached::Many(vec!["chair_0900".to_string()]));
    }

    #[test]
    fn test_iter_visits_all_items() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0001.obj");
        plant(temp.path(), "bed/train/bed_0001.obj");
        plant(temp.path(), "sofa/train/sofa_0001.obj");

        let dataset =
            ModelNetDataset::new(temp.path(), Split::Train, stem_cache(true), identity_labels())
                .unwrap();
        let labels: Vec<String> = dataset.iter().map(|r| r.unwrap().1).collect();
        assert_eq!(labels, vec!["bed", "chair", "sofa"]);
    }

    #[test]
    fn test_from_config_wires_cache_and_dataset() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0001.obj");

        let toml = format!(
            r#"
            [cache]
            prefix = "cfg_"
            repeat = 2
            pick_randomly = false

            [dataset]
            root = '{}'
            split = "train"
            "#,
            temp.path().display()
        );
        let config: PipelineConfig = toml.parse().unwrap();

        let transform: Arc<dyn Transform<String>> = Arc::new(FnTransform::new(|source: &Path| {
            Ok(source.file_stem().unwrap().to_str().unwrap().to_string())
        }));
        let dataset = ModelNetDataset::from_config(
            &config,
            transform,
            Arc::new(BincodeSerializer),
            identity_labels(),
        )
        .unwrap();

        assert_eq!(dataset.len(), 1);
        let (artifact, label) = dataset.get(0).unwrap();
        assert_eq!(artifact, Cached::Many(vec!["chair_0001".to_string(); 2]));
        assert_eq!(label, "chair");
        // Slot files carry the configured prefix.
        assert!(temp.path().join("chair/train/cfg_chair_0001_0.slot").exists());
        assert!(temp.path().join("chair/train/cfg_chair_0001_1.slot").exists());
    }

    #[test]
    fn test_from_config_rejects_invalid_cache_settings() {
        let temp = TempDir::new().unwrap();
        plant(temp.path(), "chair/train/chair_0001.obj");

        let mut config = PipelineConfig::default();
        config.cache.repeat = 0;
        config.dataset.root = temp.path().to_path_buf();

        let transform: Arc<dyn Transform<String>> = Arc::new(FnTransform::new(|source: &Path| {
            Ok(source.display().to_string())
        }));
        let err = ModelNetDataset::from_config(
            &config,
            transform,
            Arc::new(BincodeSerializer),
            identity_labels(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[test]
    fn test_modelnet10_class_index() {
        assert_eq!(modelnet10_class_index("bathtub").unwrap(), 0);
        assert_eq!(modelnet10_class_index("toilet").unwrap(), 9);
        assert!(modelnet10_class_index("spaceship").is_err());
    }
}
