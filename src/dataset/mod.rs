// src/dataset/mod.rs

//! Dataset enumeration and iteration over mesh corpora.
//!
//! [`ModelNetDataset`] serves (artifact, label) pairs; [`layout`] owns the
//! `<label>/<split>/<item>` tree rules and the legacy OFF-to-OBJ conversion
//! used when materializing a corpus.

pub mod layout;
mod modelnet;

pub use modelnet::{
    modelnet10_class_index, LabelMap, ModelNetDataset, MODELNET10_CLASSES,
};
