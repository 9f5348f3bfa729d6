//! MemoryStore: in-memory container store
//!
//! This module implements [`ContainerStore`] using:
//! - `BTreeMap<String, Node>` keyed by normalized absolute path, so the
//!   children of a group are a contiguous key range
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Chunked growth**: extending a dataset reserves capacity in whole
//!   chunks, so a sequence of single-slice extends is amortized O(1)
//! - **Image export**: the whole tree can be exported as a [`StoreImage`]
//!   and restored from one; `FileStore` persists images

use std::collections::BTreeMap;
use std::ops::Range;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chunkvec_core::{DType, StorageError};

use crate::column::Column;
use crate::store::{normalize, parent, ContainerStore, DatasetInfo, DatasetSpec, StoreResult};

/// A stored dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DatasetNode {
    dtype: DType,
    shape: Vec<usize>,
    max_extent: Option<usize>,
    chunk: usize,
    data: Column,
}

impl DatasetNode {
    fn info(&self) -> DatasetInfo {
        DatasetInfo {
            dtype: self.dtype.clone(),
            shape: self.shape.clone(),
            max_extent: self.max_extent,
            chunk: self.chunk,
        }
    }

    fn stride(&self) -> usize {
        self.shape[..self.shape.len() - 1].iter().product()
    }

    fn extent(&self) -> usize {
        self.shape[self.shape.len() - 1]
    }
}

/// A node of the container tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Node {
    Group,
    Dataset(DatasetNode),
}

/// Serializable snapshot of a whole container tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreImage {
    nodes: BTreeMap<String, Node>,
}

impl StoreImage {
    /// Number of datasets in the image
    pub fn dataset_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n, Node::Dataset(_)))
            .count()
    }
}

/// In-memory container store
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from an image
    pub fn from_image(image: StoreImage) -> Self {
        MemoryStore {
            nodes: RwLock::new(image.nodes),
        }
    }

    /// Export the whole tree
    pub fn image(&self) -> StoreImage {
        StoreImage {
            nodes: self.nodes.read().clone(),
        }
    }

    /// Check that the parent of `path` exists and is a group
    fn check_parent(nodes: &BTreeMap<String, Node>, path: &str) -> StoreResult<()> {
        match parent(path) {
            None => Err(StorageError::AlreadyExists(path.to_string())),
            Some("/") => Ok(()),
            Some(p) => match nodes.get(p) {
                Some(Node::Group) => Ok(()),
                Some(Node::Dataset(_)) => Err(StorageError::NotAGroup(p.to_string())),
                None => Err(StorageError::NotFound(p.to_string())),
            },
        }
    }

    fn with_dataset<T>(
        &self,
        path: &str,
        f: impl FnOnce(&DatasetNode) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let path = normalize(path)?;
        let nodes = self.nodes.read();
        match nodes.get(&path) {
            Some(Node::Dataset(ds)) => f(ds),
            Some(Node::Group) => Err(StorageError::NotADataset(path)),
            None => Err(StorageError::NotFound(path)),
        }
    }

    fn with_dataset_mut<T>(
        &self,
        path: &str,
        f: impl FnOnce(&str, &mut DatasetNode) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let path = normalize(path)?;
        let mut nodes = self.nodes.write();
        match nodes.get_mut(&path) {
            Some(Node::Dataset(ds)) => f(&path, ds),
            Some(Node::Group) => Err(StorageError::NotADataset(path)),
            None => Err(StorageError::NotFound(path)),
        }
    }
}

impl ContainerStore for MemoryStore {
    fn create_group(&self, path: &str) -> StoreResult<()> {
        let path = normalize(path)?;
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&path) {
            return Err(StorageError::AlreadyExists(path));
        }
        Self::check_parent(&nodes, &path)?;
        debug!(target: "chunkvec::store", path = %path, "Group created");
        nodes.insert(path, Node::Group);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        match normalize(path) {
            Ok(p) => p == "/" || self.nodes.read().contains_key(&p),
            Err(_) => false,
        }
    }

    fn is_group(&self, path: &str) -> bool {
        match normalize(path) {
            Ok(p) => p == "/" || matches!(self.nodes.read().get(&p), Some(Node::Group)),
            Err(_) => false,
        }
    }

    fn children(&self, path: &str) -> StoreResult<Vec<String>> {
        let path = normalize(path)?;
        let nodes = self.nodes.read();
        if path != "/" {
            match nodes.get(&path) {
                Some(Node::Group) => {}
                Some(Node::Dataset(_)) => return Err(StorageError::NotAGroup(path)),
                None => return Err(StorageError::NotFound(path)),
            }
        }
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };
        Ok(nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| &k[prefix.len()..])
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    fn remove(&self, path: &str) -> StoreResult<()> {
        let path = normalize(path)?;
        if path == "/" {
            return Err(StorageError::InvalidPath(path));
        }
        let mut nodes = self.nodes.write();
        if nodes.remove(&path).is_none() {
            return Err(StorageError::NotFound(path));
        }
        let prefix = format!("{}/", path);
        let below: Vec<String> = nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &below {
            nodes.remove(key);
        }
        debug!(target: "chunkvec::store", path = %path, below = below.len(), "Node removed");
        Ok(())
    }

    fn create_dataset(&self, path: &str, spec: DatasetSpec) -> StoreResult<()> {
        let path = normalize(path)?;
        if spec.shape.is_empty() {
            return Err(StorageError::ShapeMismatch {
                path,
                reason: "dataset shape must have at least one dimension".to_string(),
            });
        }
        let extent = spec.shape[spec.shape.len() - 1];
        if let Some(max) = spec.max_extent {
            if extent > max {
                return Err(StorageError::NotExtendable {
                    path,
                    requested: extent,
                    max,
                });
            }
        }
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&path) {
            return Err(StorageError::AlreadyExists(path));
        }
        Self::check_parent(&nodes, &path)?;

        let mut data = Column::empty(&spec.dtype);
        data.resize(spec.shape.iter().product());
        debug!(
            target: "chunkvec::store",
            path = %path,
            dtype = %spec.dtype,
            shape = ?spec.shape,
            chunk = spec.chunk,
            "Dataset created"
        );
        nodes.insert(
            path,
            Node::Dataset(DatasetNode {
                dtype: spec.dtype,
                shape: spec.shape,
                max_extent: spec.max_extent,
                chunk: spec.chunk.max(1),
                data,
            }),
        );
        Ok(())
    }

    fn dataset_info(&self, path: &str) -> StoreResult<DatasetInfo> {
        self.with_dataset(path, |ds| Ok(ds.info()))
    }

    fn extend(&self, path: &str, new_extent: usize) -> StoreResult<()> {
        self.with_dataset_mut(path, |path, ds| {
            let current = ds.extent();
            if new_extent < current {
                return Err(StorageError::ShapeMismatch {
                    path: path.to_string(),
                    reason: format!("cannot shrink extent {} to {}", current, new_extent),
                });
            }
            if let Some(max) = ds.max_extent {
                if new_extent > max {
                    return Err(StorageError::NotExtendable {
                        path: path.to_string(),
                        requested: new_extent,
                        max,
                    });
                }
            }
            let stride = ds.stride();
            let needed = new_extent * stride;
            let have = ds.data.len();
            if needed > have {
                // Round the reservation up to whole chunks.
                let chunk_elems = (ds.chunk * stride).max(1);
                let chunks = (needed + chunk_elems - 1) / chunk_elems;
                ds.data.reserve(chunks * chunk_elems - have);
                ds.data.resize(needed);
            }
            let last = ds.shape.len() - 1;
            ds.shape[last] = new_extent;
            Ok(())
        })
    }

    fn write_range(&self, path: &str, start: usize, data: &Column) -> StoreResult<()> {
        self.with_dataset_mut(path, |path, ds| {
            if data.dtype() != ds.dtype {
                return Err(StorageError::DTypeMismatch {
                    path: path.to_string(),
                    expected: ds.dtype.to_string(),
                    actual: data.dtype().to_string(),
                });
            }
            let stride = ds.stride();
            if stride == 0 || data.len() % stride != 0 {
                return Err(StorageError::ShapeMismatch {
                    path: path.to_string(),
                    reason: format!(
                        "{} elements is not a whole number of slices of {}",
                        data.len(),
                        stride
                    ),
                });
            }
            let end = start + data.len() / stride;
            if end > ds.extent() {
                return Err(StorageError::OutOfRange {
                    path: path.to_string(),
                    start,
                    end,
                    extent: ds.extent(),
                });
            }
            if !ds.data.overwrite(start * stride, data) {
                return Err(StorageError::ShapeMismatch {
                    path: path.to_string(),
                    reason: "write does not fit the dataset".to_string(),
                });
            }
            Ok(())
        })
    }

    fn read_range(&self, path: &str, range: Range<usize>) -> StoreResult<Column> {
        let full = normalize(path)?;
        self.with_dataset(path, |ds| {
            if range.start > range.end || range.end > ds.extent() {
                return Err(StorageError::OutOfRange {
                    path: full,
                    start: range.start,
                    end: range.end,
                    extent: ds.extent(),
                });
            }
            let stride = ds.stride();
            Ok(ds.data.slice(range.start * stride..range.end * stride))
        })
    }
}
