//! Container store contract
//!
//! The container store is a hierarchical namespace of *groups* and
//! *datasets*. A dataset is a typed, chunked, multi-dimensional array whose
//! trailing dimension can grow. Vectors are built entirely on this trait; any
//! backend that implements it (in-memory, single-file, or a binding to an
//! external array library) can host them.
//!
//! Paths are absolute and `/`-separated (`/run/positions/data`). The root
//! group `/` always exists.

use crate::column::Column;
use chunkvec_core::{DType, StorageError};
use std::fmt::Debug;
use std::ops::Range;

/// Result type alias for container store operations
pub type StoreResult<T> = std::result::Result<T, StorageError>;

/// Creation parameters of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Element type
    pub dtype: DType,
    /// Initial shape; the last entry is the trailing (growable) extent
    pub shape: Vec<usize>,
    /// Maximum trailing extent, `None` for unbounded
    pub max_extent: Option<usize>,
    /// Chunk size hint along the trailing dimension
    pub chunk: usize,
}

impl DatasetSpec {
    /// Growable dataset of per-slice shape `dims`, initially empty, unbounded
    pub fn extendable(dtype: DType, dims: &[usize], chunk: usize) -> Self {
        let mut shape = dims.to_vec();
        shape.push(0);
        DatasetSpec {
            dtype,
            shape,
            max_extent: None,
            chunk,
        }
    }

    /// Fixed-size dataset
    pub fn fixed(dtype: DType, shape: Vec<usize>) -> Self {
        let extent = shape.last().copied().unwrap_or(1);
        DatasetSpec {
            dtype,
            shape,
            max_extent: Some(extent),
            chunk: extent.max(1),
        }
    }
}

/// Current description of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    /// Element type
    pub dtype: DType,
    /// Current shape; the last entry is the trailing extent
    pub shape: Vec<usize>,
    /// Maximum trailing extent, `None` for unbounded
    pub max_extent: Option<usize>,
    /// Chunk size hint
    pub chunk: usize,
}

impl DatasetInfo {
    /// Current trailing extent
    pub fn extent(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    /// Leading (per-slice) dimensions
    pub fn slice_dims(&self) -> &[usize] {
        match self.shape.split_last() {
            Some((_, leading)) => leading,
            None => &[],
        }
    }

    /// Number of elements per trailing slice
    pub fn stride(&self) -> usize {
        self.slice_dims().iter().product()
    }
}

/// A hierarchical, chunked, typed-array container
///
/// Implementations must be `Send + Sync` so a store can be shared as
/// `Arc<dyn ContainerStore>`. The vector layer assumes a single writer; stores
/// only need to keep their own structures consistent under concurrent calls.
pub trait ContainerStore: Send + Sync + Debug {
    /// Create a group; the parent must exist
    fn create_group(&self, path: &str) -> StoreResult<()>;

    /// True if a group or dataset exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// True if a group exists at `path`
    fn is_group(&self, path: &str) -> bool;

    /// Names of the direct children of a group, sorted
    fn children(&self, path: &str) -> StoreResult<Vec<String>>;

    /// Remove a group or dataset and everything below it
    fn remove(&self, path: &str) -> StoreResult<()>;

    /// Create a dataset; the parent group must exist
    fn create_dataset(&self, path: &str, spec: DatasetSpec) -> StoreResult<()>;

    /// Describe a dataset
    fn dataset_info(&self, path: &str) -> StoreResult<DatasetInfo>;

    /// Grow the trailing extent to `new_extent`, zero-filling new slices
    fn extend(&self, path: &str, new_extent: usize) -> StoreResult<()>;

    /// Write whole slices at trailing indices `start..`
    ///
    /// `data.len()` must be a multiple of the dataset's stride and the
    /// written slices must lie within the current extent.
    fn write_range(&self, path: &str, start: usize, data: &Column) -> StoreResult<()>;

    /// Read whole slices at trailing indices `range`
    fn read_range(&self, path: &str, range: Range<usize>) -> StoreResult<Column>;

    /// Read every slice of a dataset
    fn read_all(&self, path: &str) -> StoreResult<Column> {
        let extent = self.dataset_info(path)?.extent();
        self.read_range(path, 0..extent)
    }

    /// Create a small fixed dataset holding `data` with the given shape
    fn write_whole(&self, path: &str, data: Column, shape: Vec<usize>) -> StoreResult<()> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(StorageError::ShapeMismatch {
                path: path.to_string(),
                reason: format!("shape {:?} needs {} elements, got {}", shape, expected, data.len()),
            });
        }
        let extent = shape.last().copied().unwrap_or(1);
        self.create_dataset(path, DatasetSpec::fixed(data.dtype(), shape))?;
        if extent > 0 {
            self.write_range(path, 0, &data)?;
        }
        Ok(())
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// Normalize a path to absolute `/a/b` form
pub fn normalize(path: &str) -> StoreResult<String> {
    let mut parts = Vec::new();
    for part in path.split('/').filter(|p| !p.is_empty()) {
        if part == "." || part == ".." {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        parts.push(part);
    }
    Ok(format!("/{}", parts.join("/")))
}

/// Join a parent path and a child name
///
/// The name must be non-empty and must not contain `/`.
pub fn join(parent: &str, name: &str) -> StoreResult<String> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(StorageError::InvalidPath(format!(
            "invalid name '{}' under {}",
            name, parent
        )));
    }
    let parent = normalize(parent)?;
    if parent == "/" {
        Ok(format!("/{}", name))
    } else {
        Ok(format!("{}/{}", parent, name))
    }
}

/// Parent of a normalized path (`None` for the root)
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(i) => Some(&path[..i]),
        None => None,
    }
}

/// Last segment of a normalized path (empty for the root)
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}
