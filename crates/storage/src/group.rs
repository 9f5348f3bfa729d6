//! Group and dataset handles
//!
//! [`Group`] and [`Dataset`] bind a shared store to a path, so the vector
//! layer can navigate `parent/name/data/...` without string plumbing.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use chunkvec_core::StorageError;

use crate::column::Column;
use crate::store::{basename, join, normalize, ContainerStore, DatasetInfo, DatasetSpec, StoreResult};

/// Handle to a group in a container store
#[derive(Clone)]
pub struct Group {
    store: Arc<dyn ContainerStore>,
    path: String,
}

impl Group {
    /// The root group of a store
    pub fn root(store: Arc<dyn ContainerStore>) -> Self {
        Group {
            store,
            path: "/".to_string(),
        }
    }

    /// Open an existing group
    pub fn open(store: Arc<dyn ContainerStore>, path: &str) -> StoreResult<Self> {
        let path = normalize(path)?;
        if !store.exists(&path) {
            return Err(StorageError::NotFound(path));
        }
        if !store.is_group(&path) {
            return Err(StorageError::NotAGroup(path));
        }
        Ok(Group { store, path })
    }

    /// Absolute path of the group
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment (empty for the root)
    pub fn name(&self) -> &str {
        basename(&self.path)
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn ContainerStore> {
        &self.store
    }

    /// True if a child named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        join(&self.path, name)
            .map(|p| self.store.exists(&p))
            .unwrap_or(false)
    }

    /// Names of the direct children, sorted
    pub fn children(&self) -> StoreResult<Vec<String>> {
        self.store.children(&self.path)
    }

    /// Create a child group
    pub fn create_group(&self, name: &str) -> StoreResult<Group> {
        let path = join(&self.path, name)?;
        self.store.create_group(&path)?;
        Ok(Group {
            store: Arc::clone(&self.store),
            path,
        })
    }

    /// Remove a child group or dataset with everything below it
    pub fn remove(&self, name: &str) -> StoreResult<()> {
        self.store.remove(&join(&self.path, name)?)
    }

    /// Open an existing child group
    pub fn group(&self, name: &str) -> StoreResult<Group> {
        Group::open(Arc::clone(&self.store), &join(&self.path, name)?)
    }

    /// Create a child dataset
    pub fn create_dataset(&self, name: &str, spec: DatasetSpec) -> StoreResult<Dataset> {
        let path = join(&self.path, name)?;
        self.store.create_dataset(&path, spec)?;
        Ok(Dataset {
            store: Arc::clone(&self.store),
            path,
        })
    }

    /// Open an existing child dataset
    pub fn dataset(&self, name: &str) -> StoreResult<Dataset> {
        let path = join(&self.path, name)?;
        self.store.dataset_info(&path)?;
        Ok(Dataset {
            store: Arc::clone(&self.store),
            path,
        })
    }

    /// Create a small fixed child dataset holding `data`
    pub fn write_whole(&self, name: &str, data: Column, shape: Vec<usize>) -> StoreResult<()> {
        self.store.write_whole(&join(&self.path, name)?, data, shape)
    }

    /// Read a whole child dataset
    pub fn read_whole(&self, name: &str) -> StoreResult<Column> {
        self.store.read_all(&join(&self.path, name)?)
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group").field("path", &self.path).finish()
    }
}

/// Handle to a dataset in a container store
#[derive(Clone)]
pub struct Dataset {
    store: Arc<dyn ContainerStore>,
    path: String,
}

impl Dataset {
    /// Absolute path of the dataset
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Describe the dataset
    pub fn info(&self) -> StoreResult<DatasetInfo> {
        self.store.dataset_info(&self.path)
    }

    /// Grow the trailing extent
    pub fn extend(&self, new_extent: usize) -> StoreResult<()> {
        self.store.extend(&self.path, new_extent)
    }

    /// Write whole slices starting at trailing index `start`
    pub fn write_range(&self, start: usize, data: &Column) -> StoreResult<()> {
        self.store.write_range(&self.path, start, data)
    }

    /// Read whole slices in `range`
    pub fn read_range(&self, range: Range<usize>) -> StoreResult<Column> {
        self.store.read_range(&self.path, range)
    }

    /// Read the whole dataset
    pub fn read_all(&self) -> StoreResult<Column> {
        self.store.read_all(&self.path)
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset").field("path", &self.path).finish()
    }
}
