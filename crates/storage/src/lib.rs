//! Container store layer for chunkvec
//!
//! This crate implements the hierarchical typed-array container that vectors
//! are built on:
//! - ContainerStore: the store contract (groups, growable chunked datasets)
//! - Column: typed element buffers moved in and out of datasets
//! - MemoryStore: BTreeMap-based store with RwLock
//! - FileStore: single-file persistent store (atomic write-fsync-rename)
//! - Group / Dataset: path-bound handles over a shared store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod column;
pub mod file;
pub mod group;
pub mod memory;
pub mod store;

pub use chunkvec_core::StorageError;
pub use column::Column;
pub use file::{FileStore, FILE_FORMAT_VERSION, FILE_MAGIC};
pub use group::{Dataset, Group};
pub use memory::{MemoryStore, StoreImage};
pub use store::{ContainerStore, DatasetInfo, DatasetSpec, StoreResult};
