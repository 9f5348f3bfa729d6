//! Error types for chunkvec
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Two layers exist:
//! - [`StorageError`]: failures of the container store itself (missing nodes,
//!   shape violations, I/O, corrupt files). These propagate unchanged.
//! - [`Error`]: the vector layer's taxonomy (resolution, dimension mismatch,
//!   unsupported operation, ...), wrapping [`StorageError`] as one variant.

use std::io;
use thiserror::Error;

/// Result type alias for chunkvec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the vector layer
#[derive(Debug, Error)]
pub enum Error {
    /// The value type cannot be mapped to any storage style
    #[error("Cannot resolve a storage style for {type_name}: {reason}")]
    Resolution {
        /// Name of the type being resolved
        type_name: String,
        /// Why resolution failed
        reason: String,
    },

    /// Fixed dimensions disagree with the type's own shape or a pushed value's shape
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Dimensions the vector was created with
        expected: Vec<usize>,
        /// Dimensions that were supplied
        actual: Vec<usize>,
    },

    /// Operation is not supported by this storage style
    #[error("Unsupported operation: {operation} on {style} vector")]
    UnsupportedOperation {
        /// Operation name
        operation: &'static str,
        /// Storage style tag of the vector
        style: String,
    },

    /// Positional access past the end of the vector
    #[error("Index {index} out of bounds for vector of length {len}")]
    IndexOutOfBounds {
        /// Requested 0-based index
        index: usize,
        /// Current length
        len: usize,
    },

    /// A value or descriptor does not match the expected type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type or value kind
        actual: String,
    },

    /// Missing or inconsistent metadata record
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid vector options
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Container store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Storage(StorageError::Io(e))
    }
}

impl Error {
    /// Shorthand for a [`Error::TypeMismatch`]
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Shorthand for a [`Error::Resolution`]
    pub fn resolution(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Resolution {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by a container store
#[derive(Debug, Error)]
pub enum StorageError {
    /// No group or dataset at the path
    #[error("Not found: {0}")]
    NotFound(String),

    /// A node already exists at the path
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The node at the path is a group, not a dataset
    #[error("Not a dataset: {0}")]
    NotADataset(String),

    /// The node at the path is a dataset, not a group
    #[error("Not a group: {0}")]
    NotAGroup(String),

    /// Written data has a different element type than the dataset
    #[error("DType mismatch at {path}: dataset is {expected}, data is {actual}")]
    DTypeMismatch {
        /// Dataset path
        path: String,
        /// Dataset element type
        expected: String,
        /// Supplied element type
        actual: String,
    },

    /// Written data does not fill a whole number of slices
    #[error("Shape mismatch at {path}: {reason}")]
    ShapeMismatch {
        /// Dataset path
        path: String,
        /// Details
        reason: String,
    },

    /// Read or write past the dataset's current extent
    #[error("Range {start}..{end} out of bounds for extent {extent} at {path}")]
    OutOfRange {
        /// Dataset path
        path: String,
        /// Range start
        start: usize,
        /// Range end
        end: usize,
        /// Current trailing extent
        extent: usize,
    },

    /// Extension beyond the dataset's maximum shape
    #[error("Dataset {path} cannot grow to {requested} (max {max})")]
    NotExtendable {
        /// Dataset path
        path: String,
        /// Requested extent
        requested: usize,
        /// Maximum extent
        max: usize,
    },

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Persisted container is damaged
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Container image encoding failure
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
