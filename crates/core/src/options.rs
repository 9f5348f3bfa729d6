//! Vector creation options
//!
//! Controls layout choices made when a vector is created. `portable` and
//! `fixed_dims` are persisted in the metadata record and participate in
//! style resolution; `chunk_size` is an I/O granularity hint handed to the
//! container store.

use crate::error::{Error, Result};

/// Default chunk size (elements per chunk along the growable dimension)
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Maximum number of fixed per-element dimensions
pub const MAX_FIXED_DIMS: usize = 32;

/// Options for creating a vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorOptions {
    /// Prefer layouts readable without this crate's type metadata (default: true)
    pub portable: bool,
    /// Per-element shape for variable-shape array types
    pub fixed_dims: Option<Vec<usize>>,
    /// Chunk size hint (default: 1000)
    pub chunk_size: usize,
}

impl Default for VectorOptions {
    fn default() -> Self {
        VectorOptions {
            portable: true,
            fixed_dims: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl VectorOptions {
    /// Portable layout (default)
    pub fn portable() -> Self {
        VectorOptions::default()
    }

    /// Native layout: packed fixed-layout records are stored as compound rows
    pub fn native() -> Self {
        VectorOptions {
            portable: false,
            ..Default::default()
        }
    }

    /// Set the portability flag
    pub fn with_portable(mut self, portable: bool) -> Self {
        self.portable = portable;
        self
    }

    /// Set fixed per-element dimensions
    pub fn with_fixed_dims(mut self, dims: impl Into<Vec<usize>>) -> Self {
        self.fixed_dims = Some(dims.into());
        self
    }

    /// Set the chunk size hint
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Validate options
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".to_string()));
        }
        if let Some(dims) = &self.fixed_dims {
            if dims.is_empty() || dims.len() > MAX_FIXED_DIMS {
                return Err(Error::InvalidConfig(format!(
                    "fixed_dims must have 1..={} entries, got {}",
                    MAX_FIXED_DIMS,
                    dims.len()
                )));
            }
            if dims.iter().any(|&d| d == 0) {
                return Err(Error::InvalidConfig(format!(
                    "fixed_dims must be positive, got {:?}",
                    dims
                )));
            }
        }
        Ok(())
    }
}
