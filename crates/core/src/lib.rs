//! Core types for chunkvec
//!
//! This crate defines the foundational types used throughout the system:
//! - DType: native element types of the container store
//! - TypeDesc: serializable value type descriptors
//! - Value: dynamic value model
//! - StorageStyle: on-disk representation families
//! - VectorOptions: creation options
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod options;
pub mod style;
pub mod types;
pub mod value;

pub use dtype::{CompoundMember, CompoundType, DType};
pub use error::{Error, Result, StorageError};
pub use options::{VectorOptions, DEFAULT_CHUNK_SIZE, MAX_FIXED_DIMS};
pub use style::StorageStyle;
pub use types::{Field, SerialFormat, TypeDesc};
pub use value::Value;
