//! Vector engine for chunkvec
//!
//! This crate turns value types into persistent growable vectors on top of a
//! container store:
//! - VectorRegistry: resolves a type to a storage style and creates/loads vectors
//! - StyleCodec / StoredVector: one implementation per storage style
//! - DynVector: handle over dynamic values
//! - Vector<T>: typed handle over `Storable` Rust types
//! - Iterable: bulk iteration snapshot
//!
//! Storage styles, in resolution order:
//! - elemental: one native scalar per element
//! - array-like: one fixed-shape slice per element
//! - composite: one child vector per field
//! - text-serialized (opt-in JSON) and byte-serialized: the fallback

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod codec;
pub mod composite;
pub mod conversion;
pub mod elemental;
pub mod iter;
pub mod metadata;
pub mod packed;
pub mod registry;
pub mod serialized;
pub mod typed;
pub mod vector;

pub use array::{ArrayCodec, ArrayVector};
pub use codec::{check_index, StoredVector, StyleCodec, VectorContext};
pub use composite::{CompositeCodec, CompositeVector};
pub use conversion::{
    conversion_key, BoolConversion, CharConversion, EnumConversion, FnConversion,
    NativeConversion,
};
pub use elemental::{ElementalCodec, ElementalVector};
pub use iter::{iterable, BulkSource, Iterable};
pub use metadata::{MetadataRecord, DATA_NODE, METADATA_FORMAT_VERSION, METADATA_GROUP};
pub use registry::{standard_registry, StyleOverride, VectorRegistry};
pub use serialized::{SerializedCodec, SerializedVector, BYTES_CHILD, STOPS_CHILD};
pub use typed::{Json, RecordBuilder, RecordReader, Serialized, Storable, Vector};
pub use vector::DynVector;

use chunkvec_core::{Result, TypeDesc, Value, VectorOptions};
use chunkvec_storage::Group;

/// Create an empty vector `name` under `parent` with the standard registry
pub fn create(
    parent: &Group,
    name: &str,
    desc: &TypeDesc,
    options: &VectorOptions,
) -> Result<DynVector> {
    standard_registry().create(parent, name, desc, options)
}

/// Reopen the vector at `group`, type read from its metadata
pub fn load(group: &Group) -> Result<DynVector> {
    standard_registry().load(group)
}

/// Reopen the vector at `group` as type `desc`
pub fn load_as(group: &Group, desc: &TypeDesc) -> Result<DynVector> {
    standard_registry().load_as(group, desc)
}

/// Create a vector `name` under `parent` holding every value of `values`
pub fn copy_into(
    parent: &Group,
    name: &str,
    desc: &TypeDesc,
    values: Vec<Value>,
    options: &VectorOptions,
) -> Result<DynVector> {
    standard_registry().copy_into(parent, name, desc, values, options)
}
