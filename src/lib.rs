//! chunkvec - growable, self-describing typed vectors in a chunked container
//!
//! A vector is created under a group of a hierarchical container store. Its
//! value type is mapped to a storage style (elemental, array-like,
//! composite, byte- or text-serialized) and recorded next to the data, so
//! the vector can be reopened later without knowing its type.
//!
//! # Quick Start
//!
//! ```ignore
//! use chunkvec::{FileStore, Group, Vector, VectorOptions};
//! use std::sync::Arc;
//!
//! let store = Arc::new(FileStore::create("readings.cvec")?);
//! let root = Group::root(store.clone());
//!
//! let mut v: Vector<(f64, f64, f64)> = Vector::create(&root, "xyz")?;
//! v.push((1.0, 2.0, 3.0))?;
//! store.flush()?;
//!
//! let again: Vector<(f64, f64, f64)> = Vector::load(&root.group("xyz")?)?;
//! assert_eq!(again.collect()?, vec![(1.0, 2.0, 3.0)]);
//! ```
//!
//! # Architecture
//!
//! - `chunkvec-core`: type descriptors, values, styles, options, errors
//! - `chunkvec-storage`: the container store contract and its implementations
//! - `chunkvec-engine`: style resolution, vector codecs and handles

pub use chunkvec_core::{
    CompoundMember, CompoundType, DType, Error, Field, Result, SerialFormat, StorageError,
    StorageStyle, TypeDesc, Value, VectorOptions, DEFAULT_CHUNK_SIZE,
};
pub use chunkvec_engine::{
    check_index, copy_into, create, iterable, load, load_as, standard_registry, BulkSource,
    DynVector, FnConversion, Iterable, Json, MetadataRecord, NativeConversion, RecordBuilder,
    RecordReader, Serialized, Storable, StoredVector, StyleCodec, StyleOverride, Vector,
    VectorContext, VectorRegistry,
};
pub use chunkvec_storage::{
    Column, ContainerStore, Dataset, DatasetInfo, DatasetSpec, FileStore, Group, MemoryStore,
};
