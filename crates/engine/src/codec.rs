//! Style codec and stored vector traits
//!
//! Every storage style is one [`StyleCodec`]: it decides whether it can
//! represent a type (`resolve`), allocates fresh container structure
//! (`create`) or reattaches to existing structure (`load`). Both return a
//! [`StoredVector`], the style-specific implementation of the positional and
//! bulk operations.
//!
//! Built-in codecs and user plugins implement the same traits and live in
//! the same [`VectorRegistry`](crate::registry::VectorRegistry).

use chunkvec_core::{Error, Result, StorageStyle, TypeDesc, Value, VectorOptions};
use chunkvec_storage::Group;

use crate::registry::VectorRegistry;

/// Everything a codec needs to create or load one vector
pub struct VectorContext<'a> {
    registry: &'a VectorRegistry,
    group: &'a Group,
    desc: &'a TypeDesc,
    options: &'a VectorOptions,
}

impl<'a> VectorContext<'a> {
    /// Bundle the inputs of a create/load call
    pub fn new(
        registry: &'a VectorRegistry,
        group: &'a Group,
        desc: &'a TypeDesc,
        options: &'a VectorOptions,
    ) -> Self {
        VectorContext {
            registry,
            group,
            desc,
            options,
        }
    }

    /// Registry used for recursive resolution
    pub fn registry(&self) -> &'a VectorRegistry {
        self.registry
    }

    /// The vector's own group (`parent/name`)
    pub fn group(&self) -> &'a Group {
        self.group
    }

    /// Value type of the vector
    pub fn descriptor(&self) -> &'a TypeDesc {
        self.desc
    }

    /// Options the vector was created with
    pub fn options(&self) -> &'a VectorOptions {
        self.options
    }
}

/// A storage style: resolution plus construction of stored vectors
pub trait StyleCodec: Send + Sync {
    /// Unique codec identifier
    fn id(&self) -> &str;

    /// Style this codec would use for `desc`, or `None` to pass
    ///
    /// Must be deterministic: the same registry, descriptor and options
    /// always produce the same answer.
    fn resolve(
        &self,
        desc: &TypeDesc,
        options: &VectorOptions,
        registry: &VectorRegistry,
    ) -> Result<Option<StorageStyle>>;

    /// True if this codec builds vectors of `style`
    fn handles(&self, style: &StorageStyle) -> bool;

    /// Allocate fresh structure under `ctx.group()`
    fn create(&self, ctx: &VectorContext<'_>, style: &StorageStyle)
        -> Result<Box<dyn StoredVector>>;

    /// Reattach to structure previously created under `ctx.group()`
    fn load(&self, ctx: &VectorContext<'_>, style: &StorageStyle) -> Result<Box<dyn StoredVector>>;
}

/// Style-specific implementation of a vector's operations
///
/// Indices are 0-based. Values handed to `push`/`set` have already been
/// checked against the vector's descriptor.
pub trait StoredVector: Send + Sync {
    /// Number of elements
    fn len(&self) -> usize;

    /// Append one value
    fn push(&mut self, value: Value) -> Result<()>;

    /// Append many values
    fn push_many(&mut self, values: Vec<Value>) -> Result<()> {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    /// Read the value at `index`
    fn get(&self, index: usize) -> Result<Value>;

    /// Overwrite the value at `index`
    fn set(&mut self, index: usize, value: Value) -> Result<()>;

    /// Read every value with a bounded number of container reads
    fn collect(&self) -> Result<Vec<Value>>;
}

/// Reject `index >= len`
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        Err(Error::IndexOutOfBounds { index, len })
    } else {
        Ok(())
    }
}
