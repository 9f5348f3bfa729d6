//! Dynamic vector handle
//!
//! [`DynVector`] is what `create` and `load` hand back: the vector's group,
//! type, resolved style and options, plus the style-specific implementation.
//! Values cross this API as [`Value`]s and are checked against the type
//! before they reach storage.
//!
//! All positions are 0-based.

use std::fmt;

use tracing::trace;

use chunkvec_core::{Result, StorageStyle, TypeDesc, Value, VectorOptions};
use chunkvec_storage::Group;

use crate::codec::StoredVector;
use crate::iter::{BulkSource, Iterable};

/// Handle to a persistent growable vector of [`Value`]s
pub struct DynVector {
    group: Group,
    desc: TypeDesc,
    style: StorageStyle,
    options: VectorOptions,
    inner: Box<dyn StoredVector>,
}

impl DynVector {
    pub(crate) fn new(
        group: Group,
        desc: TypeDesc,
        style: StorageStyle,
        options: VectorOptions,
        inner: Box<dyn StoredVector>,
    ) -> Self {
        DynVector {
            group,
            desc,
            style,
            options,
            inner,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if the vector holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the vector (its group's name)
    pub fn name(&self) -> &str {
        self.group.name()
    }

    /// The vector's group
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Value type
    pub fn descriptor(&self) -> &TypeDesc {
        &self.desc
    }

    /// Resolved storage style
    pub fn style(&self) -> &StorageStyle {
        &self.style
    }

    /// Options the vector was created (or reloaded) with
    pub fn options(&self) -> &VectorOptions {
        &self.options
    }

    /// Append a value
    pub fn push(&mut self, value: Value) -> Result<()> {
        value.conforms_to(&self.desc)?;
        self.push_unchecked(value)
    }

    /// Append many values
    ///
    /// Every value is checked before anything is written.
    pub fn push_many(&mut self, values: Vec<Value>) -> Result<()> {
        for value in &values {
            value.conforms_to(&self.desc)?;
        }
        self.push_many_unchecked(values)
    }

    /// Value at 0-based `index`
    ///
    /// Each call is a separate container read; use [`collect`](Self::collect)
    /// or [`iterable`](Self::iterable) to visit every element.
    pub fn get(&self, index: usize) -> Result<Value> {
        self.inner.get(index)
    }

    /// Overwrite the value at 0-based `index`
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        value.conforms_to(&self.desc)?;
        self.set_unchecked(index, value)
    }

    /// Every value, read in bulk
    pub fn collect(&self) -> Result<Vec<Value>> {
        self.inner.collect()
    }

    /// Lazy point-in-time view of every value
    pub fn iterable(&self) -> Iterable<'_, Value> {
        crate::iter::iterable(self)
    }

    pub(crate) fn push_unchecked(&mut self, value: Value) -> Result<()> {
        self.inner.push(value)?;
        trace!(target: "chunkvec::vector", path = self.group.path(), len = self.len(), "Pushed");
        Ok(())
    }

    pub(crate) fn push_many_unchecked(&mut self, values: Vec<Value>) -> Result<()> {
        let n = values.len();
        self.inner.push_many(values)?;
        trace!(target: "chunkvec::vector", path = self.group.path(), count = n, len = self.len(), "Pushed many");
        Ok(())
    }

    pub(crate) fn set_unchecked(&mut self, index: usize, value: Value) -> Result<()> {
        self.inner.set(index, value)
    }
}

impl BulkSource for DynVector {
    type Item = Value;

    fn collect_all(&self) -> Result<Vec<Value>> {
        self.collect()
    }
}

impl fmt::Debug for DynVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynVector")
            .field("path", &self.group.path())
            .field("type", &self.desc.type_name())
            .field("style", &self.style.tag())
            .field("len", &self.len())
            .finish()
    }
}
