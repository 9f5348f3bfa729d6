//! Elemental vectors
//!
//! One native scalar per element in a 1-D extendable dataset at
//! `<vector>/data`. Covers container-native scalars, logical types with a
//! registered native conversion, and (when `portable = false`) fixed-layout
//! records stored as packed compound rows.

use std::ops::Range;

use tracing::trace;

use chunkvec_core::{DType, Error, Result, StorageStyle, TypeDesc, Value, VectorOptions};
use chunkvec_storage::{Column, Dataset, DatasetSpec, Group};

use crate::codec::{check_index, StoredVector, StyleCodec, VectorContext};
use crate::conversion::ScalarCodec;
use crate::metadata::{MetadataRecord, DATA_NODE};
use crate::packed;
use crate::registry::VectorRegistry;

/// Native element type `desc` is stored as, if it is elemental
pub(crate) fn elemental_dtype(
    desc: &TypeDesc,
    options: &VectorOptions,
    registry: &VectorRegistry,
) -> Option<DType> {
    match desc {
        TypeDesc::Native { dtype } => Some(dtype.clone()),
        TypeDesc::Bool | TypeDesc::Char | TypeDesc::Enum { .. } => {
            registry.conversion_for(desc).map(|c| c.native())
        }
        TypeDesc::Logical { native, .. } => registry
            .conversion_for(desc)
            .filter(|c| c.native() == *native)
            .map(|c| c.native()),
        TypeDesc::Record { .. } | TypeDesc::Tuple { .. } if !options.portable && desc.is_bits() => {
            packed::layout_for(desc).map(DType::Compound)
        }
        _ => None,
    }
}

/// Codec for [`StorageStyle::Elemental`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementalCodec;

impl StyleCodec for ElementalCodec {
    fn id(&self) -> &str {
        "elemental"
    }

    fn resolve(
        &self,
        desc: &TypeDesc,
        options: &VectorOptions,
        registry: &VectorRegistry,
    ) -> Result<Option<StorageStyle>> {
        Ok(elemental_dtype(desc, options, registry).map(StorageStyle::Elemental))
    }

    fn handles(&self, style: &StorageStyle) -> bool {
        matches!(style, StorageStyle::Elemental(_))
    }

    fn create(
        &self,
        ctx: &VectorContext<'_>,
        style: &StorageStyle,
    ) -> Result<Box<dyn StoredVector>> {
        let dtype = style_dtype(style)?;
        let codec = ScalarCodec::build(ctx.descriptor(), dtype, ctx.registry())?;
        let vector = ElementalVector::create(ctx.group(), dtype, ctx.options().chunk_size, codec)?;
        Ok(Box::new(vector))
    }

    fn load(&self, ctx: &VectorContext<'_>, style: &StorageStyle) -> Result<Box<dyn StoredVector>> {
        let dtype = style_dtype(style)?;
        let codec = ScalarCodec::build(ctx.descriptor(), dtype, ctx.registry())?;
        let vector = ElementalVector::load(ctx.group(), dtype, codec)?;
        Ok(Box::new(vector))
    }
}

fn style_dtype(style: &StorageStyle) -> Result<&DType> {
    match style {
        StorageStyle::Elemental(dtype) => Ok(dtype),
        other => Err(Error::Metadata(format!(
            "elemental codec cannot build a {} vector",
            other
        ))),
    }
}

/// Growable 1-D dataset of native scalars
#[derive(Debug)]
pub struct ElementalVector {
    data: Dataset,
    dtype: DType,
    len: usize,
    codec: ScalarCodec,
}

impl ElementalVector {
    fn create(group: &Group, dtype: &DType, chunk: usize, codec: ScalarCodec) -> Result<Self> {
        let spec = DatasetSpec::extendable(dtype.clone(), &[], chunk);
        let data = group.create_dataset(DATA_NODE, spec)?;
        Ok(ElementalVector {
            data,
            dtype: dtype.clone(),
            len: 0,
            codec,
        })
    }

    fn load(group: &Group, dtype: &DType, codec: ScalarCodec) -> Result<Self> {
        let data = group.dataset(DATA_NODE)?;
        let info = data.info()?;
        if info.dtype != *dtype || !info.slice_dims().is_empty() {
            return Err(Error::Metadata(format!(
                "{} holds {} with shape {:?}, expected 1-D {}",
                data.path(),
                info.dtype,
                info.shape,
                dtype
            )));
        }
        let len = info.extent();
        Ok(ElementalVector {
            data,
            dtype: info.dtype,
            len,
            codec,
        })
    }

    /// Create a raw native child vector (own group, metadata and dataset)
    ///
    /// Used by layouts that need plain native children regardless of what
    /// the registry would resolve for the native type.
    pub(crate) fn create_child(parent: &Group, name: &str, dtype: DType, chunk: usize) -> Result<Self> {
        let group = parent.create_group(name)?;
        let options = VectorOptions::default().with_chunk_size(chunk);
        let style = StorageStyle::Elemental(dtype.clone());
        MetadataRecord::new(&TypeDesc::native(dtype.clone()), &options, &style).write(&group)?;
        Self::create(&group, &dtype, chunk, ScalarCodec::Identity)
    }

    /// Reattach to a child created by [`create_child`](Self::create_child)
    pub(crate) fn load_child(parent: &Group, name: &str, dtype: DType) -> Result<Self> {
        let group = parent.group(name)?;
        let record = MetadataRecord::read(&group)?;
        if record.descriptor != TypeDesc::native(dtype.clone()) {
            return Err(Error::type_mismatch(dtype.name(), record.type_name));
        }
        Self::load(&group, &dtype, ScalarCodec::Identity)
    }

    /// Append already-native elements with one extend and one write
    pub(crate) fn append_column(&mut self, column: &Column) -> Result<()> {
        let n = column.len();
        if n == 0 {
            return Ok(());
        }
        self.data.extend(self.len + n)?;
        self.data.write_range(self.len, column)?;
        self.len += n;
        trace!(target: "chunkvec::vector", path = self.data.path(), len = self.len, "Appended");
        Ok(())
    }

    /// Raw native elements in `range`
    pub(crate) fn read_range(&self, range: Range<usize>) -> Result<Column> {
        Ok(self.data.read_range(range)?)
    }

    /// Raw native elements, all of them
    pub(crate) fn read_all(&self) -> Result<Column> {
        self.read_range(0..self.len)
    }

    fn encode(&self, values: Vec<Value>) -> Result<Column> {
        let mut column = Column::with_capacity(&self.dtype, values.len());
        for value in values {
            let native = self.codec.encode(value)?;
            let kind = native.kind_name();
            if !column.push_value(native) {
                return Err(Error::type_mismatch(self.dtype.name(), kind));
            }
        }
        Ok(column)
    }
}

impl StoredVector for ElementalVector {
    fn len(&self) -> usize {
        self.len
    }

    fn push(&mut self, value: Value) -> Result<()> {
        let column = self.encode(vec![value])?;
        self.append_column(&column)
    }

    fn push_many(&mut self, values: Vec<Value>) -> Result<()> {
        let column = self.encode(values)?;
        self.append_column(&column)
    }

    fn get(&self, index: usize) -> Result<Value> {
        check_index(index, self.len)?;
        let value = self
            .read_range(index..index + 1)?
            .into_values()
            .into_iter()
            .next()
            .ok_or(Error::IndexOutOfBounds {
                index,
                len: self.len,
            })?;
        self.codec.decode(value)
    }

    fn set(&mut self, index: usize, value: Value) -> Result<()> {
        check_index(index, self.len)?;
        let column = self.encode(vec![value])?;
        self.data.write_range(index, &column)?;
        Ok(())
    }

    fn collect(&self) -> Result<Vec<Value>> {
        self.read_all()?
            .into_values()
            .into_iter()
            .map(|v| self.codec.decode(v))
            .collect()
    }
}
