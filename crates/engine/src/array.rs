//! Array-like vectors
//!
//! Values that are fixed-shape arrays of an elemental type are stored as one
//! full-rank slice per element, stacked along the trailing dimension of a
//! `(d1, ..., dK, n)` dataset at `<vector>/data`.
//!
//! The per-element shape comes from the type (fixed arrays, homogeneous
//! tuples) or from `fixed_dims` (variable-shape arrays). When both exist
//! they must agree.

use tracing::trace;

use chunkvec_core::{DType, Error, Result, StorageStyle, TypeDesc, Value, VectorOptions};
use chunkvec_storage::{Column, Dataset, DatasetSpec};

use crate::codec::{check_index, StoredVector, StyleCodec, VectorContext};
use crate::conversion::ScalarCodec;
use crate::metadata::DATA_NODE;
use crate::registry::VectorRegistry;

/// Per-element dimensions of an array-like type
///
/// `Ok(None)` if the type is not array-like or its shape is unknown.
/// A declared shape that disagrees with `fixed_dims` is an error.
pub(crate) fn array_dims(desc: &TypeDesc, options: &VectorOptions) -> Result<Option<Vec<usize>>> {
    let declared = match desc.array_parts() {
        Some((_, declared)) => declared,
        None => return Ok(None),
    };
    let dims = match (declared, &options.fixed_dims) {
        (Some(shape), Some(fixed)) if shape != *fixed => {
            return Err(Error::DimensionMismatch {
                expected: fixed.clone(),
                actual: shape,
            })
        }
        (Some(shape), _) => shape,
        (None, Some(fixed)) => fixed.clone(),
        (None, None) => return Ok(None),
    };
    if dims.is_empty() || dims.iter().any(|&d| d == 0) {
        return Ok(None);
    }
    Ok(Some(dims))
}

/// Options for resolving the element type of an array
///
/// `fixed_dims` describes the outer array, never its elements.
pub(crate) fn element_options(options: &VectorOptions) -> VectorOptions {
    VectorOptions {
        fixed_dims: None,
        ..options.clone()
    }
}

/// Codec for [`StorageStyle::ArrayLike`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayCodec;

impl StyleCodec for ArrayCodec {
    fn id(&self) -> &str {
        "array"
    }

    fn resolve(
        &self,
        desc: &TypeDesc,
        options: &VectorOptions,
        registry: &VectorRegistry,
    ) -> Result<Option<StorageStyle>> {
        let dims = match array_dims(desc, options)? {
            Some(dims) => dims,
            None => return Ok(None),
        };
        let elem = match desc.array_parts() {
            Some((elem, _)) => elem,
            None => return Ok(None),
        };
        match registry.resolve(elem, &element_options(options)) {
            Ok(StorageStyle::Elemental(dtype)) => Ok(Some(StorageStyle::ArrayLike { dtype, dims })),
            Ok(_) | Err(Error::Resolution { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn handles(&self, style: &StorageStyle) -> bool {
        matches!(style, StorageStyle::ArrayLike { .. })
    }

    fn create(
        &self,
        ctx: &VectorContext<'_>,
        style: &StorageStyle,
    ) -> Result<Box<dyn StoredVector>> {
        let (dtype, dims) = style_parts(style)?;
        let spec = DatasetSpec::extendable(dtype.clone(), dims, ctx.options().chunk_size);
        let data = ctx.group().create_dataset(DATA_NODE, spec)?;
        Ok(Box::new(ArrayVector::new(ctx, data, dtype, dims, 0)?))
    }

    fn load(&self, ctx: &VectorContext<'_>, style: &StorageStyle) -> Result<Box<dyn StoredVector>> {
        let (dtype, dims) = style_parts(style)?;
        let data = ctx.group().dataset(DATA_NODE)?;
        let info = data.info()?;
        if info.dtype != *dtype || info.slice_dims() != dims {
            return Err(Error::Metadata(format!(
                "{} holds {} with shape {:?}, expected {} slices of {:?}",
                data.path(),
                info.dtype,
                info.shape,
                dtype,
                dims
            )));
        }
        let len = info.extent();
        Ok(Box::new(ArrayVector::new(ctx, data, dtype, dims, len)?))
    }
}

fn style_parts(style: &StorageStyle) -> Result<(&DType, &[usize])> {
    match style {
        StorageStyle::ArrayLike { dtype, dims } => Ok((dtype, dims.as_slice())),
        other => Err(Error::Metadata(format!(
            "array codec cannot build a {} vector",
            other
        ))),
    }
}

/// Growable stack of fixed-shape slices
#[derive(Debug)]
pub struct ArrayVector {
    data: Dataset,
    dtype: DType,
    dims: Vec<usize>,
    stride: usize,
    /// Homogeneous tuples come back as tuples, everything else as arrays
    as_tuple: bool,
    len: usize,
    codec: ScalarCodec,
}

impl ArrayVector {
    fn new(
        ctx: &VectorContext<'_>,
        data: Dataset,
        dtype: &DType,
        dims: &[usize],
        len: usize,
    ) -> Result<Self> {
        let desc = ctx.descriptor();
        let elem = desc
            .array_parts()
            .map(|(elem, _)| elem)
            .ok_or_else(|| Error::type_mismatch("array-like type", desc.type_name()))?;
        Ok(ArrayVector {
            data,
            dtype: dtype.clone(),
            dims: dims.to_vec(),
            stride: dims.iter().product(),
            as_tuple: matches!(desc, TypeDesc::Tuple { .. }),
            len,
            codec: ScalarCodec::build(elem, dtype, ctx.registry())?,
        })
    }

    /// Flatten values into one column of native scalars
    fn flatten(&self, values: Vec<Value>) -> Result<Column> {
        let mut column = Column::with_capacity(&self.dtype, values.len() * self.stride);
        for value in values {
            let items = match value {
                Value::Tuple(items) if self.as_tuple => items,
                Value::Array { shape, items } => {
                    if shape != self.dims {
                        return Err(Error::DimensionMismatch {
                            expected: self.dims.clone(),
                            actual: shape,
                        });
                    }
                    items
                }
                other => return Err(Error::type_mismatch("array", other.kind_name())),
            };
            if items.len() != self.stride {
                return Err(Error::DimensionMismatch {
                    expected: self.dims.clone(),
                    actual: vec![items.len()],
                });
            }
            for item in items {
                let native = self.codec.encode(item)?;
                let kind = native.kind_name();
                if !column.push_value(native) {
                    return Err(Error::type_mismatch(self.dtype.name(), kind));
                }
            }
        }
        Ok(column)
    }

    /// Rebuild one element from its slice
    fn rebuild(&self, slice: Vec<Value>) -> Result<Value> {
        let items = slice
            .into_iter()
            .map(|v| self.codec.decode(v))
            .collect::<Result<Vec<_>>>()?;
        if self.as_tuple {
            Ok(Value::Tuple(items))
        } else {
            Ok(Value::Array {
                shape: self.dims.clone(),
                items,
            })
        }
    }

    fn append(&mut self, column: Column) -> Result<()> {
        let n = column.len() / self.stride;
        if n == 0 {
            return Ok(());
        }
        self.data.extend(self.len + n)?;
        self.data.write_range(self.len, &column)?;
        self.len += n;
        trace!(target: "chunkvec::vector", path = self.data.path(), len = self.len, "Appended");
        Ok(())
    }
}

impl StoredVector for ArrayVector {
    fn len(&self) -> usize {
        self.len
    }

    fn push(&mut self, value: Value) -> Result<()> {
        let column = self.flatten(vec![value])?;
        self.append(column)
    }

    fn push_many(&mut self, values: Vec<Value>) -> Result<()> {
        let column = self.flatten(values)?;
        self.append(column)
    }

    fn get(&self, index: usize) -> Result<Value> {
        check_index(index, self.len)?;
        let slice = self.data.read_range(index..index + 1)?.into_values();
        self.rebuild(slice)
    }

    fn set(&mut self, index: usize, value: Value) -> Result<()> {
        check_index(index, self.len)?;
        let column = self.flatten(vec![value])?;
        self.data.write_range(index, &column)?;
        Ok(())
    }

    /// One read of the whole block, then sliced in memory
    fn collect(&self) -> Result<Vec<Value>> {
        let mut values = self.data.read_range(0..self.len)?.into_values().into_iter();
        let mut out = Vec::with_capacity(self.len);
        for _ in 0..self.len {
            let slice: Vec<Value> = values.by_ref().take(self.stride).collect();
            out.push(self.rebuild(slice)?);
        }
        Ok(out)
    }
}
