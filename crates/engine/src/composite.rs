//! Composite vectors
//!
//! A composite vector owns one child vector per field, each resolved and
//! styled independently, under `<vector>/data/<field>`:
//!
//! - records: one child per named field, in declaration order
//! - tuples: children `0`, `1`, ... per position
//! - arrays whose element is not elemental: one child per flattened
//!   position of the fixed shape
//!
//! Every operation recurses into the children. `collect` bulk-collects each
//! child once and zips the results, so it costs one bulk read per field, not
//! one read per element and field.
//!
//! # Partial pushes
//!
//! Values are checked against the type before any child is written, so a
//! malformed value never reaches storage. A container failure in the middle
//! of a push still leaves earlier children one element longer than later
//! ones; there is no rollback. A reload reports the shortest child's length.

use tracing::warn;

use chunkvec_core::{Error, Result, StorageStyle, TypeDesc, Value, VectorOptions};

use crate::array::{array_dims, element_options};
use crate::codec::{check_index, StoredVector, StyleCodec, VectorContext};
use crate::metadata::DATA_NODE;
use crate::registry::VectorRegistry;
use crate::vector::DynVector;

/// How a composite value is split into fields and put back together
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Record(Vec<String>),
    Tuple,
    Array(Vec<usize>),
}

/// Shape plus `(child name, child type, child options)` per field
type FieldLayout = (Shape, Vec<(String, TypeDesc, VectorOptions)>);

/// Field layout of `desc`, `None` if it cannot be decomposed
fn fields(desc: &TypeDesc, options: &VectorOptions) -> Result<Option<FieldLayout>> {
    let layout = match desc {
        TypeDesc::Record { fields, .. } if !fields.is_empty() => (
            Shape::Record(fields.iter().map(|f| f.name.clone()).collect()),
            fields
                .iter()
                .map(|f| (f.name.clone(), f.ty.clone(), options.clone()))
                .collect(),
        ),
        TypeDesc::Tuple { elems } if !elems.is_empty() => (
            Shape::Tuple,
            elems
                .iter()
                .enumerate()
                .map(|(i, e)| (i.to_string(), e.clone(), element_options(options)))
                .collect(),
        ),
        TypeDesc::FixedArray { elem, .. } | TypeDesc::Array { elem } => {
            let dims = match array_dims(desc, options)? {
                Some(dims) => dims,
                None => return Ok(None),
            };
            let n: usize = dims.iter().product();
            let opts = element_options(options);
            (
                Shape::Array(dims),
                (0..n)
                    .map(|i| (i.to_string(), elem.as_ref().clone(), opts.clone()))
                    .collect(),
            )
        }
        _ => return Ok(None),
    };
    Ok(Some(layout))
}

/// Codec for [`StorageStyle::Composite`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeCodec;

impl StyleCodec for CompositeCodec {
    fn id(&self) -> &str {
        "composite"
    }

    fn resolve(
        &self,
        desc: &TypeDesc,
        options: &VectorOptions,
        registry: &VectorRegistry,
    ) -> Result<Option<StorageStyle>> {
        let (_, children) = match fields(desc, options)? {
            Some(layout) => layout,
            None => return Ok(None),
        };
        // Every child must resolve, so a failing field is reported before
        // anything is created. Array positions repeat one type.
        let mut last: Option<(&TypeDesc, &VectorOptions)> = None;
        for (_, ty, opts) in &children {
            if last != Some((ty, opts)) {
                registry.resolve(ty, opts)?;
                last = Some((ty, opts));
            }
        }
        Ok(Some(StorageStyle::Composite))
    }

    fn handles(&self, style: &StorageStyle) -> bool {
        matches!(style, StorageStyle::Composite)
    }

    fn create(
        &self,
        ctx: &VectorContext<'_>,
        _style: &StorageStyle,
    ) -> Result<Box<dyn StoredVector>> {
        let (shape, layout) = layout_of(ctx)?;
        let data = ctx.group().create_group(DATA_NODE)?;
        let mut children = Vec::with_capacity(layout.len());
        for (name, ty, options) in &layout {
            children.push(ctx.registry().create(&data, name, ty, options)?);
        }
        Ok(Box::new(CompositeVector {
            shape,
            children,
            len: 0,
        }))
    }

    fn load(&self, ctx: &VectorContext<'_>, _style: &StorageStyle) -> Result<Box<dyn StoredVector>> {
        let (shape, layout) = layout_of(ctx)?;
        let data = ctx.group().group(DATA_NODE)?;
        let mut children = Vec::with_capacity(layout.len());
        for (name, ty, _) in &layout {
            children.push(ctx.registry().load_as(&data.group(name)?, ty)?);
        }

        let len = children.iter().map(DynVector::len).min().unwrap_or(0);
        if children.iter().any(|c| c.len() != len) {
            let lens: Vec<usize> = children.iter().map(DynVector::len).collect();
            warn!(
                target: "chunkvec::vector",
                path = ctx.group().path(),
                ?lens,
                "Composite children have uneven lengths"
            );
        }
        Ok(Box::new(CompositeVector {
            shape,
            children,
            len,
        }))
    }
}

fn layout_of(ctx: &VectorContext<'_>) -> Result<FieldLayout> {
    fields(ctx.descriptor(), ctx.options())?.ok_or_else(|| {
        Error::resolution(ctx.descriptor().type_name(), "type has no fields to decompose")
    })
}

/// One child vector per field
#[derive(Debug)]
pub struct CompositeVector {
    shape: Shape,
    children: Vec<DynVector>,
    len: usize,
}

impl CompositeVector {
    /// Split a value into its field values, in field order
    fn deconstruct(&self, value: Value) -> Result<Vec<Value>> {
        let parts = match (&self.shape, value) {
            (Shape::Record(_), Value::Record(items)) => items.into_iter().map(|(_, v)| v).collect(),
            (Shape::Tuple, Value::Tuple(items)) => items,
            (Shape::Array(dims), Value::Array { shape, items }) => {
                if shape != *dims {
                    return Err(Error::DimensionMismatch {
                        expected: dims.clone(),
                        actual: shape,
                    });
                }
                items
            }
            (_, other) => return Err(Error::type_mismatch("composite value", other.kind_name())),
        };
        if parts.len() != self.children.len() {
            return Err(Error::type_mismatch(
                format!("{} fields", self.children.len()),
                format!("{} fields", parts.len()),
            ));
        }
        Ok(parts)
    }

    /// Reassemble a value from its field values
    fn construct(&self, parts: Vec<Value>) -> Value {
        match &self.shape {
            Shape::Record(names) => Value::Record(names.iter().cloned().zip(parts).collect()),
            Shape::Tuple => Value::Tuple(parts),
            Shape::Array(dims) => Value::Array {
                shape: dims.clone(),
                items: parts,
            },
        }
    }
}

impl StoredVector for CompositeVector {
    fn len(&self) -> usize {
        self.len
    }

    fn push(&mut self, value: Value) -> Result<()> {
        let parts = self.deconstruct(value)?;
        for (child, part) in self.children.iter_mut().zip(parts) {
            child.push_unchecked(part)?;
        }
        self.len += 1;
        Ok(())
    }

    fn push_many(&mut self, values: Vec<Value>) -> Result<()> {
        let n = values.len();
        let mut columns: Vec<Vec<Value>> =
            self.children.iter().map(|_| Vec::with_capacity(n)).collect();
        for value in values {
            for (column, part) in columns.iter_mut().zip(self.deconstruct(value)?) {
                column.push(part);
            }
        }
        for (child, column) in self.children.iter_mut().zip(columns) {
            child.push_many_unchecked(column)?;
        }
        self.len += n;
        Ok(())
    }

    fn get(&self, index: usize) -> Result<Value> {
        check_index(index, self.len)?;
        let parts = self
            .children
            .iter()
            .map(|c| c.get(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.construct(parts))
    }

    fn set(&mut self, index: usize, value: Value) -> Result<()> {
        check_index(index, self.len)?;
        let parts = self.deconstruct(value)?;
        for (child, part) in self.children.iter_mut().zip(parts) {
            child.set_unchecked(index, part)?;
        }
        Ok(())
    }

    fn collect(&self) -> Result<Vec<Value>> {
        let mut columns = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let mut values = child.collect()?;
            values.truncate(self.len);
            columns.push(values.into_iter());
        }
        let mut out = Vec::with_capacity(self.len);
        for _ in 0..self.len {
            let parts = columns
                .iter_mut()
                .map(|c| {
                    c.next()
                        .ok_or_else(|| Error::Metadata("composite child is short".to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            out.push(self.construct(parts));
        }
        Ok(out)
    }
}
