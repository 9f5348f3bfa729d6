//! Typed element buffers
//!
//! A [`Column`] is a flat, typed run of dataset elements. Datasets store one
//! column; reads and writes move columns in and out. A dataset with leading
//! dimensions `(d1, ..., dK)` stores slice `i` of its trailing dimension at
//! elements `i * stride .. (i + 1) * stride`, with `stride = d1 * ... * dK`.

use chunkvec_core::{CompoundType, DType, Value};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Typed element buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// i8 elements
    I8(Vec<i8>),
    /// i16 elements
    I16(Vec<i16>),
    /// i32 elements
    I32(Vec<i32>),
    /// i64 elements
    I64(Vec<i64>),
    /// u8 elements
    U8(Vec<u8>),
    /// u16 elements
    U16(Vec<u16>),
    /// u32 elements
    U32(Vec<u32>),
    /// u64 elements
    U64(Vec<u64>),
    /// f32 elements
    F32(Vec<f32>),
    /// f64 elements
    F64(Vec<f64>),
    /// UTF-8 text elements
    Utf8(Vec<String>),
    /// Packed compound rows, `layout.size()` bytes each
    Packed {
        /// Row layout
        layout: CompoundType,
        /// Row bytes, back to back
        bytes: Vec<u8>,
    },
}

/// Applies `$body` to the inner `Vec` of every non-packed variant, and
/// `$packed` to the packed variant.
macro_rules! each_column {
    ($col:expr, $v:ident => $body:expr, $layout:ident, $bytes:ident => $packed:expr) => {
        match $col {
            Column::I8($v) => $body,
            Column::I16($v) => $body,
            Column::I32($v) => $body,
            Column::I64($v) => $body,
            Column::U8($v) => $body,
            Column::U16($v) => $body,
            Column::U32($v) => $body,
            Column::U64($v) => $body,
            Column::F32($v) => $body,
            Column::F64($v) => $body,
            Column::Utf8($v) => $body,
            Column::Packed {
                layout: $layout,
                bytes: $bytes,
            } => $packed,
        }
    };
}

/// Same as `each_column!` but rebuilds a column of the same variant.
macro_rules! map_column {
    ($col:expr, $v:ident => $body:expr, $layout:ident, $bytes:ident => $packed:expr) => {
        match $col {
            Column::I8($v) => Column::I8($body),
            Column::I16($v) => Column::I16($body),
            Column::I32($v) => Column::I32($body),
            Column::I64($v) => Column::I64($body),
            Column::U8($v) => Column::U8($body),
            Column::U16($v) => Column::U16($body),
            Column::U32($v) => Column::U32($body),
            Column::U64($v) => Column::U64($body),
            Column::F32($v) => Column::F32($body),
            Column::F64($v) => Column::F64($body),
            Column::Utf8($v) => Column::Utf8($body),
            Column::Packed {
                layout: $layout,
                bytes: $bytes,
            } => $packed,
        }
    };
}

impl Column {
    /// Empty column of the given element type
    pub fn empty(dtype: &DType) -> Self {
        Column::with_capacity(dtype, 0)
    }

    /// Empty column with room for `capacity` elements
    pub fn with_capacity(dtype: &DType, capacity: usize) -> Self {
        match dtype {
            DType::I8 => Column::I8(Vec::with_capacity(capacity)),
            DType::I16 => Column::I16(Vec::with_capacity(capacity)),
            DType::I32 => Column::I32(Vec::with_capacity(capacity)),
            DType::I64 => Column::I64(Vec::with_capacity(capacity)),
            DType::U8 => Column::U8(Vec::with_capacity(capacity)),
            DType::U16 => Column::U16(Vec::with_capacity(capacity)),
            DType::U32 => Column::U32(Vec::with_capacity(capacity)),
            DType::U64 => Column::U64(Vec::with_capacity(capacity)),
            DType::F32 => Column::F32(Vec::with_capacity(capacity)),
            DType::F64 => Column::F64(Vec::with_capacity(capacity)),
            DType::Utf8 => Column::Utf8(Vec::with_capacity(capacity)),
            DType::Compound(layout) => Column::Packed {
                layout: layout.clone(),
                bytes: Vec::with_capacity(capacity * layout.size()),
            },
        }
    }

    /// Element type of the column
    pub fn dtype(&self) -> DType {
        match self {
            Column::I8(_) => DType::I8,
            Column::I16(_) => DType::I16,
            Column::I32(_) => DType::I32,
            Column::I64(_) => DType::I64,
            Column::U8(_) => DType::U8,
            Column::U16(_) => DType::U16,
            Column::U32(_) => DType::U32,
            Column::U64(_) => DType::U64,
            Column::F32(_) => DType::F32,
            Column::F64(_) => DType::F64,
            Column::Utf8(_) => DType::Utf8,
            Column::Packed { layout, .. } => DType::Compound(layout.clone()),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        each_column!(self, v => v.len(), layout, bytes => {
            match layout.size() {
                0 => 0,
                size => bytes.len() / size,
            }
        })
    }

    /// True if the column holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the elements in `range`
    ///
    /// The caller guarantees `range` lies within `0..len()`.
    pub fn slice(&self, range: Range<usize>) -> Column {
        map_column!(self, v => v[range].to_vec(), layout, bytes => {
            let size = layout.size();
            Column::Packed {
                layout: layout.clone(),
                bytes: bytes[range.start * size..range.end * size].to_vec(),
            }
        })
    }

    /// Grow or shrink to `len` elements, filling with zeros / empty strings
    pub fn resize(&mut self, len: usize) {
        each_column!(self, v => v.resize(len, Default::default()), layout, bytes => {
            bytes.resize(len * layout.size(), 0)
        })
    }

    /// Reserve room for `additional` more elements
    pub fn reserve(&mut self, additional: usize) {
        each_column!(self, v => v.reserve(additional), layout, bytes => {
            bytes.reserve(additional * layout.size())
        })
    }

    /// Overwrite elements starting at `start` with `src`
    ///
    /// Returns `false` (and writes nothing) if the element types differ or
    /// `src` does not fit.
    pub fn overwrite(&mut self, start: usize, src: &Column) -> bool {
        let end = start + src.len();
        if end > self.len() {
            return false;
        }
        match (self, src) {
            (Column::I8(d), Column::I8(s)) => d[start..end].copy_from_slice(s),
            (Column::I16(d), Column::I16(s)) => d[start..end].copy_from_slice(s),
            (Column::I32(d), Column::I32(s)) => d[start..end].copy_from_slice(s),
            (Column::I64(d), Column::I64(s)) => d[start..end].copy_from_slice(s),
            (Column::U8(d), Column::U8(s)) => d[start..end].copy_from_slice(s),
            (Column::U16(d), Column::U16(s)) => d[start..end].copy_from_slice(s),
            (Column::U32(d), Column::U32(s)) => d[start..end].copy_from_slice(s),
            (Column::U64(d), Column::U64(s)) => d[start..end].copy_from_slice(s),
            (Column::F32(d), Column::F32(s)) => d[start..end].copy_from_slice(s),
            (Column::F64(d), Column::F64(s)) => d[start..end].copy_from_slice(s),
            (Column::Utf8(d), Column::Utf8(s)) => d[start..end].clone_from_slice(s),
            (
                Column::Packed { layout, bytes },
                Column::Packed {
                    layout: src_layout,
                    bytes: src_bytes,
                },
            ) if layout == src_layout => {
                let size = layout.size();
                bytes[start * size..end * size].copy_from_slice(src_bytes);
            }
            _ => return false,
        }
        true
    }

    /// Append one scalar value
    ///
    /// Packed columns accept a [`Value::Blob`] holding exactly one row.
    /// Returns `false` if the value does not match the column type.
    pub fn push_value(&mut self, value: Value) -> bool {
        match (self, value) {
            (Column::I8(d), Value::I8(x)) => d.push(x),
            (Column::I16(d), Value::I16(x)) => d.push(x),
            (Column::I32(d), Value::I32(x)) => d.push(x),
            (Column::I64(d), Value::I64(x)) => d.push(x),
            (Column::U8(d), Value::U8(x)) => d.push(x),
            (Column::U16(d), Value::U16(x)) => d.push(x),
            (Column::U32(d), Value::U32(x)) => d.push(x),
            (Column::U64(d), Value::U64(x)) => d.push(x),
            (Column::F32(d), Value::F32(x)) => d.push(x),
            (Column::F64(d), Value::F64(x)) => d.push(x),
            (Column::Utf8(d), Value::Str(x)) => d.push(x),
            (Column::Packed { layout, bytes }, Value::Blob(row)) if row.len() == layout.size() => {
                bytes.extend_from_slice(&row)
            }
            _ => return false,
        }
        true
    }

    /// Element `index` as a scalar value (packed rows as [`Value::Blob`])
    ///
    /// The caller guarantees `index < len()`.
    pub fn value_at(&self, index: usize) -> Value {
        match self {
            Column::I8(v) => Value::I8(v[index]),
            Column::I16(v) => Value::I16(v[index]),
            Column::I32(v) => Value::I32(v[index]),
            Column::I64(v) => Value::I64(v[index]),
            Column::U8(v) => Value::U8(v[index]),
            Column::U16(v) => Value::U16(v[index]),
            Column::U32(v) => Value::U32(v[index]),
            Column::U64(v) => Value::U64(v[index]),
            Column::F32(v) => Value::F32(v[index]),
            Column::F64(v) => Value::F64(v[index]),
            Column::Utf8(v) => Value::Str(v[index].clone()),
            Column::Packed { layout, bytes } => {
                let size = layout.size();
                Value::Blob(bytes[index * size..(index + 1) * size].to_vec())
            }
        }
    }

    /// All elements as scalar values
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Column::I8(v) => v.into_iter().map(Value::I8).collect(),
            Column::I16(v) => v.into_iter().map(Value::I16).collect(),
            Column::I32(v) => v.into_iter().map(Value::I32).collect(),
            Column::I64(v) => v.into_iter().map(Value::I64).collect(),
            Column::U8(v) => v.into_iter().map(Value::U8).collect(),
            Column::U16(v) => v.into_iter().map(Value::U16).collect(),
            Column::U32(v) => v.into_iter().map(Value::U32).collect(),
            Column::U64(v) => v.into_iter().map(Value::U64).collect(),
            Column::F32(v) => v.into_iter().map(Value::F32).collect(),
            Column::F64(v) => v.into_iter().map(Value::F64).collect(),
            Column::Utf8(v) => v.into_iter().map(Value::Str).collect(),
            Column::Packed { layout, bytes } => {
                let size = layout.size();
                if size == 0 {
                    return Vec::new();
                }
                bytes
                    .chunks_exact(size)
                    .map(|row| Value::Blob(row.to_vec()))
                    .collect()
            }
        }
    }
}
