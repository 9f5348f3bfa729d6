//! Packed compound rows
//!
//! Fixed-layout records and tuples (see [`TypeDesc::is_bits`]) can be stored
//! as one compound row per element when portability is not required. Rows
//! are little-endian, members back to back, no padding:
//!
//! | member type | row type |
//! |-------------|----------|
//! | numeric     | itself   |
//! | `bool`      | `u8`     |
//! | `char`      | `u32` code point |
//! | enum        | `i32` variant index |
//! | record / tuple | nested compound |
//! | fixed array | nested compound with members `0..n` |
//!
//! These member encodings are fixed. Conversions registered for `bool`,
//! `char` or enums, and style overrides of nested record types, are not
//! consulted inside a packed row; a type that relies on them must be stored
//! with `portable = true`, where every field goes through the registry.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use chunkvec_core::{CompoundType, DType, Error, Result, TypeDesc, Value};

/// Compound layout of a fixed-layout record or tuple
pub fn layout_for(desc: &TypeDesc) -> Option<CompoundType> {
    match desc {
        TypeDesc::Record { fields, .. } if !fields.is_empty() => CompoundType::packed(
            fields
                .iter()
                .map(|f| member_dtype(&f.ty).map(|d| (f.name.clone(), d)))
                .collect::<Option<Vec<_>>>()?,
        ),
        TypeDesc::Tuple { elems } if !elems.is_empty() => positional(elems.iter(), elems.len()),
        _ => None,
    }
}

fn positional<'a>(elems: impl Iterator<Item = &'a TypeDesc>, n: usize) -> Option<CompoundType> {
    let mut members = Vec::with_capacity(n);
    for (i, elem) in elems.enumerate() {
        members.push((i.to_string(), member_dtype(elem)?));
    }
    CompoundType::packed(members)
}

fn member_dtype(desc: &TypeDesc) -> Option<DType> {
    match desc {
        TypeDesc::Native { dtype } if dtype.is_numeric() => Some(dtype.clone()),
        TypeDesc::Bool => Some(DType::U8),
        TypeDesc::Char => Some(DType::U32),
        TypeDesc::Enum { .. } => Some(DType::I32),
        TypeDesc::Record { .. } | TypeDesc::Tuple { .. } => layout_for(desc).map(DType::Compound),
        TypeDesc::FixedArray { elem, shape } => {
            let n: usize = shape.iter().product();
            if n == 0 {
                return None;
            }
            positional(std::iter::repeat(elem.as_ref()).take(n), n).map(DType::Compound)
        }
        _ => None,
    }
}

fn io_err(e: std::io::Error) -> Error {
    Error::Serialization(format!("packed row: {}", e))
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode one value of `desc` into a row of `layout.size()` bytes
pub fn encode_row(desc: &TypeDesc, layout: &CompoundType, value: Value) -> Result<Vec<u8>> {
    let mut row = Vec::with_capacity(layout.size());
    write_value(desc, value, &mut row)?;
    if row.len() != layout.size() {
        return Err(Error::Serialization(format!(
            "packed row for {} has {} bytes, layout needs {}",
            desc.type_name(),
            row.len(),
            layout.size()
        )));
    }
    Ok(row)
}

fn write_value(desc: &TypeDesc, value: Value, out: &mut Vec<u8>) -> Result<()> {
    match (desc, value) {
        (TypeDesc::Native { .. }, v) => write_scalar(v, out),
        (TypeDesc::Bool, Value::Bool(b)) => out.write_u8(b as u8).map_err(io_err),
        (TypeDesc::Char, Value::Char(c)) => out.write_u32::<LittleEndian>(c as u32).map_err(io_err),
        (TypeDesc::Enum { variants, .. }, Value::Enum(label)) => {
            let index = variants
                .iter()
                .position(|v| *v == label)
                .ok_or_else(|| Error::type_mismatch(desc.type_name(), label))?;
            out.write_i32::<LittleEndian>(index as i32).map_err(io_err)
        }
        (TypeDesc::Record { fields, .. }, Value::Record(items)) => fields
            .iter()
            .zip(items)
            .try_for_each(|(f, (_, v))| write_value(&f.ty, v, out)),
        (TypeDesc::Tuple { elems }, Value::Tuple(items)) => elems
            .iter()
            .zip(items)
            .try_for_each(|(d, v)| write_value(d, v, out)),
        (TypeDesc::FixedArray { elem, .. }, Value::Array { items, .. }) => {
            items.into_iter().try_for_each(|v| write_value(elem, v, out))
        }
        (desc, v) => Err(Error::type_mismatch(desc.type_name(), v.kind_name())),
    }
}

fn write_scalar(value: Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::I8(x) => out.write_i8(x),
        Value::I16(x) => out.write_i16::<LittleEndian>(x),
        Value::I32(x) => out.write_i32::<LittleEndian>(x),
        Value::I64(x) => out.write_i64::<LittleEndian>(x),
        Value::U8(x) => out.write_u8(x),
        Value::U16(x) => out.write_u16::<LittleEndian>(x),
        Value::U32(x) => out.write_u32::<LittleEndian>(x),
        Value::U64(x) => out.write_u64::<LittleEndian>(x),
        Value::F32(x) => out.write_f32::<LittleEndian>(x),
        Value::F64(x) => out.write_f64::<LittleEndian>(x),
        other => return Err(Error::type_mismatch("packed scalar", other.kind_name())),
    }
    .map_err(io_err)
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one row back into a value of `desc`
pub fn decode_row(desc: &TypeDesc, row: &[u8]) -> Result<Value> {
    let mut cursor = Cursor::new(row);
    let value = read_value(desc, &mut cursor)?;
    if cursor.position() as usize != row.len() {
        return Err(Error::Serialization(format!(
            "packed row for {} has {} trailing bytes",
            desc.type_name(),
            row.len() - cursor.position() as usize
        )));
    }
    Ok(value)
}

fn read_value(desc: &TypeDesc, cur: &mut Cursor<&[u8]>) -> Result<Value> {
    match desc {
        TypeDesc::Native { dtype } => read_scalar(dtype, cur),
        TypeDesc::Bool => Ok(Value::Bool(cur.read_u8().map_err(io_err)? != 0)),
        TypeDesc::Char => {
            let code = cur.read_u32::<LittleEndian>().map_err(io_err)?;
            char::from_u32(code)
                .map(Value::Char)
                .ok_or_else(|| Error::Serialization(format!("invalid code point {:#x}", code)))
        }
        TypeDesc::Enum { variants, .. } => {
            let index = cur.read_i32::<LittleEndian>().map_err(io_err)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| variants.get(i))
                .map(|label| Value::Enum(label.clone()))
                .ok_or_else(|| Error::Serialization(format!("invalid variant index {}", index)))
        }
        TypeDesc::Record { fields, .. } => {
            let mut items = Vec::with_capacity(fields.len());
            for f in fields {
                items.push((f.name.clone(), read_value(&f.ty, cur)?));
            }
            Ok(Value::Record(items))
        }
        TypeDesc::Tuple { elems } => elems
            .iter()
            .map(|d| read_value(d, cur))
            .collect::<Result<Vec<_>>>()
            .map(Value::Tuple),
        TypeDesc::FixedArray { elem, shape } => {
            let n: usize = shape.iter().product();
            let items = (0..n)
                .map(|_| read_value(elem, cur))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array {
                shape: shape.clone(),
                items,
            })
        }
        other => Err(Error::type_mismatch("fixed-layout type", other.type_name())),
    }
}

fn read_scalar(dtype: &DType, cur: &mut Cursor<&[u8]>) -> Result<Value> {
    let value = match dtype {
        DType::I8 => Value::I8(cur.read_i8().map_err(io_err)?),
        DType::I16 => Value::I16(cur.read_i16::<LittleEndian>().map_err(io_err)?),
        DType::I32 => Value::I32(cur.read_i32::<LittleEndian>().map_err(io_err)?),
        DType::I64 => Value::I64(cur.read_i64::<LittleEndian>().map_err(io_err)?),
        DType::U8 => Value::U8(cur.read_u8().map_err(io_err)?),
        DType::U16 => Value::U16(cur.read_u16::<LittleEndian>().map_err(io_err)?),
        DType::U32 => Value::U32(cur.read_u32::<LittleEndian>().map_err(io_err)?),
        DType::U64 => Value::U64(cur.read_u64::<LittleEndian>().map_err(io_err)?),
        DType::F32 => Value::F32(cur.read_f32::<LittleEndian>().map_err(io_err)?),
        DType::F64 => Value::F64(cur.read_f64::<LittleEndian>().map_err(io_err)?),
        other => return Err(Error::type_mismatch("packed scalar", other.name())),
    };
    Ok(value)
}
