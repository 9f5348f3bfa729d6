//! Value types for chunkvec
//!
//! [`Value`] is the dynamic value model every storage style reads and writes.
//! Typed Rust values convert into it (see `Storable` in the engine crate) and
//! a self-describing load hands values back in this form.
//!
//! ## Type Rules
//!
//! - No implicit coercions: `I64(1) != I32(1)`, `Str != Text`, `Blob != Array`
//! - Float equality is IEEE-754: `NaN != NaN`, `-0.0 == 0.0`
//! - Arrays are flat `items` plus a `shape`; element `k` of the flattened order
//!   varies the first dimension fastest

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::types::{SerialFormat, TypeDesc};
use serde::{Deserialize, Serialize};

/// Dynamic value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Signed 8-bit integer
    I8(i8),
    /// Signed 16-bit integer
    I16(i16),
    /// Signed 32-bit integer
    I32(i32),
    /// Signed 64-bit integer
    I64(i64),
    /// Unsigned 8-bit integer
    U8(u8),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// UTF-8 string
    Str(String),
    /// Unicode scalar value
    Char(char),
    /// Variant label of an enumerated type
    Enum(String),
    /// Positional tuple
    Tuple(Vec<Value>),
    /// Record fields in declaration order
    Record(Vec<(String, Value)>),
    /// Multi-dimensional array
    Array {
        /// Shape of the array
        shape: Vec<usize>,
        /// Items in flattened order
        items: Vec<Value>,
    },
    /// Externally serialized binary payload
    Blob(Vec<u8>),
    /// Externally serialized JSON text
    Text(String),
}

impl Value {
    /// Short name of the value's kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "String",
            Value::Char(_) => "char",
            Value::Enum(_) => "enum",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
            Value::Array { .. } => "array",
            Value::Blob(_) => "blob",
            Value::Text(_) => "text",
        }
    }

    /// Native element type of a scalar value
    pub fn native_dtype(&self) -> Option<DType> {
        match self {
            Value::I8(_) => Some(DType::I8),
            Value::I16(_) => Some(DType::I16),
            Value::I32(_) => Some(DType::I32),
            Value::I64(_) => Some(DType::I64),
            Value::U8(_) => Some(DType::U8),
            Value::U16(_) => Some(DType::U16),
            Value::U32(_) => Some(DType::U32),
            Value::U64(_) => Some(DType::U64),
            Value::F32(_) => Some(DType::F32),
            Value::F64(_) => Some(DType::F64),
            Value::Str(_) => Some(DType::Utf8),
            _ => None,
        }
    }

    /// Build a record value from `(name, value)` pairs
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Record(fields.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    /// Build a 1-D array value
    pub fn list(items: Vec<Value>) -> Self {
        Value::Array {
            shape: vec![items.len()],
            items,
        }
    }

    /// Check that this value is an instance of `desc`
    ///
    /// Logical types are accepted as-is; their conversion validates them.
    pub fn conforms_to(&self, desc: &TypeDesc) -> Result<()> {
        let mismatch = || Error::type_mismatch(desc.type_name(), self.kind_name());
        match (desc, self) {
            (TypeDesc::Native { dtype }, v) => {
                if v.native_dtype().as_ref() == Some(dtype) {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            (TypeDesc::Bool, Value::Bool(_)) | (TypeDesc::Char, Value::Char(_)) => Ok(()),
            (TypeDesc::Enum { variants, .. }, Value::Enum(label)) => {
                if variants.iter().any(|v| v == label) {
                    Ok(())
                } else {
                    Err(Error::type_mismatch(
                        desc.type_name(),
                        format!("unknown variant {}", label),
                    ))
                }
            }
            (TypeDesc::Logical { .. }, _) => Ok(()),
            (TypeDesc::Tuple { elems }, Value::Tuple(items)) => {
                if elems.len() != items.len() {
                    return Err(Error::type_mismatch(
                        desc.type_name(),
                        format!("tuple of {}", items.len()),
                    ));
                }
                elems
                    .iter()
                    .zip(items)
                    .try_for_each(|(d, v)| v.conforms_to(d))
            }
            (TypeDesc::Record { fields, .. }, Value::Record(items)) => {
                if fields.len() != items.len() {
                    return Err(Error::type_mismatch(
                        desc.type_name(),
                        format!("record of {} fields", items.len()),
                    ));
                }
                fields.iter().zip(items).try_for_each(|(f, (name, v))| {
                    if &f.name != name {
                        return Err(Error::type_mismatch(
                            format!("{}.{}", desc.type_name(), f.name),
                            format!("field {}", name),
                        ));
                    }
                    v.conforms_to(&f.ty)
                })
            }
            (TypeDesc::FixedArray { elem, shape }, Value::Array { shape: s, items }) => {
                if shape != s {
                    return Err(Error::DimensionMismatch {
                        expected: shape.clone(),
                        actual: s.clone(),
                    });
                }
                check_items(elem, s, items)
            }
            (TypeDesc::Array { elem }, Value::Array { shape, items }) => {
                check_items(elem, shape, items)
            }
            (TypeDesc::Opaque { format, .. }, v) => match (format, v) {
                (SerialFormat::Binary, Value::Blob(_)) | (SerialFormat::Json, Value::Text(_)) => {
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        }
    }
}

fn check_items(elem: &TypeDesc, shape: &[usize], items: &[Value]) -> Result<()> {
    let expected: usize = shape.iter().product();
    if expected != items.len() {
        return Err(Error::type_mismatch(
            format!("{} items for shape {:?}", expected, shape),
            format!("{} items", items.len()),
        ));
    }
    items.iter().try_for_each(|v| v.conforms_to(elem))
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => Str,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_equality() {
        assert_ne!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert_eq!(Value::F64(-0.0), Value::F64(0.0));
        assert_ne!(Value::I64(1), Value::I32(1));
    }

    #[test]
    fn test_conforms_native() {
        let d = TypeDesc::native(DType::I64);
        assert!(Value::I64(3).conforms_to(&d).is_ok());
        assert!(matches!(
            Value::F64(3.0).conforms_to(&d),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(Value::from("x")
            .conforms_to(&TypeDesc::native(DType::Utf8))
            .is_ok());
    }

    #[test]
    fn test_conforms_record_order() {
        let d = TypeDesc::record(
            "AB",
            [
                ("a", TypeDesc::native(DType::I64)),
                ("b", TypeDesc::native(DType::F64)),
            ],
        );
        let ok = Value::record([("a", Value::I64(1)), ("b", Value::F64(2.0))]);
        assert!(ok.conforms_to(&d).is_ok());

        let swapped = Value::record([("b", Value::F64(2.0)), ("a", Value::I64(1))]);
        assert!(swapped.conforms_to(&d).is_err());
    }

    #[test]
    fn test_conforms_fixed_array_shape() {
        let d = TypeDesc::fixed_array(TypeDesc::native(DType::F32), vec![3]);
        let ok = Value::list(vec![Value::F32(1.0), Value::F32(2.0), Value::F32(3.0)]);
        assert!(ok.conforms_to(&d).is_ok());

        let short = Value::list(vec![Value::F32(1.0)]);
        assert!(matches!(
            short.conforms_to(&d),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_conforms_array_item_count() {
        let d = TypeDesc::array(TypeDesc::native(DType::U8));
        let bad = Value::Array {
            shape: vec![2, 2],
            items: vec![Value::U8(1)],
        };
        assert!(bad.conforms_to(&d).is_err());
    }

    #[test]
    fn test_conforms_enum() {
        let d = TypeDesc::enumeration("Color", ["Red", "Green"]);
        assert!(Value::Enum("Red".into()).conforms_to(&d).is_ok());
        assert!(Value::Enum("Blue".into()).conforms_to(&d).is_err());
    }

    #[test]
    fn test_conforms_opaque() {
        let bin = TypeDesc::opaque("B", SerialFormat::Binary);
        let json = TypeDesc::opaque("J", SerialFormat::Json);
        assert!(Value::Blob(vec![1]).conforms_to(&bin).is_ok());
        assert!(Value::Text("{}".into()).conforms_to(&json).is_ok());
        assert!(Value::Blob(vec![1]).conforms_to(&json).is_err());
    }

    #[test]
    fn test_bincode_roundtrip() {
        let v = Value::record([
            ("id", Value::U32(7)),
            ("tags", Value::list(vec![Value::from("a"), Value::from("b")])),
        ]);
        let bytes = bincode::serialize(&v).unwrap();
        let back: Value = bincode::deserialize(&bytes).unwrap();
        assert_eq!(v, back);
    }
}
