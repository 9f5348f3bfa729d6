//! Native conversions
//!
//! A logical type whose values are not container-native (a bool, a char, an
//! enum, or a user logical type) is stored through a [`NativeConversion`]:
//! a symmetric `to_native` / `from_native` pair that must be inverses for
//! every representable value.
//!
//! [`ScalarCodec`] is the per-element encoder shared by elemental and
//! array-like vectors: identity for native scalars, a registered conversion
//! for logical types, or a packed row for fixed-layout records.

use std::fmt;
use std::sync::Arc;

use chunkvec_core::{CompoundType, DType, Error, Result, TypeDesc, Value};

use crate::packed;
use crate::registry::VectorRegistry;

/// Symmetric conversion between a logical value and a native scalar
pub trait NativeConversion: Send + Sync {
    /// Native element type values are stored as
    fn native(&self) -> DType;

    /// Convert a logical value of `desc` to its native representation
    fn to_native(&self, desc: &TypeDesc, value: Value) -> Result<Value>;

    /// Convert a native scalar back to a logical value of `desc`
    fn from_native(&self, desc: &TypeDesc, value: Value) -> Result<Value>;
}

/// Conversion-table key of a descriptor
///
/// Built-in conversions are keyed by kind (`bool`, `char`, `enum`); user
/// logical types by their name.
pub fn conversion_key(desc: &TypeDesc) -> Option<&str> {
    match desc {
        TypeDesc::Bool => Some("bool"),
        TypeDesc::Char => Some("char"),
        TypeDesc::Enum { .. } => Some("enum"),
        TypeDesc::Logical { name, .. } => Some(name),
        _ => None,
    }
}

/// `bool` stored as `u8` (0 or 1)
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConversion;

impl NativeConversion for BoolConversion {
    fn native(&self) -> DType {
        DType::U8
    }

    fn to_native(&self, desc: &TypeDesc, value: Value) -> Result<Value> {
        match value {
            Value::Bool(b) => Ok(Value::U8(b as u8)),
            other => Err(Error::type_mismatch(desc.type_name(), other.kind_name())),
        }
    }

    fn from_native(&self, desc: &TypeDesc, value: Value) -> Result<Value> {
        match value {
            Value::U8(x) => Ok(Value::Bool(x != 0)),
            other => Err(Error::type_mismatch(desc.type_name(), other.kind_name())),
        }
    }
}

/// `char` stored as its `u32` code point
#[derive(Debug, Clone, Copy, Default)]
pub struct CharConversion;

impl NativeConversion for CharConversion {
    fn native(&self) -> DType {
        DType::U32
    }

    fn to_native(&self, desc: &TypeDesc, value: Value) -> Result<Value> {
        match value {
            Value::Char(c) => Ok(Value::U32(c as u32)),
            other => Err(Error::type_mismatch(desc.type_name(), other.kind_name())),
        }
    }

    fn from_native(&self, desc: &TypeDesc, value: Value) -> Result<Value> {
        match value {
            Value::U32(code) => char::from_u32(code)
                .map(Value::Char)
                .ok_or_else(|| Error::Serialization(format!("invalid code point {:#x}", code))),
            other => Err(Error::type_mismatch(desc.type_name(), other.kind_name())),
        }
    }
}

/// Enumerated values stored as the `i32` index of their variant
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumConversion;

impl NativeConversion for EnumConversion {
    fn native(&self) -> DType {
        DType::I32
    }

    fn to_native(&self, desc: &TypeDesc, value: Value) -> Result<Value> {
        let variants = enum_variants(desc)?;
        match value {
            Value::Enum(label) => variants
                .iter()
                .position(|v| *v == label)
                .map(|i| Value::I32(i as i32))
                .ok_or_else(|| {
                    Error::type_mismatch(desc.type_name(), format!("unknown variant {}", label))
                }),
            other => Err(Error::type_mismatch(desc.type_name(), other.kind_name())),
        }
    }

    fn from_native(&self, desc: &TypeDesc, value: Value) -> Result<Value> {
        let variants = enum_variants(desc)?;
        match value {
            Value::I32(index) => usize::try_from(index)
                .ok()
                .and_then(|i| variants.get(i))
                .map(|label| Value::Enum(label.clone()))
                .ok_or_else(|| {
                    Error::Serialization(format!(
                        "variant index {} out of range for {}",
                        index,
                        desc.type_name()
                    ))
                }),
            other => Err(Error::type_mismatch(desc.type_name(), other.kind_name())),
        }
    }
}

fn enum_variants(desc: &TypeDesc) -> Result<&[String]> {
    match desc {
        TypeDesc::Enum { variants, .. } => Ok(variants),
        other => Err(Error::type_mismatch("enum", other.type_name())),
    }
}

type ConvertFn = Box<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Conversion built from a pair of closures
///
/// ```rust,ignore
/// let version = FnConversion::new(
///     DType::U32,
///     |v| /* Tuple(major, minor) -> U32 */,
///     |v| /* U32 -> Tuple(major, minor) */,
/// );
/// registry.register_conversion("Version", Arc::new(version));
/// ```
pub struct FnConversion {
    native: DType,
    to: ConvertFn,
    from: ConvertFn,
}

impl FnConversion {
    /// Create a conversion from its two directions
    pub fn new<F, G>(native: DType, to_native: F, from_native: G) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
        G: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        FnConversion {
            native,
            to: Box::new(to_native),
            from: Box::new(from_native),
        }
    }
}

impl fmt::Debug for FnConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConversion")
            .field("native", &self.native)
            .finish()
    }
}

impl NativeConversion for FnConversion {
    fn native(&self) -> DType {
        self.native.clone()
    }

    fn to_native(&self, _desc: &TypeDesc, value: Value) -> Result<Value> {
        (self.to)(value)
    }

    fn from_native(&self, _desc: &TypeDesc, value: Value) -> Result<Value> {
        (self.from)(value)
    }
}

// ============================================================================
// Per-element codec
// ============================================================================

/// Encoder between element values and native scalars
#[derive(Clone)]
pub(crate) enum ScalarCodec {
    /// Value already native
    Identity,
    /// Through a registered conversion
    Converted {
        conversion: Arc<dyn NativeConversion>,
        desc: TypeDesc,
    },
    /// Fixed-layout record as a compound row
    Packed {
        desc: TypeDesc,
        layout: CompoundType,
    },
}

impl ScalarCodec {
    /// Codec storing values of `desc` as `dtype`
    pub(crate) fn build(desc: &TypeDesc, dtype: &DType, registry: &VectorRegistry) -> Result<Self> {
        match (desc, dtype) {
            (TypeDesc::Native { dtype: native }, _) if native == dtype => Ok(ScalarCodec::Identity),
            (TypeDesc::Bool | TypeDesc::Char | TypeDesc::Enum { .. } | TypeDesc::Logical { .. }, _) => {
                let conversion = registry.conversion_for(desc).ok_or_else(|| {
                    Error::resolution(desc.type_name(), "no native conversion registered")
                })?;
                if conversion.native() != *dtype {
                    return Err(Error::resolution(
                        desc.type_name(),
                        format!(
                            "conversion stores {}, vector stores {}",
                            conversion.native(),
                            dtype
                        ),
                    ));
                }
                Ok(ScalarCodec::Converted {
                    conversion,
                    desc: desc.clone(),
                })
            }
            (_, DType::Compound(layout)) => match packed::layout_for(desc) {
                Some(expected) if expected == *layout => Ok(ScalarCodec::Packed {
                    desc: desc.clone(),
                    layout: layout.clone(),
                }),
                _ => Err(Error::resolution(
                    desc.type_name(),
                    format!("layout does not match {}", layout),
                )),
            },
            _ => Err(Error::resolution(
                desc.type_name(),
                format!("cannot be stored as {}", dtype),
            )),
        }
    }

    /// Element value to native scalar
    pub(crate) fn encode(&self, value: Value) -> Result<Value> {
        match self {
            ScalarCodec::Identity => Ok(value),
            ScalarCodec::Converted { conversion, desc } => conversion.to_native(desc, value),
            ScalarCodec::Packed { desc, layout } => {
                packed::encode_row(desc, layout, value).map(Value::Blob)
            }
        }
    }

    /// Native scalar to element value
    pub(crate) fn decode(&self, value: Value) -> Result<Value> {
        match self {
            ScalarCodec::Identity => Ok(value),
            ScalarCodec::Converted { conversion, desc } => conversion.from_native(desc, value),
            ScalarCodec::Packed { desc, .. } => match value {
                Value::Blob(row) => packed::decode_row(desc, &row),
                other => Err(Error::type_mismatch("packed row", other.kind_name())),
            },
        }
    }
}

impl fmt::Debug for ScalarCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarCodec::Identity => write!(f, "Identity"),
            ScalarCodec::Converted { desc, .. } => write!(f, "Converted({})", desc.type_name()),
            ScalarCodec::Packed { layout, .. } => write!(f, "Packed({})", layout),
        }
    }
}
