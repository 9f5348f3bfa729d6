//! Type descriptors
//!
//! A [`TypeDesc`] is the serializable description of a value type. It is
//! what the resolver inspects to choose a storage style, and it is persisted
//! (as JSON) in every vector's metadata record so that a vector can be
//! reloaded knowing only its location.
//!
//! Descriptors are authored explicitly (see `Storable` in the engine crate);
//! nothing is discovered reflectively.

use crate::dtype::DType;
use serde::{Deserialize, Serialize};

/// A named member of a record type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field name, also the child sub-vector name in composite layouts
    pub name: String,
    /// Field type
    pub ty: TypeDesc,
}

impl Field {
    /// Create a field
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Field {
            name: name.into(),
            ty,
        }
    }
}

/// External serialization format of an opaque payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerialFormat {
    /// Binary (bincode)
    Binary,
    /// UTF-8 JSON text
    Json,
}

/// Description of a value type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDesc {
    /// Container-native scalar (integers, floats, UTF-8 text)
    Native {
        /// Element type
        dtype: DType,
    },
    /// Boolean, stored as `u8`
    Bool,
    /// Unicode scalar value, stored as a `u32` code point
    Char,
    /// Enumerated type, stored as the `i32` variant index
    Enum {
        /// Type name
        name: String,
        /// Variant labels in declaration order
        variants: Vec<String>,
    },
    /// User logical type with a registered native conversion
    Logical {
        /// Type name (key into the conversion table)
        name: String,
        /// Native storage type
        native: DType,
    },
    /// Positional fixed-length tuple
    Tuple {
        /// Element types in order
        elems: Vec<TypeDesc>,
    },
    /// Record with named fields
    Record {
        /// Type name
        name: String,
        /// Fields in declaration order
        fields: Vec<Field>,
    },
    /// Array whose shape is part of the type
    FixedArray {
        /// Element type
        elem: Box<TypeDesc>,
        /// Declared shape
        shape: Vec<usize>,
    },
    /// Array whose shape varies per value
    Array {
        /// Element type
        elem: Box<TypeDesc>,
    },
    /// Payload already serialized by an external codec
    Opaque {
        /// Type name
        name: String,
        /// Payload format
        format: SerialFormat,
    },
}

impl TypeDesc {
    /// Native scalar descriptor
    pub fn native(dtype: DType) -> Self {
        TypeDesc::Native { dtype }
    }

    /// Record descriptor from `(name, type)` pairs
    pub fn record<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeDesc)>,
        S: Into<String>,
    {
        TypeDesc::Record {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(n, ty)| Field::new(n, ty))
                .collect(),
        }
    }

    /// Tuple descriptor
    pub fn tuple(elems: Vec<TypeDesc>) -> Self {
        TypeDesc::Tuple { elems }
    }

    /// Fixed-shape array descriptor
    pub fn fixed_array(elem: TypeDesc, shape: Vec<usize>) -> Self {
        TypeDesc::FixedArray {
            elem: Box::new(elem),
            shape,
        }
    }

    /// Variable-shape array descriptor
    pub fn array(elem: TypeDesc) -> Self {
        TypeDesc::Array {
            elem: Box::new(elem),
        }
    }

    /// Enumerated type descriptor
    pub fn enumeration<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDesc::Enum {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Logical type descriptor
    pub fn logical(name: impl Into<String>, native: DType) -> Self {
        TypeDesc::Logical {
            name: name.into(),
            native,
        }
    }

    /// Opaque (externally serialized) descriptor
    pub fn opaque(name: impl Into<String>, format: SerialFormat) -> Self {
        TypeDesc::Opaque {
            name: name.into(),
            format,
        }
    }

    /// Human-readable type name, persisted as the metadata `type` entry
    pub fn type_name(&self) -> String {
        match self {
            TypeDesc::Native { dtype } => dtype.name(),
            TypeDesc::Bool => "bool".to_string(),
            TypeDesc::Char => "char".to_string(),
            TypeDesc::Enum { name, .. }
            | TypeDesc::Logical { name, .. }
            | TypeDesc::Record { name, .. }
            | TypeDesc::Opaque { name, .. } => name.clone(),
            TypeDesc::Tuple { elems } => {
                let inner: Vec<String> = elems.iter().map(|e| e.type_name()).collect();
                if elems.len() == 1 {
                    format!("({},)", inner[0])
                } else {
                    format!("({})", inner.join(", "))
                }
            }
            TypeDesc::FixedArray { elem, shape } => {
                let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
                format!("[{}; {}]", elem.type_name(), dims.join("x"))
            }
            TypeDesc::Array { elem } => format!("Vec<{}>", elem.type_name()),
        }
    }

    /// The author-given name of a named type
    pub fn named(&self) -> Option<&str> {
        match self {
            TypeDesc::Enum { name, .. }
            | TypeDesc::Logical { name, .. }
            | TypeDesc::Record { name, .. }
            | TypeDesc::Opaque { name, .. } => Some(name),
            _ => None,
        }
    }

    /// True when every value of this type has the same fixed binary layout
    /// made only of fixed-width numeric, bool and char parts
    pub fn is_bits(&self) -> bool {
        match self {
            TypeDesc::Native { dtype } => dtype.is_numeric(),
            TypeDesc::Bool | TypeDesc::Char | TypeDesc::Enum { .. } => true,
            TypeDesc::Tuple { elems } => !elems.is_empty() && elems.iter().all(|e| e.is_bits()),
            TypeDesc::Record { fields, .. } => {
                !fields.is_empty() && fields.iter().all(|f| f.ty.is_bits())
            }
            TypeDesc::FixedArray { elem, shape } => {
                shape.iter().all(|&d| d > 0) && elem.is_bits()
            }
            TypeDesc::Logical { .. } | TypeDesc::Array { .. } | TypeDesc::Opaque { .. } => false,
        }
    }

    /// Element type and shape of array-like types
    ///
    /// Homogeneous tuples count as 1-D arrays of their element type. The
    /// shape is `None` when the type does not declare one (`Array`).
    pub fn array_parts(&self) -> Option<(&TypeDesc, Option<Vec<usize>>)> {
        match self {
            TypeDesc::Tuple { elems } => {
                let first = elems.first()?;
                if elems.iter().all(|e| e == first) {
                    Some((first, Some(vec![elems.len()])))
                } else {
                    None
                }
            }
            TypeDesc::FixedArray { elem, shape } => Some((elem, Some(shape.clone()))),
            TypeDesc::Array { elem } => Some((elem, None)),
            _ => None,
        }
    }
}
