//! Native element types of the container store
//!
//! `DType` is the container's primitive vocabulary: fixed-width integers,
//! IEEE floats, UTF-8 text and packed compound rows. Every dataset has
//! exactly one `DType`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 8-bit integer (also the opaque byte type)
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Variable-length UTF-8 text
    Utf8,
    /// Fixed-size packed row of named members
    Compound(CompoundType),
}

impl DType {
    /// Size in bytes of one element, `None` for variable-length text
    pub fn element_size(&self) -> Option<usize> {
        match self {
            DType::I8 | DType::U8 => Some(1),
            DType::I16 | DType::U16 => Some(2),
            DType::I32 | DType::U32 | DType::F32 => Some(4),
            DType::I64 | DType::U64 | DType::F64 => Some(8),
            DType::Utf8 => None,
            DType::Compound(c) => Some(c.size()),
        }
    }

    /// Short lowercase name used in type names and style tags
    pub fn name(&self) -> String {
        match self {
            DType::I8 => "i8".to_string(),
            DType::I16 => "i16".to_string(),
            DType::I32 => "i32".to_string(),
            DType::I64 => "i64".to_string(),
            DType::U8 => "u8".to_string(),
            DType::U16 => "u16".to_string(),
            DType::U32 => "u32".to_string(),
            DType::U64 => "u64".to_string(),
            DType::F32 => "f32".to_string(),
            DType::F64 => "f64".to_string(),
            DType::Utf8 => "String".to_string(),
            DType::Compound(c) => c.to_string(),
        }
    }

    /// True for the fixed-width numeric types
    pub fn is_numeric(&self) -> bool {
        !matches!(self, DType::Utf8 | DType::Compound(_))
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A member of a compound row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundMember {
    /// Member name
    pub name: String,
    /// Member type (numeric or nested compound)
    pub dtype: DType,
    /// Byte offset within the row
    pub offset: usize,
}

/// Layout of a packed compound row
///
/// Members are laid out back to back, little-endian, without padding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundType {
    /// Members in declaration order
    pub members: Vec<CompoundMember>,
}

impl CompoundType {
    /// Build a layout from `(name, dtype)` pairs, computing offsets
    ///
    /// Returns `None` if any member has no fixed size.
    pub fn packed<I, S>(members: I) -> Option<Self>
    where
        I: IntoIterator<Item = (S, DType)>,
        S: Into<String>,
    {
        let mut offset = 0;
        let mut out = Vec::new();
        for (name, dtype) in members {
            let size = dtype.element_size()?;
            out.push(CompoundMember {
                name: name.into(),
                dtype,
                offset,
            });
            offset += size;
        }
        Some(CompoundType { members: out })
    }

    /// Row size in bytes
    pub fn size(&self) -> usize {
        self.members
            .last()
            .and_then(|m| m.dtype.element_size().map(|s| m.offset + s))
            .unwrap_or(0)
    }
}

impl fmt::Display for CompoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compound{{")?;
        for (i, m) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", m.name, m.dtype)?;
        }
        write!(f, "}}")
    }
}
