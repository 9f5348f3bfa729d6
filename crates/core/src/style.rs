//! Storage styles
//!
//! A [`StorageStyle`] names the on-disk representation family chosen for a
//! value type. It is derived by the resolver, never stored as the source of
//! truth; its [`tag`](StorageStyle::tag) is persisted only so a reload can
//! detect that resolution changed underneath it.

use crate::dtype::DType;
use std::fmt;

/// On-disk representation family of a vector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageStyle {
    /// One native scalar per element in a 1-D dataset
    Elemental(DType),
    /// One fixed-shape slice per element stacked along a trailing dimension
    ArrayLike {
        /// Native element type
        dtype: DType,
        /// Per-element shape
        dims: Vec<usize>,
    },
    /// One independently styled child vector per field
    Composite,
    /// Opaque bytes plus cumulative stop offsets
    ByteSerialized,
    /// UTF-8 JSON text plus cumulative stop offsets
    TextSerialized,
    /// Style provided by a registered plugin codec
    Custom(String),
}

impl StorageStyle {
    /// Stable textual tag persisted in the metadata record
    pub fn tag(&self) -> String {
        match self {
            StorageStyle::Elemental(dtype) => format!("elemental({})", dtype),
            StorageStyle::ArrayLike { dtype, dims } => {
                let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                format!("array({}; {})", dtype, dims.join("x"))
            }
            StorageStyle::Composite => "composite".to_string(),
            StorageStyle::ByteSerialized => "bytes".to_string(),
            StorageStyle::TextSerialized => "text".to_string(),
            StorageStyle::Custom(id) => format!("custom:{}", id),
        }
    }

    /// Short family name, used in error messages
    pub fn family(&self) -> &str {
        match self {
            StorageStyle::Elemental(_) => "elemental",
            StorageStyle::ArrayLike { .. } => "array",
            StorageStyle::Composite => "composite",
            StorageStyle::ByteSerialized => "bytes",
            StorageStyle::TextSerialized => "text",
            StorageStyle::Custom(id) => id,
        }
    }
}

impl fmt::Display for StorageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
