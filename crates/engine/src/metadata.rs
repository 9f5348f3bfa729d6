//! Metadata record
//!
//! Every vector stores a small self-describing record under
//! `<vector>/metadata/`, written once at creation and read once at load:
//!
//! | entry | dtype | content |
//! |-------|-------|---------|
//! | `type` | utf8 | human-readable type name |
//! | `serialized_type` | utf8 | JSON of the [`TypeDesc`] |
//! | `dimensions_are_constant` | u8 | 1 if every element has `dimensions` |
//! | `dimensions` | i64 | fixed per-element dimensions (possibly empty) |
//! | `portable` | u8 | portability flag |
//! | `style` | utf8 | tag of the resolved storage style |
//! | `format_version` | u32 | metadata layout version |
//!
//! Only array-like (and plugin) elements have a shape, so the flag is 0 for
//! every other style. `dimensions` still records the `fixed_dims` a vector
//! was created with, since a composite's fields are re-resolved with them
//! on load.
//!
//! The style tag is never used to pick a codec; the style is always
//! re-derived from the descriptor and options, and the tag only guards
//! against resolution having changed since creation.

use chunkvec_core::{
    DType, Error, Result, StorageError, StorageStyle, TypeDesc, VectorOptions,
};
use chunkvec_storage::{Column, Group};

/// Name of the metadata sub-group
pub const METADATA_GROUP: &str = "metadata";

/// Name of a vector's data node (dataset or sub-group)
pub const DATA_NODE: &str = "data";

/// Current metadata layout version
pub const METADATA_FORMAT_VERSION: u32 = 1;

const TYPE: &str = "type";
const SERIALIZED_TYPE: &str = "serialized_type";
const DIMENSIONS_ARE_CONSTANT: &str = "dimensions_are_constant";
const DIMENSIONS: &str = "dimensions";
const PORTABLE: &str = "portable";
const STYLE: &str = "style";
const FORMAT_VERSION: &str = "format_version";

/// Persisted description of one vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Human-readable type name
    pub type_name: String,
    /// Full type descriptor
    pub descriptor: TypeDesc,
    /// Fixed dimensions the vector was created with
    pub dimensions: Option<Vec<usize>>,
    /// True if every element has shape `dimensions`
    pub dimensions_are_constant: bool,
    /// Portability flag
    pub portable: bool,
    /// Tag of the style resolved at creation
    pub style_tag: String,
    /// Metadata layout version
    pub format_version: u32,
}

impl MetadataRecord {
    /// Record for a vector being created
    ///
    /// Dimensions are recorded when supplied in `options`, or when the
    /// resolved style is array-like (the type's own declared shape). They are
    /// marked constant only for array-like and plugin styles.
    pub fn new(desc: &TypeDesc, options: &VectorOptions, style: &StorageStyle) -> Self {
        let dimensions = match (&options.fixed_dims, style) {
            (Some(dims), _) => Some(dims.clone()),
            (None, StorageStyle::ArrayLike { dims, .. }) => Some(dims.clone()),
            (None, _) => None,
        };
        let dimensions_are_constant = match style {
            StorageStyle::ArrayLike { .. } => true,
            StorageStyle::Custom(_) => dimensions.is_some(),
            _ => false,
        };
        MetadataRecord {
            type_name: desc.type_name(),
            descriptor: desc.clone(),
            dimensions,
            dimensions_are_constant,
            portable: options.portable,
            style_tag: style.tag(),
            format_version: METADATA_FORMAT_VERSION,
        }
    }

    /// Options to re-resolve the vector with
    ///
    /// The chunk size is not part of the record; the datasets keep their own.
    pub fn options(&self) -> VectorOptions {
        VectorOptions {
            portable: self.portable,
            fixed_dims: self.dimensions.clone(),
            ..VectorOptions::default()
        }
    }

    /// Write the record into `<group>/metadata/`
    pub fn write(&self, group: &Group) -> Result<()> {
        let meta = group.create_group(METADATA_GROUP)?;
        let serialized = serde_json::to_string(&self.descriptor)?;
        let dims: Vec<i64> = self
            .dimensions
            .iter()
            .flatten()
            .map(|&d| d as i64)
            .collect();
        let n = dims.len();

        meta.write_whole(TYPE, Column::Utf8(vec![self.type_name.clone()]), vec![1])?;
        meta.write_whole(SERIALIZED_TYPE, Column::Utf8(vec![serialized]), vec![1])?;
        meta.write_whole(
            DIMENSIONS_ARE_CONSTANT,
            Column::U8(vec![self.dimensions_are_constant as u8]),
            vec![1],
        )?;
        meta.write_whole(DIMENSIONS, Column::I64(dims), vec![n])?;
        meta.write_whole(PORTABLE, Column::U8(vec![self.portable as u8]), vec![1])?;
        meta.write_whole(STYLE, Column::Utf8(vec![self.style_tag.clone()]), vec![1])?;
        meta.write_whole(
            FORMAT_VERSION,
            Column::U32(vec![self.format_version]),
            vec![1],
        )?;
        Ok(())
    }

    /// Read the record from `<group>/metadata/`
    pub fn read(group: &Group) -> Result<Self> {
        let meta = group.group(METADATA_GROUP).map_err(|e| match e {
            StorageError::NotFound(_) | StorageError::NotAGroup(_) => {
                Error::Metadata(format!("no metadata record under {}", group.path()))
            }
            other => Error::Storage(other),
        })?;

        let format_version = match read_entry(&meta, FORMAT_VERSION, DType::U32)? {
            Column::U32(v) => single(v, FORMAT_VERSION)?,
            _ => unreachable_dtype(FORMAT_VERSION)?,
        };
        if format_version > METADATA_FORMAT_VERSION {
            return Err(Error::Metadata(format!(
                "metadata format version {} is newer than supported {}",
                format_version, METADATA_FORMAT_VERSION
            )));
        }

        let type_name = read_text(&meta, TYPE)?;
        let descriptor: TypeDesc = serde_json::from_str(&read_text(&meta, SERIALIZED_TYPE)?)
            .map_err(|e| Error::Metadata(format!("invalid serialized_type: {}", e)))?;
        let constant = read_flag(&meta, DIMENSIONS_ARE_CONSTANT)?;
        let dims = match read_entry(&meta, DIMENSIONS, DType::I64)? {
            Column::I64(v) => v
                .into_iter()
                .map(|d| {
                    usize::try_from(d)
                        .map_err(|_| Error::Metadata(format!("negative dimension {}", d)))
                })
                .collect::<Result<Vec<_>>>()?,
            _ => unreachable_dtype(DIMENSIONS)?,
        };
        let dimensions = (constant || !dims.is_empty()).then_some(dims);

        Ok(MetadataRecord {
            type_name,
            descriptor,
            dimensions,
            dimensions_are_constant: constant,
            portable: read_flag(&meta, PORTABLE)?,
            style_tag: read_text(&meta, STYLE)?,
            format_version,
        })
    }
}

fn read_entry(meta: &Group, name: &str, dtype: DType) -> Result<Column> {
    let column = meta.read_whole(name).map_err(|e| match e {
        StorageError::NotFound(_) => {
            Error::Metadata(format!("missing metadata entry {}/{}", meta.path(), name))
        }
        other => Error::Storage(other),
    })?;
    if column.dtype() != dtype {
        return Err(Error::Metadata(format!(
            "metadata entry {} is {}, expected {}",
            name,
            column.dtype(),
            dtype
        )));
    }
    Ok(column)
}

fn read_text(meta: &Group, name: &str) -> Result<String> {
    match read_entry(meta, name, DType::Utf8)? {
        Column::Utf8(v) => single(v, name),
        _ => unreachable_dtype(name),
    }
}

fn read_flag(meta: &Group, name: &str) -> Result<bool> {
    match read_entry(meta, name, DType::U8)? {
        Column::U8(v) => single(v, name).map(|x| x != 0),
        _ => unreachable_dtype(name),
    }
}

fn single<T>(values: Vec<T>, name: &str) -> Result<T> {
    let n = values.len();
    let mut iter = values.into_iter();
    match (iter.next(), n) {
        (Some(v), 1) => Ok(v),
        _ => Err(Error::Metadata(format!(
            "metadata entry {} has {} values, expected 1",
            name, n
        ))),
    }
}

fn unreachable_dtype<T>(name: &str) -> Result<T> {
    Err(Error::Metadata(format!("metadata entry {} has wrong type", name)))
}
