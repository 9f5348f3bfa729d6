//! Byte- and text-serialized vectors
//!
//! The universal fallback. Each element is serialized by an external codec
//! and appended to a byte store, while a parallel stop store records the
//! cumulative end offset of every element:
//!
//! ```text
//! <vector>/data/bytes   elemental u8   payloads back to back
//! <vector>/data/stops   elemental u64  stops[i] = end of element i
//! ```
//!
//! Element `i` spans `stops[i - 1]..stops[i]` (`0..stops[0]` for the first).
//!
//! Byte-serialized payloads are bincode, text-serialized payloads are UTF-8
//! JSON. Values that are already serialized (`Opaque` types) are stored
//! verbatim. Overwriting an element would shift every later range, so
//! `set` is rejected.

use chunkvec_core::{
    DType, Error, Result, SerialFormat, StorageStyle, TypeDesc, Value, VectorOptions,
};
use chunkvec_storage::Column;

use crate::codec::{check_index, StoredVector, StyleCodec, VectorContext};
use crate::elemental::ElementalVector;
use crate::metadata::DATA_NODE;
use crate::registry::VectorRegistry;

/// Name of the payload child
pub const BYTES_CHILD: &str = "bytes";

/// Name of the stop-offset child
pub const STOPS_CHILD: &str = "stops";

/// True if a logical type appears anywhere in `desc`
///
/// Logical types without a conversion have no defined encoding, so no
/// serialized fallback is offered for them.
fn mentions_logical(desc: &TypeDesc) -> bool {
    match desc {
        TypeDesc::Logical { .. } => true,
        TypeDesc::Tuple { elems } => elems.iter().any(mentions_logical),
        TypeDesc::Record { fields, .. } => fields.iter().any(|f| mentions_logical(&f.ty)),
        TypeDesc::FixedArray { elem, .. } | TypeDesc::Array { elem } => mentions_logical(elem),
        _ => false,
    }
}

/// First NaN or infinite float inside `value`
///
/// JSON has no spelling for these, so a text payload holding one could not
/// be read back.
fn non_finite(value: &Value) -> Option<f64> {
    match value {
        Value::F32(x) if !x.is_finite() => Some(f64::from(*x)),
        Value::F64(x) if !x.is_finite() => Some(*x),
        Value::Tuple(items) | Value::Array { items, .. } => items.iter().find_map(non_finite),
        Value::Record(fields) => fields.iter().find_map(|(_, v)| non_finite(v)),
        _ => None,
    }
}

/// Codec for [`StorageStyle::ByteSerialized`] and [`StorageStyle::TextSerialized`]
#[derive(Debug, Clone, Copy)]
pub struct SerializedCodec {
    format: SerialFormat,
}

impl SerializedCodec {
    /// Bincode payloads, accepts every type without logical parts
    pub fn bytes() -> Self {
        SerializedCodec {
            format: SerialFormat::Binary,
        }
    }

    /// JSON payloads, accepts JSON-opaque types
    pub fn text() -> Self {
        SerializedCodec {
            format: SerialFormat::Json,
        }
    }

    fn style(&self) -> StorageStyle {
        style_for(self.format)
    }
}

fn style_for(format: SerialFormat) -> StorageStyle {
    match format {
        SerialFormat::Binary => StorageStyle::ByteSerialized,
        SerialFormat::Json => StorageStyle::TextSerialized,
    }
}

impl StyleCodec for SerializedCodec {
    fn id(&self) -> &str {
        match self.format {
            SerialFormat::Binary => "bytes",
            SerialFormat::Json => "text",
        }
    }

    fn resolve(
        &self,
        desc: &TypeDesc,
        _options: &VectorOptions,
        _registry: &VectorRegistry,
    ) -> Result<Option<StorageStyle>> {
        let accepted = match self.format {
            SerialFormat::Binary => !mentions_logical(desc),
            SerialFormat::Json => matches!(
                desc,
                TypeDesc::Opaque {
                    format: SerialFormat::Json,
                    ..
                }
            ),
        };
        Ok(accepted.then(|| self.style()))
    }

    fn handles(&self, style: &StorageStyle) -> bool {
        *style == self.style()
    }

    fn create(
        &self,
        ctx: &VectorContext<'_>,
        _style: &StorageStyle,
    ) -> Result<Box<dyn StoredVector>> {
        let data = ctx.group().create_group(DATA_NODE)?;
        let chunk = ctx.options().chunk_size;
        Ok(Box::new(SerializedVector {
            format: self.format,
            desc: ctx.descriptor().clone(),
            bytes: ElementalVector::create_child(&data, BYTES_CHILD, DType::U8, chunk)?,
            stops: ElementalVector::create_child(&data, STOPS_CHILD, DType::U64, chunk)?,
            end: 0,
        }))
    }

    fn load(&self, ctx: &VectorContext<'_>, _style: &StorageStyle) -> Result<Box<dyn StoredVector>> {
        let data = ctx.group().group(DATA_NODE)?;
        let bytes = ElementalVector::load_child(&data, BYTES_CHILD, DType::U8)?;
        let stops = ElementalVector::load_child(&data, STOPS_CHILD, DType::U64)?;
        let end = match stops.len() {
            0 => 0,
            n => last_stop(&stops.read_range(n - 1..n)?)?,
        };
        Ok(Box::new(SerializedVector {
            format: self.format,
            desc: ctx.descriptor().clone(),
            bytes,
            stops,
            end,
        }))
    }
}

fn stops_of(column: Column) -> Result<Vec<u64>> {
    match column {
        Column::U64(v) => Ok(v),
        other => Err(Error::type_mismatch("u64 stops", other.dtype().name())),
    }
}

fn bytes_of(column: Column) -> Result<Vec<u8>> {
    match column {
        Column::U8(v) => Ok(v),
        other => Err(Error::type_mismatch("u8 payload", other.dtype().name())),
    }
}

fn last_stop(column: &Column) -> Result<u64> {
    match column {
        Column::U64(v) => v
            .last()
            .copied()
            .ok_or_else(|| Error::Metadata("empty stop range".to_string())),
        other => Err(Error::type_mismatch("u64 stops", other.dtype().name())),
    }
}

fn offset(stop: u64) -> Result<usize> {
    usize::try_from(stop).map_err(|_| Error::Metadata(format!("stop offset {} too large", stop)))
}

/// Serialized payloads plus cumulative stop offsets
#[derive(Debug)]
pub struct SerializedVector {
    format: SerialFormat,
    desc: TypeDesc,
    bytes: ElementalVector,
    stops: ElementalVector,
    /// Cached last stop (total payload bytes)
    end: u64,
}

impl SerializedVector {
    fn encode(&self, value: Value) -> Result<Vec<u8>> {
        match (&self.desc, value) {
            (TypeDesc::Opaque { .. }, Value::Blob(raw)) => Ok(raw),
            (TypeDesc::Opaque { .. }, Value::Text(text)) => Ok(text.into_bytes()),
            (_, value) => match self.format {
                SerialFormat::Binary => Ok(bincode::serialize(&value)?),
                SerialFormat::Json => match non_finite(&value) {
                    Some(x) => Err(Error::Serialization(format!(
                        "{} has no JSON representation",
                        x
                    ))),
                    None => Ok(serde_json::to_vec(&value)?),
                },
            },
        }
    }

    fn decode(&self, payload: &[u8]) -> Result<Value> {
        match &self.desc {
            TypeDesc::Opaque {
                format: SerialFormat::Binary,
                ..
            } => Ok(Value::Blob(payload.to_vec())),
            TypeDesc::Opaque {
                format: SerialFormat::Json,
                ..
            } => String::from_utf8(payload.to_vec())
                .map(Value::Text)
                .map_err(|e| Error::Serialization(e.to_string())),
            _ => match self.format {
                SerialFormat::Binary => Ok(bincode::deserialize(payload)?),
                SerialFormat::Json => Ok(serde_json::from_slice(payload)?),
            },
        }
    }

    /// Append payloads with one write per child; bytes go first
    fn append(&mut self, payloads: Vec<Vec<u8>>) -> Result<()> {
        let mut bytes = Vec::with_capacity(payloads.iter().map(Vec::len).sum());
        let mut stops = Vec::with_capacity(payloads.len());
        let mut end = self.end;
        for payload in payloads {
            end += payload.len() as u64;
            bytes.extend_from_slice(&payload);
            stops.push(end);
        }
        self.bytes.append_column(&Column::U8(bytes))?;
        self.stops.append_column(&Column::U64(stops))?;
        self.end = end;
        Ok(())
    }
}

impl StoredVector for SerializedVector {
    fn len(&self) -> usize {
        self.stops.len()
    }

    fn push(&mut self, value: Value) -> Result<()> {
        let payload = self.encode(value)?;
        self.append(vec![payload])
    }

    fn push_many(&mut self, values: Vec<Value>) -> Result<()> {
        let payloads = values
            .into_iter()
            .map(|v| self.encode(v))
            .collect::<Result<Vec<_>>>()?;
        self.append(payloads)
    }

    fn get(&self, index: usize) -> Result<Value> {
        check_index(index, self.len())?;
        let (start, end) = if index == 0 {
            (0, last_stop(&self.stops.read_range(0..1)?)?)
        } else {
            let pair = stops_of(self.stops.read_range(index - 1..index + 1)?)?;
            match pair.as_slice() {
                [start, end] => (*start, *end),
                _ => return Err(Error::Metadata("short stop range".to_string())),
            }
        };
        let (start, end) = (offset(start)?, offset(end)?);
        if start > end || end > self.bytes.len() {
            return Err(Error::Metadata(format!(
                "stop range {}..{} outside payload of {} bytes",
                start,
                end,
                self.bytes.len()
            )));
        }
        let payload = bytes_of(self.bytes.read_range(start..end)?)?;
        self.decode(&payload)
    }

    fn set(&mut self, _index: usize, _value: Value) -> Result<()> {
        Err(Error::UnsupportedOperation {
            operation: "set",
            style: style_for(self.format).family().to_string(),
        })
    }

    /// Two bulk reads, then every element decoded from memory
    fn collect(&self) -> Result<Vec<Value>> {
        let stops = stops_of(self.stops.read_all()?)?;
        let bytes = bytes_of(self.bytes.read_all()?)?;
        let mut out = Vec::with_capacity(stops.len());
        let mut start = 0;
        for stop in stops {
            let end = offset(stop)?;
            let payload = bytes.get(start..end).ok_or_else(|| {
                Error::Metadata(format!(
                    "stop range {}..{} outside payload of {} bytes",
                    start,
                    end,
                    bytes.len()
                ))
            })?;
            out.push(self.decode(payload)?);
            start = end;
        }
        Ok(out)
    }
}
