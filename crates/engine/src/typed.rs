//! Typed vectors
//!
//! [`Storable`] ties a Rust type to its [`TypeDesc`] and to a pair of
//! conversions to and from [`Value`]. [`Vector<T>`] wraps a [`DynVector`]
//! and converts at the boundary, so callers push and read plain Rust values.
//!
//! Records are not discovered by reflection. A record type implements
//! `Storable` by hand, decomposing itself with [`RecordBuilder`] and
//! reassembling itself from a field-ordered [`RecordReader`]:
//!
//! ```rust,ignore
//! impl Storable for Particle {
//!     fn descriptor() -> TypeDesc {
//!         TypeDesc::record("Particle", [("id", u32::descriptor()), ("mass", f64::descriptor())])
//!     }
//!     fn into_value(self) -> Result<Value> {
//!         RecordBuilder::new().field("id", self.id)?.field("mass", self.mass).map(RecordBuilder::build)
//!     }
//!     fn from_value(value: Value) -> Result<Self> {
//!         let mut r = RecordReader::new(value)?;
//!         Ok(Particle { id: r.field("id")?, mass: r.field("mass")? })
//!     }
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use chunkvec_core::{DType, Error, Result, SerialFormat, TypeDesc, Value, VectorOptions};
use chunkvec_storage::Group;

use crate::iter::{BulkSource, Iterable};
use crate::registry::{standard_registry, VectorRegistry};
use crate::vector::DynVector;

/// A Rust type that can be stored in a vector
pub trait Storable: Sized {
    /// Type descriptor shared by every value of the type
    fn descriptor() -> TypeDesc;

    /// Convert into the dynamic value model
    fn into_value(self) -> Result<Value>;

    /// Convert back from the dynamic value model
    fn from_value(value: Value) -> Result<Self>;
}

// =============================================================================
// Scalars
// =============================================================================

macro_rules! impl_storable_native {
    ($($ty:ty => $variant:ident, $dtype:ident);* $(;)?) => {
        $(
            impl Storable for $ty {
                fn descriptor() -> TypeDesc {
                    TypeDesc::native(DType::$dtype)
                }

                fn into_value(self) -> Result<Value> {
                    Ok(Value::$variant(self))
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(Error::type_mismatch(
                            stringify!($ty),
                            other.kind_name(),
                        )),
                    }
                }
            }
        )*
    };
}

impl_storable_native! {
    i8 => I8, I8;
    i16 => I16, I16;
    i32 => I32, I32;
    i64 => I64, I64;
    u8 => U8, U8;
    u16 => U16, U16;
    u32 => U32, U32;
    u64 => U64, U64;
    f32 => F32, F32;
    f64 => F64, F64;
    String => Str, Utf8;
}

impl Storable for bool {
    fn descriptor() -> TypeDesc {
        TypeDesc::Bool
    }

    fn into_value(self) -> Result<Value> {
        Ok(Value::Bool(self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(Error::type_mismatch("bool", other.kind_name())),
        }
    }
}

impl Storable for char {
    fn descriptor() -> TypeDesc {
        TypeDesc::Char
    }

    fn into_value(self) -> Result<Value> {
        Ok(Value::Char(self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(c) => Ok(c),
            other => Err(Error::type_mismatch("char", other.kind_name())),
        }
    }
}

// =============================================================================
// Tuples and arrays
// =============================================================================

macro_rules! impl_storable_tuple {
    ($len:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: Storable),+> Storable for ($($name,)+) {
            fn descriptor() -> TypeDesc {
                TypeDesc::tuple(vec![$($name::descriptor()),+])
            }

            fn into_value(self) -> Result<Value> {
                Ok(Value::Tuple(vec![$(self.$idx.into_value()?),+]))
            }

            fn from_value(value: Value) -> Result<Self> {
                let mismatch = |actual: &str| {
                    Error::type_mismatch(Self::descriptor().type_name(), actual)
                };
                let mut items = match value {
                    Value::Tuple(items) if items.len() == $len => items.into_iter(),
                    other => return Err(mismatch(other.kind_name())),
                };
                Ok(($(
                    $name::from_value(items.next().ok_or_else(|| mismatch("short tuple"))?)?,
                )+))
            }
        }
    };
}

impl_storable_tuple!(1; A 0);
impl_storable_tuple!(2; A 0, B 1);
impl_storable_tuple!(3; A 0, B 1, C 2);
impl_storable_tuple!(4; A 0, B 1, C 2, D 3);
impl_storable_tuple!(5; A 0, B 1, C 2, D 3, E 4);
impl_storable_tuple!(6; A 0, B 1, C 2, D 3, E 4, F 5);

fn array_items(value: Value, expected: &TypeDesc) -> Result<Vec<Value>> {
    match value {
        Value::Array { items, .. } => Ok(items),
        other => Err(Error::type_mismatch(expected.type_name(), other.kind_name())),
    }
}

impl<T: Storable, const N: usize> Storable for [T; N] {
    fn descriptor() -> TypeDesc {
        TypeDesc::fixed_array(T::descriptor(), vec![N])
    }

    fn into_value(self) -> Result<Value> {
        let items = self
            .into_iter()
            .map(Storable::into_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::list(items))
    }

    fn from_value(value: Value) -> Result<Self> {
        let items = array_items(value, &Self::descriptor())?
            .into_iter()
            .map(T::from_value)
            .collect::<Result<Vec<T>>>()?;
        let n = items.len();
        items
            .try_into()
            .map_err(|_| Error::DimensionMismatch {
                expected: vec![N],
                actual: vec![n],
            })
    }
}

impl<T: Storable> Storable for Vec<T> {
    fn descriptor() -> TypeDesc {
        TypeDesc::array(T::descriptor())
    }

    fn into_value(self) -> Result<Value> {
        let items = self
            .into_iter()
            .map(Storable::into_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::list(items))
    }

    fn from_value(value: Value) -> Result<Self> {
        array_items(value, &Self::descriptor())?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

// =============================================================================
// Serialized opt-outs
// =============================================================================

/// Store `T` as an opaque bincode payload, whatever its shape
///
/// The persisted type name is `std::any::type_name::<T>()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Serialized<T>(pub T);

impl<T: Serialize + DeserializeOwned> Storable for Serialized<T> {
    fn descriptor() -> TypeDesc {
        TypeDesc::opaque(std::any::type_name::<T>(), SerialFormat::Binary)
    }

    fn into_value(self) -> Result<Value> {
        Ok(Value::Blob(bincode::serialize(&self.0)?))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(raw) => Ok(Serialized(bincode::deserialize(&raw)?)),
            other => Err(Error::type_mismatch("blob", other.kind_name())),
        }
    }
}

/// Store `T` as JSON text
///
/// Text-serialized when the registry has the JSON codec, byte-serialized
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize + DeserializeOwned> Storable for Json<T> {
    fn descriptor() -> TypeDesc {
        TypeDesc::opaque(std::any::type_name::<T>(), SerialFormat::Json)
    }

    fn into_value(self) -> Result<Value> {
        Ok(Value::Text(serde_json::to_string(&self.0)?))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(text) => Ok(Json(serde_json::from_str(&text)?)),
            other => Err(Error::type_mismatch("text", other.kind_name())),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Decomposes a record into field-ordered values
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: Vec<(String, Value)>,
}

impl RecordBuilder {
    /// Empty record
    pub fn new() -> Self {
        RecordBuilder::default()
    }

    /// Append field `name`
    ///
    /// Fields must be added in declaration order.
    pub fn field<T: Storable>(mut self, name: &str, value: T) -> Result<Self> {
        self.fields.push((name.to_string(), value.into_value()?));
        Ok(self)
    }

    /// The record value
    pub fn build(self) -> Value {
        Value::Record(self.fields)
    }
}

/// Reads a record's fields back in declaration order
#[derive(Debug)]
pub struct RecordReader {
    fields: std::vec::IntoIter<(String, Value)>,
}

impl RecordReader {
    /// Reader over a record value
    pub fn new(value: Value) -> Result<Self> {
        match value {
            Value::Record(fields) => Ok(RecordReader {
                fields: fields.into_iter(),
            }),
            other => Err(Error::type_mismatch("record", other.kind_name())),
        }
    }

    /// Next field, which must be called `name`
    pub fn field<T: Storable>(&mut self, name: &str) -> Result<T> {
        match self.fields.next() {
            Some((found, value)) if found == name => T::from_value(value),
            Some((found, _)) => Err(Error::type_mismatch(
                format!("field {}", name),
                format!("field {}", found),
            )),
            None => Err(Error::type_mismatch(format!("field {}", name), "end of record")),
        }
    }
}

// =============================================================================
// Vector<T>
// =============================================================================

/// Persistent growable vector of `T`
pub struct Vector<T> {
    inner: DynVector,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Storable> Vector<T> {
    fn wrap(inner: DynVector) -> Self {
        Vector {
            inner,
            _marker: PhantomData,
        }
    }

    /// Create an empty vector `name` under `parent` with default options
    pub fn create(parent: &Group, name: &str) -> Result<Self> {
        Self::create_with(standard_registry(), parent, name, &VectorOptions::default())
    }

    /// Create an empty vector with an explicit registry and options
    pub fn create_with(
        registry: &VectorRegistry,
        parent: &Group,
        name: &str,
        options: &VectorOptions,
    ) -> Result<Self> {
        registry
            .create(parent, name, &T::descriptor(), options)
            .map(Self::wrap)
    }

    /// Reopen the vector stored at `group`
    pub fn load(group: &Group) -> Result<Self> {
        Self::load_with(standard_registry(), group)
    }

    /// Reopen the vector stored at `group` through `registry`
    pub fn load_with(registry: &VectorRegistry, group: &Group) -> Result<Self> {
        registry.load_as(group, &T::descriptor()).map(Self::wrap)
    }

    /// Create a vector holding every item of `items`
    pub fn copy_into<I>(parent: &Group, name: &str, items: I, options: &VectorOptions) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut vector = Self::create_with(standard_registry(), parent, name, options)?;
        vector.extend(items)?;
        Ok(vector)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if the vector holds no elements
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Append a value
    pub fn push(&mut self, value: T) -> Result<()> {
        self.inner.push(value.into_value()?)
    }

    /// Append every item, with one bulk write per underlying dataset
    pub fn extend<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let values = items
            .into_iter()
            .map(Storable::into_value)
            .collect::<Result<Vec<_>>>()?;
        self.inner.push_many(values)
    }

    /// Value at 0-based `index`
    pub fn get(&self, index: usize) -> Result<T> {
        T::from_value(self.inner.get(index)?)
    }

    /// Overwrite the value at 0-based `index`
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.inner.set(index, value.into_value()?)
    }

    /// Every value, read in bulk
    pub fn collect(&self) -> Result<Vec<T>> {
        self.inner
            .collect()?
            .into_iter()
            .map(T::from_value)
            .collect()
    }

    /// Lazy point-in-time view of every value
    pub fn iterable(&self) -> Iterable<'_, T> {
        crate::iter::iterable(self)
    }

    /// The untyped handle
    pub fn as_dyn(&self) -> &DynVector {
        &self.inner
    }

    /// Unwrap into the untyped handle
    pub fn into_dyn(self) -> DynVector {
        self.inner
    }
}

impl<T: Storable> BulkSource for Vector<T> {
    type Item = T;

    fn collect_all(&self) -> Result<Vec<T>> {
        self.collect()
    }
}

impl<T> fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Vector").field(&self.inner).finish()
    }
}
