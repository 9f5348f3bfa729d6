//! Extension points: user logical conversions and plugin style codecs

use std::collections::HashMap;
use std::sync::Arc;

use crate::common::*;
use chunkvec::{
    check_index, load, DType, DynVector, Error, FnConversion, Result, StorageStyle,
    StoredVector, StyleCodec, StyleOverride, TypeDesc, Value, VectorContext, VectorOptions,
    VectorRegistry,
};
use proptest::prelude::*;

// =============================================================================
// Logical type: Version(major, minor) stored as u32
// =============================================================================

fn version_desc() -> TypeDesc {
    TypeDesc::logical("Version", DType::U32)
}

fn version(major: u16, minor: u16) -> Value {
    Value::Tuple(vec![Value::U16(major), Value::U16(minor)])
}

fn version_conversion() -> FnConversion {
    FnConversion::new(
        DType::U32,
        |value| match value {
            Value::Tuple(parts) => match parts.as_slice() {
                [Value::U16(major), Value::U16(minor)] => {
                    Ok(Value::U32(((*major as u32) << 16) | *minor as u32))
                }
                _ => Err(Error::type_mismatch("Version", "tuple")),
            },
            other => Err(Error::type_mismatch("Version", other.kind_name())),
        },
        |value| match value {
            Value::U32(packed) => Ok(version((packed >> 16) as u16, packed as u16)),
            other => Err(Error::type_mismatch("u32", other.kind_name())),
        },
    )
}

fn version_registry() -> VectorRegistry {
    VectorRegistry::standard().with_conversion("Version", Arc::new(version_conversion()))
}

#[test]
fn logical_type_is_elemental_with_its_conversion() {
    let root = memory_root();
    let registry = version_registry();
    let mut v = registry
        .create(&root, "versions", &version_desc(), &VectorOptions::default())
        .unwrap();
    assert_eq!(v.style(), &StorageStyle::Elemental(DType::U32));
    v.push_many(vec![version(1, 2), version(65535, 0)]).unwrap();
    assert!(v.push(Value::Str("1.2".into())).is_err());

    let raw = root
        .group("versions")
        .unwrap()
        .dataset("data")
        .unwrap()
        .read_all()
        .unwrap()
        .into_values();
    assert_eq!(raw, vec![Value::U32(0x0001_0002), Value::U32(0xFFFF_0000)]);

    let group = root.group("versions").unwrap();
    assert!(matches!(load(&group), Err(Error::Resolution { .. })));
    assert_eq!(
        registry.load(&group).unwrap().collect().unwrap(),
        vec![version(1, 2), version(65535, 0)]
    );
}

#[test]
fn logical_type_inside_arrays_and_records() {
    let root = memory_root();
    let registry = version_registry();

    let pair = TypeDesc::fixed_array(version_desc(), vec![2]);
    let mut arrays = registry
        .create(&root, "pairs", &pair, &VectorOptions::default())
        .unwrap();
    assert_eq!(
        arrays.style(),
        &StorageStyle::ArrayLike {
            dtype: DType::U32,
            dims: vec![2]
        }
    );
    let value = Value::list(vec![version(0, 1), version(2, 3)]);
    arrays.push(value.clone()).unwrap();
    assert_eq!(arrays.get(0).unwrap(), value);

    let release = TypeDesc::record(
        "Release",
        [
            ("name", TypeDesc::native(DType::Utf8)),
            ("version", version_desc()),
        ],
    );
    let entry = Value::record([
        ("name", Value::Str("lts".into())),
        ("version", version(4, 2)),
    ]);
    let mut releases = registry
        .copy_into(&root, "releases", &release, vec![entry.clone()], &VectorOptions::default())
        .unwrap();
    releases.set(0, entry.clone()).unwrap();
    let again = registry.load(&root.group("releases").unwrap()).unwrap();
    assert_eq!(again.collect().unwrap(), vec![entry]);
}

proptest! {
    #[test]
    fn version_conversion_is_invertible(major in any::<u16>(), minor in any::<u16>()) {
        use chunkvec::NativeConversion;
        let conversion = version_conversion();
        let desc = version_desc();
        let native = conversion.to_native(&desc, version(major, minor)).unwrap();
        prop_assert_eq!(conversion.from_native(&desc, native).unwrap(), version(major, minor));
    }
}

// =============================================================================
// Plugin codec: interned symbols
// =============================================================================

/// Stores `Symbol` strings once in a pool and each element as a pool index
struct SymbolCodec;

fn is_symbol(desc: &TypeDesc) -> bool {
    matches!(desc, TypeDesc::Logical { name, .. } if name == "Symbol")
}

impl StyleCodec for SymbolCodec {
    fn id(&self) -> &str {
        "symbol"
    }

    fn resolve(
        &self,
        desc: &TypeDesc,
        _options: &VectorOptions,
        _registry: &VectorRegistry,
    ) -> Result<Option<StorageStyle>> {
        Ok(is_symbol(desc).then(|| StorageStyle::Custom("symbol".into())))
    }

    fn handles(&self, style: &StorageStyle) -> bool {
        matches!(style, StorageStyle::Custom(id) if id == "symbol")
    }

    fn create(&self, ctx: &VectorContext<'_>, _style: &StorageStyle) -> Result<Box<dyn StoredVector>> {
        let data = ctx.group().create_group("data")?;
        let registry = ctx.registry();
        Ok(Box::new(SymbolVector {
            pool: registry.create(&data, "pool", &TypeDesc::native(DType::Utf8), ctx.options())?,
            codes: registry.create(&data, "codes", &TypeDesc::native(DType::U32), ctx.options())?,
            index: HashMap::new(),
            symbols: Vec::new(),
        }))
    }

    fn load(&self, ctx: &VectorContext<'_>, _style: &StorageStyle) -> Result<Box<dyn StoredVector>> {
        let data = ctx.group().group("data")?;
        let pool = ctx.registry().load(&data.group("pool")?)?;
        let codes = ctx.registry().load(&data.group("codes")?)?;
        let symbols: Vec<String> = pool
            .collect()?
            .into_iter()
            .map(|v| match v {
                Value::Str(s) => Ok(s),
                other => Err(Error::type_mismatch("String", other.kind_name())),
            })
            .collect::<Result<_>>()?;
        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as u32))
            .collect();
        Ok(Box::new(SymbolVector {
            pool,
            codes,
            index,
            symbols,
        }))
    }
}

struct SymbolVector {
    pool: DynVector,
    codes: DynVector,
    index: HashMap<String, u32>,
    symbols: Vec<String>,
}

impl SymbolVector {
    fn intern(&mut self, value: Value) -> Result<Value> {
        let s = match value {
            Value::Str(s) => s,
            other => return Err(Error::type_mismatch("Symbol", other.kind_name())),
        };
        if let Some(code) = self.index.get(&s) {
            return Ok(Value::U32(*code));
        }
        let code = self.symbols.len() as u32;
        self.pool.push(Value::Str(s.clone()))?;
        self.index.insert(s.clone(), code);
        self.symbols.push(s);
        Ok(Value::U32(code))
    }

    fn resolve(&self, code: Value) -> Result<Value> {
        match code {
            Value::U32(c) => self
                .symbols
                .get(c as usize)
                .map(|s| Value::Str(s.clone()))
                .ok_or_else(|| Error::Metadata(format!("dangling symbol code {}", c))),
            other => Err(Error::type_mismatch("u32", other.kind_name())),
        }
    }
}

impl StoredVector for SymbolVector {
    fn len(&self) -> usize {
        self.codes.len()
    }

    fn push(&mut self, value: Value) -> Result<()> {
        let code = self.intern(value)?;
        self.codes.push(code)
    }

    fn get(&self, index: usize) -> Result<Value> {
        self.resolve(self.codes.get(index)?)
    }

    fn set(&mut self, index: usize, value: Value) -> Result<()> {
        check_index(index, self.len())?;
        let code = self.intern(value)?;
        self.codes.set(index, code)
    }

    fn collect(&self) -> Result<Vec<Value>> {
        self.codes
            .collect()?
            .into_iter()
            .map(|c| self.resolve(c))
            .collect()
    }
}

fn symbol_desc() -> TypeDesc {
    TypeDesc::logical("Symbol", DType::U32)
}

fn sym(s: &str) -> Value {
    Value::Str(s.to_string())
}

#[test]
fn plugin_codec_builds_custom_style() {
    let root = memory_root();
    let registry = VectorRegistry::standard().with_codec(Arc::new(SymbolCodec));
    assert!(matches!(
        VectorRegistry::standard().resolve(&symbol_desc(), &VectorOptions::default()),
        Err(Error::Resolution { .. })
    ));

    let mut v = registry
        .create(&root, "kinds", &symbol_desc(), &VectorOptions::default())
        .unwrap();
    assert_eq!(v.style(), &StorageStyle::Custom("symbol".into()));
    v.push_many(vec![sym("ion"), sym("atom"), sym("ion")]).unwrap();
    v.set(1, sym("ion")).unwrap();

    let data = root.group("kinds").unwrap().group("data").unwrap();
    assert_eq!(load(&data.group("pool").unwrap()).unwrap().len(), 2);

    let again = registry.load(&root.group("kinds").unwrap()).unwrap();
    assert_eq!(again.collect().unwrap(), vec![sym("ion"); 3]);
    assert!(matches!(
        load(&root.group("kinds").unwrap()),
        Err(Error::Resolution { .. })
    ));
}

#[test]
fn plugin_codec_applies_to_record_fields() {
    let root = memory_root();
    let registry = VectorRegistry::standard().with_codec(Arc::new(SymbolCodec));
    let event = TypeDesc::record(
        "Event",
        [("kind", symbol_desc()), ("at", TypeDesc::native(DType::F64))],
    );
    let e = |k: &str, at: f64| Value::record([("kind", sym(k)), ("at", Value::F64(at))]);
    let v = registry
        .copy_into(
            &root,
            "events",
            &event,
            vec![e("start", 0.0), e("stop", 1.5), e("start", 2.0)],
            &VectorOptions::default(),
        )
        .unwrap();
    assert_eq!(v.get(2).unwrap(), e("start", 2.0));

    let kind = root
        .group("events")
        .unwrap()
        .group("data")
        .unwrap()
        .group("kind")
        .unwrap();
    assert_eq!(
        registry.load(&kind).unwrap().style(),
        &StorageStyle::Custom("symbol".into())
    );
}

// =============================================================================
// Style overrides
// =============================================================================

#[test]
fn author_override_serializes_a_record() {
    let root = memory_root();
    let registry = VectorRegistry::standard().with_override("AB", StyleOverride::Serialized);
    let mut v = registry
        .create(&root, "ab", &ab(), &VectorOptions::default())
        .unwrap();
    assert_eq!(v.style(), &StorageStyle::ByteSerialized);
    v.push(ab_value(1, 1.0)).unwrap();
    assert!(v.set(0, ab_value(2, 2.0)).is_err());

    let group = root.group("ab").unwrap();
    assert!(matches!(load(&group), Err(Error::Metadata(_))));
    assert_eq!(registry.load(&group).unwrap().collect().unwrap(), vec![ab_value(1, 1.0)]);
}

#[test]
fn json_override_rejects_non_finite_floats() {
    let root = memory_root();
    let desc = TypeDesc::record("Reading", [("x", TypeDesc::native(DType::F64))]);
    let reading = |x: f64| Value::record([("x", Value::F64(x))]);
    let registry = VectorRegistry::standard()
        .with_json()
        .with_override("Reading", StyleOverride::Json);
    let mut v = registry
        .create(&root, "readings", &desc, &VectorOptions::default())
        .unwrap();
    assert_eq!(v.style(), &StorageStyle::TextSerialized);

    v.push(reading(1.0)).unwrap();
    for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
        assert!(matches!(v.push(reading(bad)), Err(Error::Serialization(_))));
    }
    assert!(v.push_many(vec![reading(2.0), reading(f64::NAN)]).is_err());
    assert_eq!(v.len(), 1);
    assert_eq!(v.collect().unwrap(), vec![reading(1.0)]);

    let again = registry.load(&root.group("readings").unwrap()).unwrap();
    assert_eq!(again.collect().unwrap(), vec![reading(1.0)]);
}
