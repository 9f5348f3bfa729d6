//! Property tests: round-trip, field order, resolver determinism

use crate::common::*;
use chunkvec::{
    copy_into, create, load, DType, StorageStyle, StyleOverride, TypeDesc, Value, VectorOptions,
    VectorRegistry,
};
use proptest::prelude::*;

fn arb_ab() -> impl Strategy<Value = Value> {
    (any::<i64>(), -1e9f64..1e9).prop_map(|(a, b)| ab_value(a, b))
}

fn arb_tags() -> impl Strategy<Value = Value> {
    prop::collection::vec("[a-z]{0,6}", 0..4).prop_map(|items| {
        Value::list(items.into_iter().map(Value::Str).collect())
    })
}

/// Dimensions plus a batch of i32 blocks of that shape
fn arb_blocks() -> impl Strategy<Value = (Vec<usize>, Vec<Value>)> {
    prop::collection::vec(1usize..4, 1..3).prop_flat_map(|dims| {
        let stride: usize = dims.iter().product();
        let shape = dims.clone();
        let blocks = prop::collection::vec(prop::collection::vec(any::<i32>(), stride), 0..12)
            .prop_map(move |rows| {
                rows.into_iter()
                    .map(|row| Value::Array {
                        shape: shape.clone(),
                        items: row.into_iter().map(Value::I32).collect(),
                    })
                    .collect::<Vec<_>>()
            });
        (Just(dims), blocks)
    })
}

/// `{name: str, score: f64, tags: [str]}`, stored as JSON through an override
fn scored() -> TypeDesc {
    TypeDesc::record(
        "Scored",
        [
            ("name", TypeDesc::native(DType::Utf8)),
            ("score", TypeDesc::native(DType::F64)),
            ("tags", tags()),
        ],
    )
}

fn arb_scored() -> impl Strategy<Value = Value> {
    (
        "\\PC{0,8}",
        -1_000_000i32..1_000_000,
        prop::collection::vec("[a-z]{0,4}", 0..3),
    )
        .prop_map(|(name, score, labels)| {
            Value::record([
                ("name", Value::Str(name)),
                ("score", Value::F64(f64::from(score) / 8.0)),
                (
                    "tags",
                    Value::list(labels.into_iter().map(Value::Str).collect()),
                ),
            ])
        })
}

fn arb_desc() -> impl Strategy<Value = TypeDesc> {
    let leaf = prop_oneof![
        Just(TypeDesc::native(DType::I32)),
        Just(TypeDesc::native(DType::F64)),
        Just(TypeDesc::native(DType::Utf8)),
        Just(TypeDesc::Bool),
        Just(TypeDesc::Char),
        Just(TypeDesc::enumeration("E", ["A", "B"])),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..3).prop_map(TypeDesc::tuple),
            (inner.clone(), 1usize..4).prop_map(|(e, n)| TypeDesc::fixed_array(e, vec![n])),
            inner.clone().prop_map(TypeDesc::array),
            prop::collection::vec(inner, 1..3).prop_map(|tys| {
                TypeDesc::record(
                    "R",
                    tys.into_iter()
                        .enumerate()
                        .map(|(i, t)| (format!("f{}", i), t)),
                )
            }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn elemental_round_trip(xs in prop::collection::vec(any::<i64>(), 0..50)) {
        let root = memory_root();
        let values: Vec<Value> = xs.into_iter().map(Value::I64).collect();
        let v = copy_into(&root, "v", &TypeDesc::native(DType::I64), values.clone(), &VectorOptions::default()).unwrap();
        prop_assert_eq!(v.collect().unwrap(), values);
    }

    #[test]
    fn composite_field_order(values in prop::collection::vec(arb_ab(), 0..20)) {
        let root = memory_root();
        let v = copy_into(&root, "ab", &ab(), values.clone(), &VectorOptions::default()).unwrap();
        prop_assert_eq!(v.collect().unwrap(), values.clone());
        for (i, value) in values.iter().enumerate() {
            prop_assert_eq!(&v.get(i).unwrap(), value);
        }
    }

    #[test]
    fn serialized_round_trip_and_append(values in prop::collection::vec(arb_tags(), 0..20)) {
        let root = memory_root();
        copy_into(&root, "t", &tags(), values.clone(), &VectorOptions::default()).unwrap();
        let mut again = load(&root.group("t").unwrap()).unwrap();
        prop_assert_eq!(again.collect().unwrap(), values.clone());
        again.push_many(values.clone()).unwrap();
        let doubled: Vec<Value> = values.iter().chain(values.iter()).cloned().collect();
        prop_assert_eq!(again.collect().unwrap(), doubled);
    }

    #[test]
    fn array_like_round_trip((dims, values) in arb_blocks(), declared in any::<bool>()) {
        let root = memory_root();
        let elem = TypeDesc::native(DType::I32);
        let (desc, options) = if declared {
            (TypeDesc::fixed_array(elem, dims.clone()), VectorOptions::default())
        } else {
            (
                TypeDesc::array(elem),
                VectorOptions::default().with_fixed_dims(dims.clone()),
            )
        };
        let v = copy_into(&root, "blocks", &desc, values.clone(), &options).unwrap();
        prop_assert_eq!(
            v.style(),
            &StorageStyle::ArrayLike { dtype: DType::I32, dims: dims.clone() }
        );
        prop_assert_eq!(v.collect().unwrap(), values.clone());

        let mut again = load(&root.group("blocks").unwrap()).unwrap();
        prop_assert_eq!(again.collect().unwrap(), values.clone());
        again.push_many(values.clone()).unwrap();
        let doubled: Vec<Value> = values.iter().chain(values.iter()).cloned().collect();
        prop_assert_eq!(again.collect().unwrap(), doubled);
    }

    #[test]
    fn text_serialized_round_trip(values in prop::collection::vec(arb_scored(), 0..16)) {
        let registry = VectorRegistry::standard()
            .with_json()
            .with_override("Scored", StyleOverride::Json);
        let root = memory_root();
        let v = registry
            .copy_into(&root, "scored", &scored(), values.clone(), &VectorOptions::default())
            .unwrap();
        prop_assert_eq!(v.style(), &StorageStyle::TextSerialized);
        prop_assert_eq!(v.collect().unwrap(), values.clone());
        for (i, value) in values.iter().enumerate() {
            prop_assert_eq!(&v.get(i).unwrap(), value);
        }

        let again = registry.load(&root.group("scored").unwrap()).unwrap();
        prop_assert_eq!(again.collect().unwrap(), values);
    }

    #[test]
    fn resolver_is_deterministic(desc in arb_desc(), other in arb_desc(), portable in any::<bool>()) {
        let registry = VectorRegistry::standard();
        let options = VectorOptions::default().with_portable(portable);
        let first = registry.resolve(&desc, &options).unwrap();
        let _ = registry.resolve(&other, &options);
        prop_assert_eq!(registry.resolve(&desc, &options).unwrap(), first.clone());

        let root = memory_root();
        create(&root, "v", &desc, &options).unwrap();
        let loaded = load(&root.group("v").unwrap()).unwrap();
        prop_assert_eq!(loaded.style(), &first);
    }
}

#[test]
fn length_one_arrays_resolve_like_longer_ones() {
    let registry = VectorRegistry::standard();
    let opts = VectorOptions::default();
    for n in [1, 2, 7] {
        let desc = TypeDesc::fixed_array(TypeDesc::native(DType::I8), vec![n]);
        assert_eq!(
            registry.resolve(&desc, &opts).unwrap(),
            StorageStyle::ArrayLike {
                dtype: DType::I8,
                dims: vec![n]
            }
        );
    }
}
