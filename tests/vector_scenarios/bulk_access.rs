//! Positional reads agree with bulk reads, for every style

use crate::common::*;
use chunkvec::{copy_into, iterable, DType, DynVector, Group, TypeDesc, Value, VectorOptions};

fn assert_get_matches_collect(v: &DynVector) {
    let all = v.collect().unwrap();
    assert_eq!(all.len(), v.len());
    for (i, expected) in all.iter().enumerate() {
        assert_eq!(&v.get(i).unwrap(), expected, "index {} of {}", i, v.name());
    }
    assert!(v.get(all.len()).is_err());
}

fn fill(root: &Group) -> Vec<DynVector> {
    let opts = VectorOptions::default().with_chunk_size(3);
    vec![
        copy_into(
            root,
            "u64",
            &TypeDesc::native(DType::U64),
            (0..10u64).map(|i| Value::U64(i * i)).collect(),
            &opts,
        )
        .unwrap(),
        copy_into(
            root,
            "flags",
            &TypeDesc::Bool,
            (0..7).map(|i| Value::Bool(i % 3 == 0)).collect(),
            &opts,
        )
        .unwrap(),
        copy_into(
            root,
            "rgb",
            &TypeDesc::fixed_array(TypeDesc::native(DType::U8), vec![3]),
            (0..5u8)
                .map(|i| Value::list(vec![Value::U8(i), Value::U8(i + 1), Value::U8(i + 2)]))
                .collect(),
            &opts,
        )
        .unwrap(),
        copy_into(
            root,
            "ab",
            &ab(),
            (0..6).map(|i| ab_value(i, i as f64 / 2.0)).collect(),
            &opts,
        )
        .unwrap(),
        copy_into(
            root,
            "tags",
            &tags(),
            vec![tag_list(&["a"]), tag_list(&[]), tag_list(&["b", "c", "d"])],
            &opts,
        )
        .unwrap(),
    ]
}

#[test]
fn get_agrees_with_collect() {
    let root = memory_root();
    for v in fill(&root) {
        assert_get_matches_collect(&v);
    }
}

#[test]
fn iterable_is_a_snapshot() {
    let root = memory_root();
    let mut v = copy_into(
        &root,
        "xs",
        &TypeDesc::native(DType::I32),
        vec![Value::I32(1), Value::I32(2)],
        &VectorOptions::default(),
    )
    .unwrap();

    let snapshot: Vec<Value> = v.iterable().collect::<chunkvec::Result<_>>().unwrap();
    v.push(Value::I32(3)).unwrap();
    assert_eq!(snapshot.len(), 2);

    let sum: i32 = iterable(&v)
        .map(|r| match r.unwrap() {
            Value::I32(x) => x,
            other => panic!("unexpected {:?}", other),
        })
        .sum();
    assert_eq!(sum, 6);
}

#[test]
fn empty_vectors_collect_nothing() {
    let root = memory_root();
    for (name, desc, options) in [
        ("e", TypeDesc::native(DType::F32), VectorOptions::default()),
        (
            "a",
            TypeDesc::array(TypeDesc::native(DType::F32)),
            VectorOptions::default().with_fixed_dims(vec![4]),
        ),
        ("c", ab(), VectorOptions::default()),
        ("s", tags(), VectorOptions::default()),
    ] {
        let v = chunkvec::create(&root, name, &desc, &options).unwrap();
        assert!(v.is_empty());
        assert_eq!(v.collect().unwrap(), Vec::<Value>::new());
        assert!(v.iterable().next().is_none());
        assert!(v.get(0).is_err());
    }
}
