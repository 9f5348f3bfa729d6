//! The four reference scenarios, one per storage style

use crate::common::*;
use chunkvec::{
    create, load, DType, Error, Group, StorageStyle, TypeDesc, Value, VectorOptions,
};

#[test]
fn elemental_int64() {
    let root = memory_root();
    let mut v = create(
        &root,
        "ints",
        &TypeDesc::native(DType::I64),
        &VectorOptions::default(),
    )
    .unwrap();
    assert_eq!(v.style(), &StorageStyle::Elemental(DType::I64));

    for i in 1..=5 {
        v.push(Value::I64(i)).unwrap();
    }
    assert_eq!(v.len(), 5);
    assert_eq!(v.get(0).unwrap(), Value::I64(1));
    assert_eq!(v.get(4).unwrap(), Value::I64(5));
    assert!(matches!(v.get(5), Err(Error::IndexOutOfBounds { index: 5, len: 5 })));
    assert_eq!(
        v.collect().unwrap(),
        (1..=5).map(Value::I64).collect::<Vec<_>>()
    );
}

#[test]
fn array_like_fixed_dims() {
    let root = memory_root();
    let desc = TypeDesc::array(TypeDesc::native(DType::F64));
    let options = VectorOptions::default().with_fixed_dims(vec![3]);
    let mut v = create(&root, "vec3", &desc, &options).unwrap();
    assert_eq!(
        v.style(),
        &StorageStyle::ArrayLike {
            dtype: DType::F64,
            dims: vec![3]
        }
    );

    let first = Value::list(vec![Value::F64(1.0), Value::F64(2.0), Value::F64(3.0)]);
    let second = Value::list(vec![Value::F64(4.0), Value::F64(5.0), Value::F64(6.0)]);
    v.push(first.clone()).unwrap();
    v.push(second.clone()).unwrap();
    assert_eq!(v.collect().unwrap(), vec![first, second]);

    let info = root
        .group("vec3")
        .unwrap()
        .dataset("data")
        .unwrap()
        .info()
        .unwrap();
    assert_eq!(info.shape, vec![3, 2]);
    assert_eq!(info.max_extent, None);
}

#[test]
fn array_like_rejects_wrong_shape() {
    let root = memory_root();
    let desc = TypeDesc::array(TypeDesc::native(DType::F64));
    let mut v = create(
        &root,
        "vec3",
        &desc,
        &VectorOptions::default().with_fixed_dims(vec![3]),
    )
    .unwrap();
    let short = Value::list(vec![Value::F64(1.0), Value::F64(2.0)]);
    assert!(matches!(
        v.push(short),
        Err(Error::DimensionMismatch { .. })
    ));
    assert!(v.is_empty());
}

#[test]
fn fixed_dims_conflicting_with_declared_shape() {
    let root = memory_root();
    let desc = TypeDesc::fixed_array(TypeDesc::native(DType::F32), vec![4]);
    let err = create(
        &root,
        "bad",
        &desc,
        &VectorOptions::default().with_fixed_dims(vec![3]),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch { ref expected, ref actual }
            if expected == &vec![3] && actual == &vec![4]
    ));
    assert!(!root.contains("bad"));
}

#[test]
fn composite_record() {
    let root = memory_root();
    let mut v = create(&root, "ab", &ab(), &VectorOptions::default()).unwrap();
    assert_eq!(v.style(), &StorageStyle::Composite);
    v.push(ab_value(1, 2.0)).unwrap();
    v.push(ab_value(3, 4.0)).unwrap();

    let data = root.group("ab").unwrap().group("data").unwrap();
    for field in ["a", "b"] {
        assert_eq!(load(&data.group(field).unwrap()).unwrap().len(), 2);
    }
    assert_eq!(v.get(1).unwrap(), ab_value(3, 4.0));
}

#[test]
fn composite_metadata_has_no_constant_dims() {
    let root = memory_root();
    create(&root, "ab", &ab(), &VectorOptions::default()).unwrap();
    let meta = root.group("ab").unwrap().group("metadata").unwrap();
    let flag = meta.read_whole("dimensions_are_constant").unwrap();
    assert_eq!(flag.into_values(), vec![Value::U8(0)]);
}

#[test]
fn composite_with_fixed_dims() {
    let root = memory_root();
    let desc = TypeDesc::record(
        "Sample",
        [
            ("id", TypeDesc::native(DType::I64)),
            ("v", TypeDesc::array(TypeDesc::native(DType::F64))),
        ],
    );
    let options = VectorOptions::default().with_fixed_dims(vec![3]);
    let sample = |id: i64, x: f64| {
        Value::record([
            ("id", Value::I64(id)),
            ("v", Value::list(vec![Value::F64(x); 3])),
        ])
    };
    let mut v = create(&root, "samples", &desc, &options).unwrap();
    assert_eq!(v.style(), &StorageStyle::Composite);
    v.push(sample(1, 0.5)).unwrap();
    v.push(sample(2, 1.5)).unwrap();

    let group = root.group("samples").unwrap();
    let flag = |g: &Group| {
        g.group("metadata")
            .unwrap()
            .read_whole("dimensions_are_constant")
            .unwrap()
            .into_values()
    };
    assert_eq!(flag(&group), vec![Value::U8(0)]);
    let child = group.group("data").unwrap().group("v").unwrap();
    assert_eq!(flag(&child), vec![Value::U8(1)]);
    assert_eq!(
        load(&child).unwrap().style(),
        &StorageStyle::ArrayLike {
            dtype: DType::F64,
            dims: vec![3]
        }
    );

    let mut again = load(&group).unwrap();
    assert_eq!(again.style(), &StorageStyle::Composite);
    assert_eq!(again.collect().unwrap(), vec![sample(1, 0.5), sample(2, 1.5)]);
    again.push(sample(3, 2.5)).unwrap();
    assert_eq!(again.get(2).unwrap(), sample(3, 2.5));
}

#[test]
fn byte_serialized_variable_shape() {
    let root = memory_root();
    let mut v = create(&root, "tags", &tags(), &VectorOptions::default()).unwrap();
    assert_eq!(v.style(), &StorageStyle::ByteSerialized);

    let values = vec![
        tag_list(&["red"]),
        tag_list(&["green", "blue"]),
        tag_list(&[]),
    ];
    v.push_many(values.clone()).unwrap();

    let stops = read_stops(&root.group("tags").unwrap());
    assert_eq!(stops.len(), 3);
    assert_eq!(v.get(1).unwrap(), values[1]);
    assert_eq!(v.get(2).unwrap(), values[2]);
    assert_eq!(v.collect().unwrap(), values);
}

#[test]
fn byte_serialized_set_is_rejected() {
    let root = memory_root();
    let mut v = create(&root, "tags", &tags(), &VectorOptions::default()).unwrap();
    v.push(tag_list(&["a", "b"])).unwrap();
    let group = root.group("tags").unwrap();
    let stops_before = read_stops(&group);

    let err = v.set(0, tag_list(&["c"])).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation { operation: "set", .. }));
    assert_eq!(read_stops(&group), stops_before);
    assert_eq!(v.collect().unwrap(), vec![tag_list(&["a", "b"])]);
}

fn read_stops(vector: &Group) -> Vec<Value> {
    vector
        .group("data")
        .unwrap()
        .group("stops")
        .unwrap()
        .dataset("data")
        .unwrap()
        .read_all()
        .unwrap()
        .into_values()
}
