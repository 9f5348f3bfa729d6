//! Reload idempotence and append-after-reload through a container file

use crate::common::*;
use chunkvec::{
    create, load, load_as, DType, Error, FileStore, StorageError, StorageStyle, TypeDesc, Value,
    Vector, VectorOptions, VectorRegistry,
};

/// One vector per built-in style, with its options and sample values
fn cases() -> Vec<(&'static str, TypeDesc, VectorOptions, Vec<Value>)> {
    let point = TypeDesc::record(
        "Point",
        [
            ("x", TypeDesc::native(DType::F32)),
            ("y", TypeDesc::native(DType::F32)),
        ],
    );
    let point_value = |x: f32, y: f32| Value::record([("x", Value::F32(x)), ("y", Value::F32(y))]);
    let color = TypeDesc::enumeration("Color", ["Red", "Green", "Blue"]);

    vec![
        (
            "words",
            TypeDesc::native(DType::Utf8),
            VectorOptions::default(),
            vec![Value::Str("α".into()), Value::Str(String::new())],
        ),
        (
            "colors",
            color,
            VectorOptions::default(),
            vec![Value::Enum("Blue".into()), Value::Enum("Red".into())],
        ),
        (
            "packed",
            point.clone(),
            VectorOptions::native(),
            vec![point_value(1.0, -1.0), point_value(0.5, 2.5)],
        ),
        (
            "points",
            point,
            VectorOptions::default(),
            vec![point_value(3.0, 4.0)],
        ),
        (
            "pairs",
            TypeDesc::tuple(vec![TypeDesc::native(DType::U8), TypeDesc::native(DType::U8)]),
            VectorOptions::default(),
            vec![
                Value::Tuple(vec![Value::U8(1), Value::U8(2)]),
                Value::Tuple(vec![Value::U8(3), Value::U8(4)]),
            ],
        ),
        (
            "grids",
            TypeDesc::array(TypeDesc::native(DType::I16)),
            VectorOptions::default().with_fixed_dims(vec![2, 2]),
            vec![Value::Array {
                shape: vec![2, 2],
                items: (1..=4).map(Value::I16).collect(),
            }],
        ),
        ("ab", ab(), VectorOptions::default(), vec![ab_value(7, 0.25)]),
        (
            "tags",
            tags(),
            VectorOptions::default(),
            vec![tag_list(&["x", "y"]), tag_list(&[])],
        ),
    ]
}

#[test]
fn reload_is_idempotent_and_appends() {
    let fixture = FileFixture::new();
    let styles = fixture.create(|root| {
        cases()
            .into_iter()
            .map(|(name, desc, options, values)| {
                let mut v = create(root, name, &desc, &options).unwrap();
                v.push_many(values.clone()).unwrap();
                assert_eq!(v.collect().unwrap(), values, "{}", name);
                (name, v.style().clone())
            })
            .collect::<Vec<_>>()
    });
    assert!(styles.contains(&("packed", StorageStyle::Elemental(DType::Compound(
        chunkvec::CompoundType::packed([("x", DType::F32), ("y", DType::F32)]).unwrap()
    )))));

    fixture.reopen(|root| {
        for ((name, desc, _, values), (_, style)) in cases().into_iter().zip(&styles) {
            let mut v = load(&root.group(name).unwrap()).unwrap();
            assert_eq!(v.style(), style, "{}", name);
            assert_eq!(v.descriptor(), &desc);
            assert_eq!(v.collect().unwrap(), values, "{}", name);

            v.push_many(values.clone()).unwrap();
        }
    });

    fixture.reopen(|root| {
        for (name, desc, _, values) in cases() {
            let v = load_as(&root.group(name).unwrap(), &desc).unwrap();
            let doubled: Vec<Value> = values.iter().chain(values.iter()).cloned().collect();
            assert_eq!(v.collect().unwrap(), doubled, "{}", name);
        }
    });
}

#[test]
fn typed_vector_survives_reopen() {
    let fixture = FileFixture::new();
    fixture.create(|root| {
        let mut v: Vector<(f64, f64, f64)> = Vector::create(root, "xyz").unwrap();
        v.push((1.0, 2.0, 3.0)).unwrap();
    });
    fixture.reopen(|root| {
        let mut v: Vector<(f64, f64, f64)> = Vector::load(&root.group("xyz").unwrap()).unwrap();
        assert_eq!(
            v.as_dyn().style(),
            &StorageStyle::ArrayLike {
                dtype: DType::F64,
                dims: vec![3]
            }
        );
        v.push((4.0, 5.0, 6.0)).unwrap();
        v.set(0, (0.0, 0.0, 0.0)).unwrap();
    });
    fixture.reopen(|root| {
        let v: Vector<(f64, f64, f64)> = Vector::load(&root.group("xyz").unwrap()).unwrap();
        assert_eq!(v.collect().unwrap(), vec![(0.0, 0.0, 0.0), (4.0, 5.0, 6.0)]);
    });
}

#[test]
fn json_vector_needs_the_json_codec_on_reload() {
    let fixture = FileFixture::new();
    let doc = TypeDesc::opaque("Doc", chunkvec::SerialFormat::Json);
    let registry = VectorRegistry::standard().with_json();
    fixture.create(|root| {
        let mut v = registry
            .create(root, "docs", &doc, &VectorOptions::default())
            .unwrap();
        v.push(Value::Text(r#"{"n":1}"#.into())).unwrap();
    });
    fixture.reopen(|root| {
        let group = root.group("docs").unwrap();
        assert!(matches!(load(&group), Err(Error::Metadata(_))));
        let v = registry.load(&group).unwrap();
        assert_eq!(v.style(), &StorageStyle::TextSerialized);
        assert_eq!(v.get(0).unwrap(), Value::Text(r#"{"n":1}"#.into()));
    });
}

#[test]
fn load_without_metadata_fails() {
    let root = memory_root();
    root.create_group("plain").unwrap();
    assert!(matches!(
        load(&root.group("plain").unwrap()),
        Err(Error::Metadata(_))
    ));
}

#[test]
fn corrupt_container_file_is_detected() {
    let fixture = FileFixture::new();
    fixture.create(|root| {
        create(
            root,
            "ints",
            &TypeDesc::native(DType::I32),
            &VectorOptions::default(),
        )
        .unwrap()
        .push(Value::I32(1))
        .unwrap();
    });

    let mut bytes = std::fs::read(fixture.path()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(fixture.path(), bytes).unwrap();

    assert!(matches!(
        FileStore::open(fixture.path()),
        Err(StorageError::Corruption(_))
    ));
}
