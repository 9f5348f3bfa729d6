//! Shared fixtures

use chunkvec::{DType, FileStore, Group, MemoryStore, TypeDesc, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Root group of a fresh in-memory store
pub fn memory_root() -> Group {
    Group::root(Arc::new(MemoryStore::new()))
}

/// Temporary directory holding one container file
pub struct FileFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl FileFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.cvec");
        FileFixture { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the container file and hand its root to `f`, then flush
    pub fn create<R>(&self, f: impl FnOnce(&Group) -> R) -> R {
        let store = Arc::new(FileStore::create(&self.path).unwrap());
        let out = f(&Group::root(store.clone()));
        store.flush().unwrap();
        out
    }

    /// Reopen the container file and hand its root to `f`, then flush
    pub fn reopen<R>(&self, f: impl FnOnce(&Group) -> R) -> R {
        let store = Arc::new(FileStore::open(&self.path).unwrap());
        let out = f(&Group::root(store.clone()));
        store.flush().unwrap();
        out
    }
}

/// `{a: i64, b: f64}`
pub fn ab() -> TypeDesc {
    TypeDesc::record(
        "AB",
        [
            ("a", TypeDesc::native(DType::I64)),
            ("b", TypeDesc::native(DType::F64)),
        ],
    )
}

pub fn ab_value(a: i64, b: f64) -> Value {
    Value::record([("a", Value::I64(a)), ("b", Value::F64(b))])
}

/// Variable-shape list of strings
pub fn tags() -> TypeDesc {
    TypeDesc::array(TypeDesc::native(DType::Utf8))
}

pub fn tag_list(items: &[&str]) -> Value {
    Value::list(items.iter().map(|s| Value::Str(s.to_string())).collect())
}
