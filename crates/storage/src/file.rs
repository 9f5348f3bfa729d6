//! FileStore: single-file persistent container store
//!
//! A `FileStore` serves every operation from an in-memory [`MemoryStore`]
//! and persists the whole tree to one file on [`flush`](FileStore::flush).
//!
//! # Format
//!
//! ```text
//! +------------------+
//! | Magic: "CVEC"    | 4 bytes
//! | Format Version   | 4 bytes (u32 LE)
//! | Body Length      | 8 bytes (u64 LE)
//! | Body             | variable (bincode StoreImage)
//! | CRC32            | 4 bytes
//! +------------------+
//! ```
//!
//! Persistence is atomic: write to a temp file, fsync, rename, fsync the
//! parent directory.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use chunkvec_core::StorageError;

use crate::column::Column;
use crate::memory::{MemoryStore, StoreImage};
use crate::store::{ContainerStore, DatasetInfo, DatasetSpec, StoreResult};

/// Container file magic bytes: "CVEC"
pub const FILE_MAGIC: [u8; 4] = *b"CVEC";

/// Current container file format version
pub const FILE_FORMAT_VERSION: u32 = 1;

const HEADER_SIZE: usize = 4 + 4 + 8;

/// Encode an image into the container file format
pub fn encode_image(image: &StoreImage) -> StoreResult<Vec<u8>> {
    let body = bincode::serialize(image).map_err(|e| StorageError::Encoding(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len() + 4);
    bytes.extend_from_slice(&FILE_MAGIC);
    bytes.extend_from_slice(&FILE_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(body.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&body);

    // CRC32 of all preceding bytes
    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());
    Ok(bytes)
}

/// Decode an image from the container file format
pub fn decode_image(bytes: &[u8]) -> StoreResult<StoreImage> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(StorageError::Corruption("container file too short".to_string()));
    }
    if bytes[0..4] != FILE_MAGIC {
        return Err(StorageError::Corruption("invalid magic bytes".to_string()));
    }

    let (data, crc_bytes) = bytes.split_at(bytes.len() - 4);
    let mut crc_buf = [0u8; 4];
    crc_buf.copy_from_slice(crc_bytes);
    let stored_crc = u32::from_le_bytes(crc_buf);
    let computed_crc = crc32fast::hash(data);
    if stored_crc != computed_crc {
        return Err(StorageError::Corruption(format!(
            "checksum mismatch: expected {:08x}, computed {:08x}",
            stored_crc, computed_crc
        )));
    }

    let mut version_buf = [0u8; 4];
    version_buf.copy_from_slice(&data[4..8]);
    let version = u32::from_le_bytes(version_buf);
    if version != FILE_FORMAT_VERSION {
        return Err(StorageError::Corruption(format!(
            "unsupported format version {}",
            version
        )));
    }

    let mut len_buf = [0u8; 8];
    len_buf.copy_from_slice(&data[8..16]);
    let body_len = u64::from_le_bytes(len_buf) as usize;
    if HEADER_SIZE + body_len != data.len() {
        return Err(StorageError::Corruption(format!(
            "body length {} does not match file size",
            body_len
        )));
    }

    bincode::deserialize(&data[HEADER_SIZE..]).map_err(|e| StorageError::Corruption(e.to_string()))
}

/// Single-file persistent container store
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    dirty: AtomicBool,
}

impl FileStore {
    /// Create a new, empty container file (fails if it exists)
    pub fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            return Err(StorageError::AlreadyExists(path.display().to_string()));
        }
        let store = FileStore {
            path,
            inner: MemoryStore::new(),
            dirty: AtomicBool::new(true),
        };
        store.flush()?;
        Ok(store)
    }

    /// Open an existing container file
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let temp = temp_path(&path);
        if temp.exists() {
            warn!(target: "chunkvec::store", path = ?temp, "Discarding incomplete temp file");
            std::fs::remove_file(&temp)?;
        }
        let bytes = std::fs::read(&path)?;
        let image = decode_image(&bytes)?;
        info!(
            target: "chunkvec::store",
            path = ?path,
            datasets = image.dataset_count(),
            "Container file opened"
        );
        Ok(FileStore {
            path,
            inner: MemoryStore::from_image(image),
            dirty: AtomicBool::new(false),
        })
    }

    /// Open the file if it exists, otherwise create it
    pub fn open_or_create(path: impl AsRef<Path>) -> StoreResult<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Path of the container file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if there are changes not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Persist the container atomically (write-fsync-rename)
    pub fn flush(&self) -> StoreResult<()> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let image = self.inner.image();
        let result = self.persist(&image);
        if result.is_err() {
            self.dirty.store(true, Ordering::Release);
        } else {
            info!(
                target: "chunkvec::store",
                path = ?self.path,
                datasets = image.dataset_count(),
                "Container file flushed"
            );
        }
        result
    }

    fn persist(&self, image: &StoreImage) -> StoreResult<()> {
        let bytes = encode_image(image)?;
        let temp = temp_path(&self.path);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp, &self.path)?;

        if let Some(parent) = self.path.parent() {
            if parent.exists() && !parent.as_os_str().is_empty() {
                let dir = File::open(parent)?;
                dir.sync_all()?;
            }
        }
        Ok(())
    }

    fn touch(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(target: "chunkvec::store", path = ?self.path, error = %e, "Flush on drop failed");
        }
    }
}

impl ContainerStore for FileStore {
    fn create_group(&self, path: &str) -> StoreResult<()> {
        self.inner.create_group(path)?;
        self.touch();
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn is_group(&self, path: &str) -> bool {
        self.inner.is_group(path)
    }

    fn children(&self, path: &str) -> StoreResult<Vec<String>> {
        self.inner.children(path)
    }

    fn remove(&self, path: &str) -> StoreResult<()> {
        self.inner.remove(path)?;
        self.touch();
        Ok(())
    }

    fn create_dataset(&self, path: &str, spec: DatasetSpec) -> StoreResult<()> {
        self.inner.create_dataset(path, spec)?;
        self.touch();
        Ok(())
    }

    fn dataset_info(&self, path: &str) -> StoreResult<DatasetInfo> {
        self.inner.dataset_info(path)
    }

    fn extend(&self, path: &str, new_extent: usize) -> StoreResult<()> {
        self.inner.extend(path, new_extent)?;
        self.touch();
        Ok(())
    }

    fn write_range(&self, path: &str, start: usize, data: &Column) -> StoreResult<()> {
        self.inner.write_range(path, start, data)?;
        self.touch();
        Ok(())
    }

    fn read_range(&self, path: &str, range: Range<usize>) -> StoreResult<Column> {
        self.inner.read_range(path, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkvec_core::DType;
    use tempfile::TempDir;

    #[test]
    fn test_create_flush_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.cvec");
        {
            let store = FileStore::create(&path).unwrap();
            store.create_group("/v").unwrap();
            store
                .create_dataset("/v/data", DatasetSpec::extendable(DType::U32, &[], 16))
                .unwrap();
            store.extend("/v/data", 2).unwrap();
            store
                .write_range("/v/data", 0, &Column::U32(vec![7, 8]))
                .unwrap();
            assert!(store.is_dirty());
            store.flush().unwrap();
            assert!(!store.is_dirty());
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.read_all("/v/data").unwrap(), Column::U32(vec![7, 8]));
        assert_eq!(store.dataset_info("/v/data").unwrap().chunk, 16);
    }

    #[test]
    fn test_drop_flushes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dropped.cvec");
        {
            let store = FileStore::create(&path).unwrap();
            store.create_group("/g").unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert!(store.is_group("/g"));
    }

    #[test]
    fn test_create_existing_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("twice.cvec");
        let _first = FileStore::create(&path).unwrap();
        assert!(matches!(
            FileStore::create(&path),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_corrupt_file_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.cvec");
        {
            let store = FileStore::create(&path).unwrap();
            store.create_group("/g").unwrap();
        }
        let mut bytes = std::fs::read(&path).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Corruption(_))
        ));
    }

    #[test]
    fn test_bad_magic_detected() {
        let image = StoreImage::default();
        let mut bytes = encode_image(&image).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            decode_image(&bytes),
            Err(StorageError::Corruption(_))
        ));
        assert!(matches!(
            decode_image(&[1, 2, 3]),
            Err(StorageError::Corruption(_))
        ));
    }

    #[test]
    fn test_open_or_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("either.cvec");
        {
            let store = FileStore::open_or_create(&path).unwrap();
            store.create_group("/x").unwrap();
        }
        let store = FileStore::open_or_create(&path).unwrap();
        assert!(store.exists("/x"));
    }
}
