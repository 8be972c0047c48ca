//! Flat-file blob store
//!
//! Ledgers are addressed by fixed filenames under a single root directory
//! (the "bucket"). The trait is the seam for alternative backings; the
//! filesystem implementation is the production one.

use crate::error::Result;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

/// Byte-blob storage addressed by filename
pub trait BlobStore: Send + Sync {
    /// Whether a blob exists
    fn exists(&self, name: &str) -> bool;

    /// Read a blob in full
    fn get(&self, name: &str) -> Result<Vec<u8>>;

    /// Replace a blob in full
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Filesystem-backed blob store.
///
/// The write mutex serializes read-modify-write cycles within one process.
/// Nothing guards against writers in other processes; deployments must
/// keep a single writer.
pub struct FsBlobStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBlobStore {
    /// Open the store root, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl BlobStore for FsBlobStore {
    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.path_of(name))?)
    }

    fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let _guard = self.write_lock.lock();
        fs::write(self.path_of(name), bytes)?;
        Ok(())
    }
}
