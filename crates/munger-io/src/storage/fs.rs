//! Local filesystem storage rooted at a directory.
//!
//! Keys map to files under the root; `/` in a key creates subdirectories.
//! Content type is not persisted.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use blake3::Hasher;

use super::Storage;
use crate::error::{Error, Result};

pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::Config(format!("key '{key}' escapes storage root")));
        }
        Ok(self.root.join(rel))
    }
}

impl Storage for FsStorage {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let p = self.path_for(key)?;
        fs::read(&p).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::NotFound {
                key: key.to_string(),
            },
            _ => Error::Storage(format!("read {}: {e}", p.display())),
        })
    }

    fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<Option<String>> {
        let p = self.path_for(key)?;
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Storage(format!("mkparent: {e}")))?;
        }
        let mut f = File::create(&p).map_err(|e| Error::Storage(format!("create: {e}")))?;
        f.write_all(bytes)
            .map_err(|e| Error::Storage(format!("write: {e}")))?;
        f.flush()
            .map_err(|e| Error::Storage(format!("flush: {e}")))?;

        // Pseudo-ETag: hash(path || content)
        let mut h = Hasher::new();
        h.update(key.as_bytes());
        h.update(bytes);
        Ok(Some(h.finalize().to_hex().to_string()))
    }
}
