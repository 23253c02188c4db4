//! Hash: deterministic SHA-256 fingerprint of a bundle directory tree.
//!
//! The digest covers every entry's relative path and kind, every file's size
//! and every file's bytes, fed in relative-path order. Paths go in as their
//! raw on-disk bytes, never a lossy decoding. Files are streamed in
//! `chunk_size` pieces. Any I/O failure aborts the computation: a digest that
//! silently skipped a file would defeat change detection.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::walk::{self, EntryKind};
use super::BundleError;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

const DIRECTORY_TAG: u8 = b'd';
const FILE_TAG: u8 = b'f';

#[derive(Debug, Clone, Copy)]
pub struct ArtifactHasher {
    chunk_size: usize,
}

impl ArtifactHasher {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hex-encoded digest of the tree under `root`.
    pub fn hash(&self, root: &Path) -> Result<String, BundleError> {
        let entries = walk::list(root)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut files = 0usize;
        let mut bytes = 0u64;

        for entry in &entries {
            match entry.kind {
                EntryKind::Directory => {
                    hasher.update([DIRECTORY_TAG]);
                    hasher.update(&entry.raw);
                    hasher.update([0u8]);
                }
                EntryKind::File => {
                    let mut file = File::open(&entry.path).map_err(|e| BundleError::io(&entry.path, e))?;
                    let len = file
                        .metadata()
                        .map_err(|e| BundleError::io(&entry.path, e))?
                        .len();

                    hasher.update([FILE_TAG]);
                    hasher.update(&entry.raw);
                    hasher.update([0u8]);
                    hasher.update(len.to_le_bytes());

                    loop {
                        let read = match file.read(&mut buffer) {
                            Ok(0) => break,
                            Ok(n) => n,
                            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                            Err(e) => return Err(BundleError::io(&entry.path, e)),
                        };
                        hasher.update(&buffer[..read]);
                        bytes += read as u64;
                    }
                    files += 1;
                }
            }
        }

        let digest = hex::encode(hasher.finalize());
        debug!(root = %root.display(), files, bytes, digest = %digest, "Computed bundle hash");
        Ok(digest)
    }
}

impl Default for ArtifactHasher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

/// Hash independent bundles concurrently on the blocking pool.
///
/// Results come back in input order; one bundle failing does not affect the others.
pub async fn hash_bundles(
    hasher: ArtifactHasher,
    roots: Vec<PathBuf>,
) -> Vec<(PathBuf, Result<String, BundleError>)> {
    let handles: Vec<_> = roots
        .into_iter()
        .map(|root| {
            let task_root = root.clone();
            (root, tokio::task::spawn_blocking(move || hasher.hash(&task_root)))
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (root, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Hash task failed");
                Err(BundleError::Task(e.to_string()))
            }
        };
        results.push((root, result));
    }
    results
}
