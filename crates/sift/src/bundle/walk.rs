//! Sorted recursive listing of a bundle. Any unreadable directory fails the
//! listing; callers that want to degrade instead must do so themselves.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::BundleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    /// Exact bytes of the relative path, `/`-separated
    pub raw: Vec<u8>,
    /// Relative path as it exists on disk
    pub relative_path: PathBuf,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Every directory and file under `root`, sorted by raw relative path.
/// Symlinked directories are not followed.
pub(crate) fn list(root: &Path) -> Result<Vec<Entry>, BundleError> {
    let mut entries = Vec::new();
    let mut pending = vec![(root.to_path_buf(), Vec::new(), PathBuf::new())];

    while let Some((dir, prefix, prefix_path)) = pending.pop() {
        let listing = fs::read_dir(&dir).map_err(|e| BundleError::io(&dir, e))?;

        for item in listing {
            let item = item.map_err(|e| BundleError::io(&dir, e))?;
            let path = item.path();
            let name = item.file_name();

            let mut raw = prefix.clone();
            if !raw.is_empty() {
                raw.push(b'/');
            }
            raw.extend_from_slice(name.as_encoded_bytes());
            let relative_path = prefix_path.join(&name);

            let file_type = item.file_type().map_err(|e| BundleError::io(&path, e))?;
            let kind = if file_type.is_dir() {
                pending.push((path.clone(), raw.clone(), relative_path.clone()));
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_symlink() {
                let target = fs::metadata(&path).map_err(|e| BundleError::io(&path, e))?;
                if !target.is_file() {
                    debug!(path = %path.display(), "Skipping symlink that is not a regular file");
                    continue;
                }
                EntryKind::File
            } else {
                continue;
            };

            entries.push(Entry {
                raw,
                relative_path,
                path,
                kind,
            });
        }
    }

    entries.sort_by(|a, b| a.raw.cmp(&b.raw));
    Ok(entries)
}
