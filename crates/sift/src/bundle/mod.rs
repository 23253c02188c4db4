//! Bundle: artifact layout detection and parser dispatch for log bundles.
//!
//! A bundle is a directory tree captured from one server deployment.
//!
//! - `layout.rs`: format generation detection from directory names
//! - `rules.rs` / `classify.rs`: ordered per-generation dispatch tables
//! - `parser.rs`: parser identifiers and parser construction
//! - `hash.rs`: deterministic directory fingerprint
//! - `cache.rs`: per-root generation cache
//! - `dispatch.rs`: the parser factory tying detection and rules together
//! - `artifact.rs`: artifact descriptors consumed by the orchestrator

pub mod layout;
pub mod rules;
pub mod classify;
pub mod parser;
pub mod hash;
pub mod cache;
pub mod dispatch;
pub mod artifact;
mod walk;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use artifact::{ArtifactProcessor, PluginInterface, ServerClassicProcessor, ServerTsmProcessor};
pub use dispatch::{ParserDispatcher, ParserFactory};
pub use layout::FormatGeneration;
pub use parser::{LogParser, ParserKind};

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Bundle task failed: {0}")]
    Task(String),
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A file inside a bundle, addressed relative to the bundle root.
///
/// The relative path always uses `/` separators regardless of platform.
/// Names that are not valid UTF-8 are decoded lossily for matching, while
/// [`FileReference::absolute`] keeps pointing at the real file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileReference {
    root: PathBuf,
    relative: String,
    path: PathBuf,
}

impl FileReference {
    pub fn new(root: impl Into<PathBuf>, relative: impl AsRef<str>) -> Self {
        let relative = relative
            .as_ref()
            .replace('\\', "/")
            .trim_start_matches('/')
            .to_string();
        let path = relative.split('/').collect();
        Self {
            root: root.into(),
            relative,
            path,
        }
    }

    /// Build a reference from a relative path as it exists on disk.
    pub fn from_relative_path(root: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let relative = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            root: root.into(),
            relative,
            path,
        }
    }

    /// Build a reference from an absolute path under `root`.
    pub fn from_absolute(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(Self::from_relative_path(root, relative))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn absolute(&self) -> PathBuf {
        self.root.join(&self.path)
    }

    pub fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }

    /// Directory segments between the root and the file, outermost first.
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        let mut segments: Vec<&str> = self.relative.split('/').collect();
        segments.pop();
        segments.into_iter()
    }

    /// First directory under the root. In TSM bundles this is the node hostname.
    pub fn top_directory(&self) -> Option<&str> {
        self.directories().next()
    }
}
