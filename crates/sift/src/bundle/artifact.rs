//! Artifact: descriptors for the bundle types the orchestrator can ingest.
//!
//! The orchestrator asks every registered processor whether it can handle a
//! root, then uses the first one that says yes for hashing, per-file metadata
//! and parser dispatch.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::dispatch::{self, ParserDispatcher, ParserFactory};
use super::hash::ArtifactHasher;
use super::layout;
use super::{BundleError, FileReference};
use crate::pattern::{Pattern, PatternError};

/// Store collection every server bundle needs before plugins can run.
pub const CONFIG_COLLECTION: &str = "config";

/// File names a server bundle claims ownership of.
pub const SERVER_FILE_PATTERN: &str = r"^.*\.(log|txt|yml|csv|properties|conf|zip).*$";

/// Plugin families a processor's output can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginInterface {
    ServerClassic,
    ServerTsm,
}

pub trait ArtifactProcessor: Send + Sync {
    fn artifact_type(&self) -> &'static str;

    fn required_collections(&self) -> &[&'static str];

    fn supported_file_patterns(&self) -> &[Pattern];

    fn supported_plugin_interfaces(&self) -> &[PluginInterface];

    /// Whether this processor understands the bundle at `root`. Never fails;
    /// unreadable roots answer `false`.
    fn can_process(&self, root: &Path) -> bool;

    fn compute_hash(&self, root: &Path) -> Result<String, BundleError>;

    fn additional_file_metadata(&self, file: &FileReference) -> Map<String, Value> {
        dispatch::file_metadata(file)
    }

    fn parser_factory(&self, root: &Path) -> ParserFactory;

    /// Whether `file_name` is one this processor claims.
    fn claims_file(&self, file_name: &str) -> bool {
        self.supported_file_patterns()
            .iter()
            .any(|pattern| pattern.is_match(file_name))
    }
}

/// Shared plumbing of the server processors.
///
/// Both processors ask the same dispatcher, so a root's generation is decided
/// once and reused by `can_process` and `parser_factory` alike.
struct ServerDescriptor {
    dispatcher: Arc<ParserDispatcher>,
    hasher: ArtifactHasher,
    file_patterns: Vec<Pattern>,
}

impl ServerDescriptor {
    fn new(dispatcher: Arc<ParserDispatcher>, hasher: ArtifactHasher) -> Result<Self, PatternError> {
        Ok(Self {
            dispatcher,
            hasher,
            file_patterns: vec![Pattern::new(SERVER_FILE_PATTERN)?],
        })
    }
}

/// Pre-TSM server bundles (one directory per component).
pub struct ServerClassicProcessor {
    inner: ServerDescriptor,
}

impl ServerClassicProcessor {
    pub fn new(dispatcher: Arc<ParserDispatcher>, hasher: ArtifactHasher) -> Result<Self, PatternError> {
        Ok(Self {
            inner: ServerDescriptor::new(dispatcher, hasher)?,
        })
    }
}

impl ArtifactProcessor for ServerClassicProcessor {
    fn artifact_type(&self) -> &'static str {
        "Server Classic"
    }

    fn required_collections(&self) -> &[&'static str] {
        &[CONFIG_COLLECTION]
    }

    fn supported_file_patterns(&self) -> &[Pattern] {
        &self.inner.file_patterns
    }

    fn supported_plugin_interfaces(&self) -> &[PluginInterface] {
        &[PluginInterface::ServerClassic]
    }

    fn can_process(&self, root: &Path) -> bool {
        !layout::subdirectories(root).is_empty() && !self.inner.dispatcher.generation(root).is_tsm()
    }

    fn compute_hash(&self, root: &Path) -> Result<String, BundleError> {
        self.inner.hasher.hash(root)
    }

    fn parser_factory(&self, root: &Path) -> ParserFactory {
        self.inner.dispatcher.factory(root)
    }
}

/// TSM-generated server bundles (one directory per node).
pub struct ServerTsmProcessor {
    inner: ServerDescriptor,
}

impl ServerTsmProcessor {
    pub fn new(dispatcher: Arc<ParserDispatcher>, hasher: ArtifactHasher) -> Result<Self, PatternError> {
        Ok(Self {
            inner: ServerDescriptor::new(dispatcher, hasher)?,
        })
    }
}

impl ArtifactProcessor for ServerTsmProcessor {
    fn artifact_type(&self) -> &'static str {
        "Server TSM"
    }

    fn required_collections(&self) -> &[&'static str] {
        &[CONFIG_COLLECTION]
    }

    fn supported_file_patterns(&self) -> &[Pattern] {
        &self.inner.file_patterns
    }

    fn supported_plugin_interfaces(&self) -> &[PluginInterface] {
        &[PluginInterface::ServerTsm]
    }

    fn can_process(&self, root: &Path) -> bool {
        self.inner.dispatcher.generation(root).is_tsm()
    }

    fn compute_hash(&self, root: &Path) -> Result<String, BundleError> {
        self.inner.hasher.hash(root)
    }

    fn parser_factory(&self, root: &Path) -> ParserFactory {
        self.inner.dispatcher.factory(root)
    }
}

/// The processors for every supported server generation, most specific first.
pub fn server_processors(
    dispatcher: Arc<ParserDispatcher>,
    hasher: ArtifactHasher,
) -> Result<Vec<Arc<dyn ArtifactProcessor>>, PatternError> {
    Ok(vec![
        Arc::new(ServerTsmProcessor::new(Arc::clone(&dispatcher), hasher)?),
        Arc::new(ServerClassicProcessor::new(dispatcher, hasher)?),
    ])
}

/// First processor that accepts `root`.
pub fn select_processor<'a>(
    processors: &'a [Arc<dyn ArtifactProcessor>],
    root: &Path,
) -> Option<&'a Arc<dyn ArtifactProcessor>> {
    processors.iter().find(|processor| processor.can_process(root))
}
