//! Dispatch: per-bundle parser factories.
//!
//! A [`ParserFactory`] is bound to one bundle root and one format generation,
//! resolved when the factory is built. [`ParserDispatcher`] hands out
//! factories and remembers each root's generation across factories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::cache::GenerationCache;
use super::classify::PathClassifier;
use super::layout::{self, FormatGeneration};
use super::parser::{LogParser, ParserKind};
use super::rules::RuleBook;
use super::walk::{self, EntryKind};
use super::{BundleError, FileReference};

/// Metadata key carrying the producing host of a file.
pub const WORKER_KEY: &str = "worker";

pub struct ParserDispatcher {
    classifier: PathClassifier,
    cache: GenerationCache,
}

impl ParserDispatcher {
    pub fn new(rules: Arc<RuleBook>) -> Self {
        Self {
            classifier: PathClassifier::new(rules),
            cache: GenerationCache::new(),
        }
    }

    /// Generation of `root`, detected on first use only.
    pub fn generation(&self, root: &Path) -> FormatGeneration {
        self.cache.get_or_detect(root, layout::detect)
    }

    /// Factory for `root`, bound to its cached generation.
    pub fn factory(&self, root: impl AsRef<Path>) -> ParserFactory {
        let root = root.as_ref();
        ParserFactory::with_generation(root, self.generation(root), self.classifier.clone())
    }

    pub fn cache(&self) -> &GenerationCache {
        &self.cache
    }
}

/// File → parser mapping for one bundle.
#[derive(Debug, Clone)]
pub struct ParserFactory {
    root: PathBuf,
    generation: FormatGeneration,
    classifier: PathClassifier,
}

impl ParserFactory {
    /// Detect the layout of `root` and bind a factory to it.
    pub fn for_root(root: impl AsRef<Path>, rules: Arc<RuleBook>) -> Self {
        let root = root.as_ref();
        Self::with_generation(root, layout::detect(root), PathClassifier::new(rules))
    }

    pub fn with_generation(root: impl Into<PathBuf>, generation: FormatGeneration, classifier: PathClassifier) -> Self {
        Self {
            root: root.into(),
            generation,
            classifier,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation(&self) -> FormatGeneration {
        self.generation
    }

    pub fn classify(&self, file: &FileReference) -> Option<ParserKind> {
        self.classifier.classify(self.generation, file)
    }

    /// Parser for `file`, or `None` when the file is not parsed.
    pub fn parser_for(&self, file: &FileReference) -> Option<LogParser> {
        self.classify(file).map(LogParser::for_kind)
    }

    /// Walk the whole bundle and split it into parsed and supplementary files.
    pub fn dispatch_all(&self) -> Result<DispatchPlan, BundleError> {
        let mut plan = DispatchPlan {
            generation: self.generation,
            dispatched: Vec::new(),
            supplementary: Vec::new(),
        };

        for entry in walk::list(&self.root)? {
            if entry.kind != EntryKind::File {
                continue;
            }
            let file = FileReference::from_relative_path(&self.root, entry.relative_path);
            match self.parser_for(&file) {
                Some(parser) => {
                    let metadata = file_metadata(&file);
                    plan.dispatched.push(DispatchedFile { file, parser, metadata });
                }
                None => {
                    debug!(file = file.relative(), "No parser for file");
                    plan.supplementary.push(file);
                }
            }
        }

        info!(
            root = %self.root.display(),
            generation = self.generation.as_str(),
            dispatched = plan.dispatched.len(),
            supplementary = plan.supplementary.len(),
            "Built dispatch plan"
        );
        Ok(plan)
    }
}

#[derive(Debug, Clone)]
pub struct DispatchedFile {
    pub file: FileReference,
    pub parser: LogParser,
    /// Merged into every record parsed from this file
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct DispatchPlan {
    pub generation: FormatGeneration,
    pub dispatched: Vec<DispatchedFile>,
    pub supplementary: Vec<FileReference>,
}

impl DispatchPlan {
    pub fn counts_by_parser(&self) -> BTreeMap<ParserKind, usize> {
        let mut counts = BTreeMap::new();
        for dispatched in &self.dispatched {
            *counts.entry(dispatched.parser.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Host that produced `file`: the first directory under the bundle root.
pub fn infer_hostname(file: &FileReference) -> Option<&str> {
    file.top_directory()
}

/// Per-file metadata merged into parsed records. `worker` is always present,
/// null when the file sits directly under the root.
pub fn file_metadata(file: &FileReference) -> Map<String, Value> {
    let mut metadata = Map::new();
    let worker = infer_hostname(file)
        .map(|host| Value::String(host.to_string()))
        .unwrap_or(Value::Null);
    metadata.insert(WORKER_KEY.to_string(), worker);
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rules() -> Arc<RuleBook> {
        Arc::new(RuleBook::standard().expect("rules"))
    }

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn tsm_current_bundle() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "node1/tabadminagent_0.20182/logs/tabadminagent_node1-0.log", b"agent");
        write(root, "node1/backgrounder_0.20182/logs/backgrounder_node1-0.log", b"bg0");
        write(root, "node1/backgrounder_0.20182/logs/backgrounder_node1-1.log", b"bg1");
        write(root, "node2/vizqlserver_1.20182/logs/vizqlserver_node2-0.log", b"vizql");
        write(root, "node2/buildversion.txt", b"20182.18.0627.2230");
        write(root, "manifest.json", b"{}");
        tmp
    }

    #[test]
    fn test_factory_resolves_generation() {
        let tmp = tsm_current_bundle();
        let factory = ParserFactory::for_root(tmp.path(), rules());
        assert_eq!(factory.generation(), FormatGeneration::TsmCurrent);
        assert_eq!(factory.root(), tmp.path());
    }

    #[test]
    fn test_parser_for_file() {
        let tmp = tsm_current_bundle();
        let factory = ParserFactory::for_root(tmp.path(), rules());

        let bg = FileReference::new(tmp.path(), "node1/backgrounder_0.20182/logs/backgrounder_node1-0.log");
        let parser = factory.parser_for(&bg).expect("backgrounder parser");
        assert_eq!(parser.kind, ParserKind::Backgrounder);
        assert_eq!(parser.collection, "backgrounder");

        let other = FileReference::new(tmp.path(), "node2/buildversion.txt");
        assert!(factory.parser_for(&other).is_none());
    }

    #[test]
    fn test_dispatch_all_splits_files() {
        let tmp = tsm_current_bundle();
        let factory = ParserFactory::for_root(tmp.path(), rules());

        let plan = factory.dispatch_all().unwrap();

        assert_eq!(plan.generation, FormatGeneration::TsmCurrent);
        assert_eq!(plan.dispatched.len(), 4);
        let supplementary: Vec<&str> = plan.supplementary.iter().map(|f| f.relative()).collect();
        assert_eq!(supplementary, vec!["manifest.json", "node2/buildversion.txt"]);

        let counts = plan.counts_by_parser();
        assert_eq!(counts.get(&ParserKind::Backgrounder), Some(&2));
        assert_eq!(counts.get(&ParserKind::TabadminAgent), Some(&1));
        assert_eq!(counts.get(&ParserKind::Vizqlserver), Some(&1));
    }

    #[test]
    fn test_dispatched_files_carry_worker() {
        let tmp = tsm_current_bundle();
        let plan = ParserFactory::for_root(tmp.path(), rules()).dispatch_all().unwrap();

        for dispatched in &plan.dispatched {
            let worker = dispatched.metadata.get(WORKER_KEY).and_then(Value::as_str);
            assert_eq!(worker, dispatched.file.top_directory());
            assert!(worker.is_some());
        }
    }

    #[test]
    fn test_dispatch_all_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        let factory = ParserFactory::for_root(tmp.path().join("gone"), rules());

        assert_eq!(factory.generation(), FormatGeneration::Classic);
        assert!(factory.dispatch_all().is_err());
    }

    #[test]
    fn test_dispatcher_caches_generation() {
        let tmp = tsm_current_bundle();
        let dispatcher = ParserDispatcher::new(rules());

        let first = dispatcher.factory(tmp.path());
        assert_eq!(first.generation(), FormatGeneration::TsmCurrent);

        // The cached decision wins even after the tree stops looking like TSM.
        fs::remove_dir_all(tmp.path().join("node1/tabadminagent_0.20182")).unwrap();
        let second = dispatcher.factory(tmp.path());
        assert_eq!(second.generation(), FormatGeneration::TsmCurrent);
        assert_eq!(dispatcher.cache().len(), 1);

        dispatcher.cache().remove(tmp.path());
        assert_eq!(dispatcher.factory(tmp.path()).generation(), FormatGeneration::Classic);
    }

    #[cfg(unix)]
    #[test]
    fn test_dispatched_non_utf8_path_points_at_file() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(OsStr::from_bytes(b"host\xff")).join("vizqlserver");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("vizqlserver-0.log"), b"vizql").unwrap();

        let plan = ParserFactory::for_root(tmp.path(), rules()).dispatch_all().unwrap();

        assert_eq!(plan.dispatched.len(), 1);
        let dispatched = &plan.dispatched[0];
        assert_eq!(dispatched.parser.kind, ParserKind::Vizqlserver);
        assert!(dispatched.file.absolute().exists());
        assert_eq!(dispatched.metadata.get(WORKER_KEY).and_then(Value::as_str), Some("host\u{FFFD}"));
    }

    #[test]
    fn test_hostname_inference() {
        let file = FileReference::new("/b", "worker-7/vizqlserver/vizqlserver-0.log");
        assert_eq!(infer_hostname(&file), Some("worker-7"));

        let top = FileReference::new("/b", "netstat-info.txt");
        assert_eq!(infer_hostname(&top), None);
        assert_eq!(file_metadata(&top).get(WORKER_KEY), Some(&Value::Null));
    }
}
