//! Run: process every configured bundle on the blocking pool.
//!
//! Bundles share no state, so each one is hashed and dispatched in its own
//! task. A bundle that fails never stops the others.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::bundle::artifact::{select_processor, ArtifactProcessor};
use crate::bundle::{BundleError, FormatGeneration, ParserKind};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("No artifact processor accepts {}", .0.display())]
    Unsupported(PathBuf),

    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Outcome of processing one bundle.
#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    pub root: PathBuf,
    pub artifact_type: &'static str,
    pub generation: FormatGeneration,
    pub hash: String,
    pub dispatched: usize,
    pub supplementary: usize,
    pub parsers: BTreeMap<ParserKind, usize>,
}

/// Pick a processor for `root`, fingerprint it and build its dispatch plan.
pub fn process_bundle(processors: &[Arc<dyn ArtifactProcessor>], root: &Path) -> Result<BundleReport, RunError> {
    let processor = select_processor(processors, root).ok_or_else(|| RunError::Unsupported(root.to_path_buf()))?;

    let hash = processor.compute_hash(root)?;
    let plan = processor.parser_factory(root).dispatch_all()?;

    Ok(BundleReport {
        root: root.to_path_buf(),
        artifact_type: processor.artifact_type(),
        generation: plan.generation,
        hash,
        dispatched: plan.dispatched.len(),
        supplementary: plan.supplementary.len(),
        parsers: plan.counts_by_parser(),
    })
}

/// Process `roots` concurrently. Results come back in input order.
pub async fn process_bundles(
    processors: Arc<[Arc<dyn ArtifactProcessor>]>,
    roots: Vec<PathBuf>,
) -> Vec<(PathBuf, Result<BundleReport, RunError>)> {
    let handles: Vec<_> = roots
        .into_iter()
        .map(|root| {
            let processors = Arc::clone(&processors);
            let task_root = root.clone();
            (
                root,
                tokio::task::spawn_blocking(move || process_bundle(&processors, &task_root)),
            )
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (root, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(RunError::Bundle(BundleError::Task(e.to_string()))),
        };
        match &result {
            Ok(report) => info!(
                root = %root.display(),
                artifact_type = report.artifact_type,
                generation = report.generation.as_str(),
                hash = %report.hash,
                dispatched = report.dispatched,
                "Processed bundle"
            ),
            Err(e) => warn!(root = %root.display(), error = %e, "Bundle failed"),
        }
        results.push((root, result));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::artifact::server_processors;
    use crate::bundle::dispatch::ParserDispatcher;
    use crate::bundle::hash::ArtifactHasher;
    use crate::bundle::rules::RuleBook;
    use std::fs;
    use tempfile::TempDir;

    fn processors() -> Arc<[Arc<dyn ArtifactProcessor>]> {
        let dispatcher = Arc::new(ParserDispatcher::new(Arc::new(RuleBook::standard().unwrap())));
        server_processors(dispatcher, ArtifactHasher::default())
            .unwrap()
            .into()
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_process_tsm_current_bundle() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "node1/tabadminagent_0.20181.18.0404.1656/tabadminagent.log", "x");
        write(tmp.path(), "node1/backgrounder_0.20181.18.0404.1656/logs/backgrounder_node1-0.log", "x");
        write(tmp.path(), "node1/notes.md", "x");

        let report = process_bundle(&processors(), tmp.path()).unwrap();
        assert_eq!(report.generation, FormatGeneration::TsmCurrent);
        assert_eq!(report.hash.len(), 64);
        assert_eq!(report.dispatched + report.supplementary, 3);
        assert!(report.supplementary >= 1);
    }

    #[test]
    fn test_process_empty_root_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let err = process_bundle(&processors(), tmp.path()).unwrap_err();
        assert!(matches!(err, RunError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_process_bundles_keeps_order() {
        let good = TempDir::new().unwrap();
        write(good.path(), "worker0/vizqlserver/vizqlserver_1-0.txt", "x");
        let empty = TempDir::new().unwrap();

        let roots = vec![empty.path().to_path_buf(), good.path().to_path_buf()];
        let results = process_bundles(processors(), roots.clone()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, roots[0]);
        assert!(results[0].1.is_err());
        let report = results[1].1.as_ref().unwrap();
        assert_eq!(report.generation, FormatGeneration::Classic);
        assert_eq!(report.artifact_type, "Server Classic");
    }
}
