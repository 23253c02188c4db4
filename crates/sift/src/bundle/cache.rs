use std::path::{Path, PathBuf};

use dashmap::DashMap;

use super::layout::FormatGeneration;

/// Per-root format generation cache
///
/// Detection runs once per bundle root; every factory built for the same
/// root afterwards reuses the stored decision so files of one bundle can
/// never be dispatched against two different rule sets.
#[derive(Debug, Default)]
pub struct GenerationCache {
    generations: DashMap<PathBuf, FormatGeneration>,
}

impl GenerationCache {
    pub fn new() -> Self {
        Self {
            generations: DashMap::new(),
        }
    }

    pub fn get(&self, root: &Path) -> Option<FormatGeneration> {
        self.generations.get(root).map(|r| *r)
    }

    /// Return the cached generation for `root`, running `detect` on a miss.
    ///
    /// The shard entry stays locked while `detect` runs, so concurrent callers
    /// for the same root wait for the first detection instead of repeating it.
    pub fn get_or_detect<F>(&self, root: &Path, detect: F) -> FormatGeneration
    where
        F: FnOnce(&Path) -> FormatGeneration,
    {
        if let Some(cached) = self.get(root) {
            return cached;
        }
        *self
            .generations
            .entry(root.to_path_buf())
            .or_insert_with(|| detect(root))
    }

    /// Pin a generation for `root`, replacing any earlier decision.
    pub fn insert(&self, root: PathBuf, generation: FormatGeneration) {
        self.generations.insert(root, generation);
    }

    /// Forget a root, e.g. after its bundle changed on disk.
    pub fn remove(&self, root: &Path) {
        self.generations.remove(root);
    }

    pub fn clear(&self) {
        self.generations.clear();
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        for entry in self.generations.iter() {
            stats.total_roots += 1;
            match *entry.value() {
                FormatGeneration::Classic => stats.classic_roots += 1,
                FormatGeneration::TsmLegacy => stats.tsm_legacy_roots += 1,
                FormatGeneration::TsmCurrent => stats.tsm_current_roots += 1,
            }
        }

        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_roots: usize,
    pub classic_roots: usize,
    pub tsm_legacy_roots: usize,
    pub tsm_current_roots: usize,
}
