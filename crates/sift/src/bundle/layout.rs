//! Layout: decide which on-disk format generation a bundle uses.
//!
//! Detection looks at directory names only and never fails: anything that
//! cannot be enumerated counts as "not present", so an unreadable or empty
//! root ends up as [`FormatGeneration::Classic`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Nested directory prefix written by the TSM administration agent.
pub const AGENT_LOG_PREFIX: &str = "tabadminagent_";

/// Top-level directory suffix (case-insensitive) of current TSM bundles.
pub const CURRENT_NODE_SUFFIX: &str = "node1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatGeneration {
    /// Pre-TSM layout, one directory per server component
    Classic,
    /// TSM layout without node-ordinal directory names
    TsmLegacy,
    /// TSM layout with `nodeN` host directories
    TsmCurrent,
}

impl FormatGeneration {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatGeneration::Classic => "classic",
            FormatGeneration::TsmLegacy => "tsm_legacy",
            FormatGeneration::TsmCurrent => "tsm_current",
        }
    }

    pub fn is_tsm(&self) -> bool {
        !matches!(self, FormatGeneration::Classic)
    }
}

/// Directory-name evidence gathered from one scan of a bundle root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutScan {
    /// Some top-level directory holds a `tabadminagent_*` subdirectory.
    pub agent_logs: bool,
    /// Some top-level directory name ends with `node1`.
    pub node1: bool,
}

impl LayoutScan {
    pub fn scan(root: &Path) -> Self {
        let mut scan = LayoutScan::default();

        for dir in subdirectories(root) {
            if !scan.node1 && dir_name(&dir).is_some_and(has_node1_suffix) {
                scan.node1 = true;
            }
            if !scan.agent_logs && has_agent_logs(&dir) {
                scan.agent_logs = true;
            }
            if scan.agent_logs && scan.node1 {
                break;
            }
        }

        scan
    }

    /// The decision table.
    ///
    /// | agent_logs | node1 | generation |
    /// |------------|-------|------------|
    /// | no         | any   | Classic    |
    /// | yes        | no    | TsmLegacy  |
    /// | yes        | yes   | TsmCurrent |
    pub fn generation(&self) -> FormatGeneration {
        match (self.agent_logs, self.node1) {
            (false, _) => FormatGeneration::Classic,
            (true, false) => FormatGeneration::TsmLegacy,
            (true, true) => FormatGeneration::TsmCurrent,
        }
    }
}

pub fn detect(root: &Path) -> FormatGeneration {
    let scan = LayoutScan::scan(root);
    let generation = scan.generation();
    debug!(
        root = %root.display(),
        agent_logs = scan.agent_logs,
        node1 = scan.node1,
        generation = generation.as_str(),
        "Detected bundle layout"
    );
    generation
}

fn has_agent_logs(dir: &Path) -> bool {
    subdirectories(dir)
        .iter()
        .filter_map(|nested| dir_name(nested))
        .any(|name| name.starts_with(AGENT_LOG_PREFIX))
}

fn has_node1_suffix(name: &str) -> bool {
    name.to_lowercase().ends_with(CURRENT_NODE_SUFFIX)
}

pub(crate) fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Cannot enumerate directory");
            return Vec::new();
        }
    };

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect()
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}
