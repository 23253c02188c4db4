//! Model: SiftConfig and related structs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bundle::hash::DEFAULT_CHUNK_SIZE;
use crate::jobs::model::Severity;

/// Class of the backgrounder component that logs job start/end lines.
pub const DEFAULT_RUNNER_CLASS: &str = "com.tableausoftware.backgrounder.runner.BackgroundJobRunner";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Bundle roots processed by a batch run
    pub bundles: Vec<PathBuf>,
    pub hash: HashConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub runner_class: String,
    /// Classes left out of time-window slices
    pub ignored_classes: Vec<String>,
    /// Severities a job start/end line can carry
    pub severities: Vec<Severity>,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            runner_class: DEFAULT_RUNNER_CLASS.to_string(),
            ignored_classes: vec![
                "org.apache.zookeeper.ZooKeeper".to_string(),
                "org.apache.zookeeper.ClientCnxn".to_string(),
                "org.apache.curator.framework.imps.CuratorFrameworkImpl".to_string(),
                "org.apache.curator.framework.state.ConnectionStateManager".to_string(),
                "com.tableausoftware.core.configuration.ConfigurationSupportService".to_string(),
            ],
            severities: vec![Severity::Info, Severity::Error],
        }
    }
}

impl JobsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.runner_class.is_empty() {
            return Err("jobs.runner_class must not be empty".to_string());
        }
        if self.severities.is_empty() {
            return Err("jobs.severities must list at least one severity".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ─────────────────────────────────────────────────

    #[test]
    fn test_default_has_no_bundles() {
        let cfg = SiftConfig::default();
        assert!(cfg.bundles.is_empty());
    }

    #[test]
    fn test_default_chunk_size() {
        let cfg = SiftConfig::default();
        assert_eq!(cfg.hash.chunk_size, 64 * 1024);
    }

    #[test]
    fn test_default_jobs() {
        let jobs = JobsConfig::default();
        assert_eq!(jobs.runner_class, DEFAULT_RUNNER_CLASS);
        assert_eq!(jobs.severities, vec![Severity::Info, Severity::Error]);
        assert!(!jobs.ignored_classes.is_empty());
        assert!(jobs.validate().is_ok());
    }

    // ── Validation ───────────────────────────────────────────────

    #[test]
    fn test_jobs_validate_rejects_empty_runner_class() {
        let jobs = JobsConfig {
            runner_class: String::new(),
            ..Default::default()
        };
        let err = jobs.validate().unwrap_err();
        assert!(err.contains("runner_class"), "Error should mention runner_class: {}", err);
    }

    #[test]
    fn test_jobs_validate_rejects_no_severities() {
        let jobs = JobsConfig {
            severities: vec![],
            ..Default::default()
        };
        assert!(jobs.validate().unwrap_err().contains("severities"));
    }

    // ── Deserialization ──────────────────────────────────────────

    #[test]
    fn test_deserialize_partial_toml() {
        let toml_str = r#"
            bundles = ["/data/bundle-a", "/data/bundle-b"]

            [jobs]
            severities = ["INFO", "ERROR", "FATAL"]
        "#;
        let cfg: SiftConfig = toml::from_str(toml_str).expect("Should accept partial TOML");
        assert_eq!(cfg.bundles.len(), 2);
        assert_eq!(cfg.jobs.severities, vec![Severity::Info, Severity::Error, Severity::Fatal]);
        assert_eq!(cfg.jobs.runner_class, DEFAULT_RUNNER_CLASS); // default
        assert_eq!(cfg.hash.chunk_size, DEFAULT_CHUNK_SIZE); // default
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let toml_str = r#"
            [jobs]
            severities = ["LOUD"]
        "#;
        assert!(toml::from_str::<SiftConfig>(toml_str).is_err());
    }
}
