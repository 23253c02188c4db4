//! Load: config loading from file and environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::model::SiftConfig;

impl SiftConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SIFT_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/sift/sift.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))
    }

    /// Apply `SIFT_*` overrides. `lookup` is the environment in production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Colon-separated, like PATH
        if let Some(bundles) = lookup("SIFT_BUNDLES") {
            self.bundles = bundles
                .split(':')
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Some(chunk) = lookup("SIFT_HASH_CHUNK_SIZE") {
            self.hash.chunk_size = chunk
                .parse()
                .with_context(|| format!("SIFT_HASH_CHUNK_SIZE is not a number: {}", chunk))?;
        }
        if let Some(class) = lookup("SIFT_RUNNER_CLASS") {
            self.jobs.runner_class = class;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.hash.chunk_size == 0 {
            anyhow::bail!("hash.chunk_size must be > 0");
        }
        self.jobs.validate().map_err(anyhow::Error::msg)?;

        for bundle in &self.bundles {
            if !bundle.is_dir() {
                anyhow::bail!("Bundle root is not a directory: {}", bundle.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = SiftConfig::default();
        cfg.apply_env_overrides(env(&[
            ("SIFT_BUNDLES", "/a:/b::/c"),
            ("SIFT_HASH_CHUNK_SIZE", "4096"),
            ("SIFT_RUNNER_CLASS", "com.example.Runner"),
        ]))
        .unwrap();

        assert_eq!(cfg.bundles, vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]);
        assert_eq!(cfg.hash.chunk_size, 4096);
        assert_eq!(cfg.jobs.runner_class, "com.example.Runner");
    }

    #[test]
    fn test_bad_chunk_size_override() {
        let mut cfg = SiftConfig::default();
        let err = cfg.apply_env_overrides(env(&[("SIFT_HASH_CHUNK_SIZE", "big")])).unwrap_err();
        assert!(err.to_string().contains("SIFT_HASH_CHUNK_SIZE"));
    }

    #[test]
    fn test_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sift.toml");
        fs::write(&path, "[hash]\nchunk_size = 512\n").unwrap();

        let cfg = SiftConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.hash.chunk_size, 512);
    }

    #[test]
    fn test_validate() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = SiftConfig {
            bundles: vec![tmp.path().to_path_buf()],
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());

        cfg.bundles.push(tmp.path().join("missing"));
        assert!(cfg.validate().is_err());

        cfg.bundles.clear();
        cfg.hash.chunk_size = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("chunk_size"));
    }
}
