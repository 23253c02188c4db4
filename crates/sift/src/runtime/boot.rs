//! Boot: logging init, config load, processor construction.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bundle::artifact::{server_processors, ArtifactProcessor};
use crate::bundle::dispatch::ParserDispatcher;
use crate::bundle::hash::ArtifactHasher;
use crate::bundle::rules::RuleBook;
use crate::conf::SiftConfig;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Everything a run needs, built once at startup.
pub struct Sift {
    pub config: SiftConfig,
    /// Shared by every processor; holds one layout decision per root
    pub dispatcher: Arc<ParserDispatcher>,
    pub processors: Arc<[Arc<dyn ArtifactProcessor>]>,
}

/// Load and validate config, compile the dispatch rules and build the
/// artifact processors around one dispatcher.
pub fn boot() -> Result<Sift> {
    info!("Starting sift v{}", env!("CARGO_PKG_VERSION"));

    let config = SiftConfig::load()?;
    config.validate().context("Invalid configuration")?;
    info!(
        "Loaded configuration: bundles={}, hash.chunk_size={}",
        config.bundles.len(),
        config.hash.chunk_size
    );

    let rules = Arc::new(RuleBook::standard().context("Failed to compile dispatch rules")?);
    let hasher = ArtifactHasher::new(config.hash.chunk_size);
    let dispatcher = Arc::new(ParserDispatcher::new(rules));
    let processors: Arc<[Arc<dyn ArtifactProcessor>]> = server_processors(Arc::clone(&dispatcher), hasher)
        .context("Failed to build artifact processors")?
        .into();

    for processor in processors.iter() {
        info!(
            artifact_type = processor.artifact_type(),
            collections = ?processor.required_collections(),
            "Registered artifact processor"
        );
    }

    Ok(Sift {
        config,
        dispatcher,
        processors,
    })
}
