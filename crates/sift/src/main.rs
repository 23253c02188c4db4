use std::path::PathBuf;

use sift::runtime::{boot, run};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    boot::init_logging();
    let sift = boot::boot()?;

    // Bundle roots on the command line replace the configured list.
    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let roots = if args.is_empty() { sift.config.bundles.clone() } else { args };
    if roots.is_empty() {
        anyhow::bail!("No bundles to process: pass bundle roots or set SIFT_BUNDLES");
    }

    let results = run::process_bundles(sift.processors, roots).await;
    info!(stats = ?sift.dispatcher.cache().stats(), "Layout decisions");

    // Failures were already logged by the run.
    let mut failed = 0;
    for (_, result) in &results {
        match result {
            Ok(report) => println!("{}", serde_json::to_string(report)?),
            Err(_) => failed += 1,
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} bundles failed", failed, results.len());
    }
    Ok(())
}
