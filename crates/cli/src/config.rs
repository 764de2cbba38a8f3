use anyhow::{Context, Result};
use tracing::debug;

use fasync_core::{load_dotenv, FasyncConfig};

/// Load config from the given path, or from defaults plus environment
/// variables. A `--workers` flag wins over both.
pub fn load(path: Option<&str>, workers: Option<usize>) -> Result<FasyncConfig> {
    load_dotenv();

    let mut config = match path {
        Some(p) => {
            debug!(path = p, "Loading config");
            FasyncConfig::from_file(p).with_context(|| format!("failed to load config: {p}"))?
        }
        None => FasyncConfig::from_env().context("invalid configuration in environment")?,
    };

    if let Some(n) = workers {
        config.scheduler.worker_threads = Some(n);
    }
    Ok(config)
}
