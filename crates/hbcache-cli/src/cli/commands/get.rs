//! `hbcache get` – fetch one object to a file or stdout.

use anyhow::{Context, Result};
use hbcache_core::binary_cache::BinaryCache;
use std::io::Write;
use std::path::Path;

pub fn run_get(cache: &dyn BinaryCache, path: &str, output: Option<&Path>) -> Result<()> {
    let Some(body) = cache.get_file(path)? else {
        anyhow::bail!("'{}' not found in {}", path, cache.uri());
    };
    match output {
        Some(out) => {
            std::fs::write(out, &body).with_context(|| format!("write {}", out.display()))?;
            tracing::info!("wrote {} bytes to {}", body.len(), out.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&body)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
