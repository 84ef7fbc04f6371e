//! `hbcache put` – attempt an upload; HTTP caches reject it.

use anyhow::{Context, Result};
use hbcache_core::binary_cache::BinaryCache;
use std::path::Path;

pub fn run_put(cache: &dyn BinaryCache, path: &str, file: &Path) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("read {}", file.display()))?;
    cache.upsert_file(path, &data)?;
    println!("uploaded {} ({} bytes)", path, data.len());
    Ok(())
}
