//! `hbcache exists` – HEAD probe for one object.

use anyhow::Result;
use hbcache_core::binary_cache::BinaryCache;

pub fn run_exists(cache: &dyn BinaryCache, path: &str) -> Result<()> {
    let present = cache.file_exists(path)?;
    println!("{}", if present { "present" } else { "absent" });
    Ok(())
}
