//! `hbcache info` – show the attributes of a validated cache.

use anyhow::Result;
use hbcache_core::binary_cache::BinaryCache;

pub fn run_info(cache: &dyn BinaryCache) -> Result<()> {
    let settings = cache.settings();
    println!("URI:           {}", cache.uri());
    println!("WantMassQuery: {}", u8::from(settings.want_mass_query));
    println!("Priority:      {}", settings.priority);
    Ok(())
}
