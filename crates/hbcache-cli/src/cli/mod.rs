//! CLI for the hbcache binary cache client.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hbcache_core::binary_cache::BinaryCache;
use hbcache_core::config::{self, HbcacheConfig};
use hbcache_core::registry::{RegistryContext, StoreRegistry};
use hbcache_core::validation_cache::{
    MemoryValidationCache, SqliteValidationCache, ValidationCache,
};
use std::path::PathBuf;
use std::sync::Arc;

use commands::{run_exists, run_get, run_info, run_put};

/// Top-level CLI for hbcache.
#[derive(Debug, Parser)]
#[command(name = "hbcache")]
#[command(about = "hbcache: read-only HTTP binary cache client", long_about = None)]
pub struct Cli {
    /// Do not read or record validated endpoints on disk.
    #[arg(long, global = true)]
    pub no_disk_cache: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Validate a cache endpoint and show its attributes.
    Info {
        /// HTTP/HTTPS URI of the binary cache.
        uri: String,
    },

    /// Check whether an object exists in the cache.
    Exists {
        /// HTTP/HTTPS URI of the binary cache.
        uri: String,
        /// Object path relative to the cache root (e.g. `<hash>.narinfo`).
        path: String,
    },

    /// Fetch an object from the cache.
    Get {
        /// HTTP/HTTPS URI of the binary cache.
        uri: String,
        /// Object path relative to the cache root.
        path: String,
        /// Write the object here instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Upload an object (HTTP caches are read-only; this always fails).
    Put {
        /// HTTP/HTTPS URI of the binary cache.
        uri: String,
        /// Object path relative to the cache root.
        path: String,
        /// Local file holding the object data.
        file: PathBuf,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Info { uri } => {
                let cache = open_cache(&uri, &cfg, cli.no_disk_cache)?;
                run_info(cache.as_ref())?
            }
            CliCommand::Exists { uri, path } => {
                let cache = open_cache(&uri, &cfg, cli.no_disk_cache)?;
                run_exists(cache.as_ref(), &path)?
            }
            CliCommand::Get { uri, path, output } => {
                let cache = open_cache(&uri, &cfg, cli.no_disk_cache)?;
                run_get(cache.as_ref(), &path, output.as_deref())?
            }
            CliCommand::Put { uri, path, file } => {
                let cache = open_cache(&uri, &cfg, cli.no_disk_cache)?;
                run_put(cache.as_ref(), &path, &file)?
            }
        }

        Ok(())
    }
}

fn validation_cache(cfg: &HbcacheConfig, no_disk_cache: bool) -> Result<Arc<dyn ValidationCache>> {
    if no_disk_cache {
        return Ok(Arc::new(MemoryValidationCache::new()));
    }
    let db = match &cfg.validation_db {
        Some(path) => SqliteValidationCache::open_at(path)?,
        None => SqliteValidationCache::open_default()?,
    };
    Ok(Arc::new(db))
}

/// Open and validate the cache at `uri` through the backend registry.
fn open_cache(uri: &str, cfg: &HbcacheConfig, no_disk_cache: bool) -> Result<Box<dyn BinaryCache>> {
    let ctx = RegistryContext::from_config(cfg, validation_cache(cfg, no_disk_cache)?);
    let cache = StoreRegistry::with_defaults()
        .open(uri, &cfg.cache_params(), &ctx)
        .with_context(|| format!("opening binary cache {uri}"))?;
    Ok(cache)
}

#[cfg(test)]
mod tests;
