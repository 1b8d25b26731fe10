//! Local data cache commands

use anyhow::{Context, Result};
use mtdb_client::config::CacheConfig;
use mtdb_client::{clear_cache, DataCache};

use crate::output::OutputContext;

pub fn cache_info(cache: &CacheConfig, ctx: &OutputContext) -> Result<()> {
    let path = cache.path();
    let exists = path.exists();
    let entries = if exists {
        DataCache::open(path.clone(), cache.ttl())
            .with_context(|| format!("Failed to open cache at {}", path.display()))?
            .len()
    } else {
        0
    };

    ctx.print_kv(&[
        ("path", path.display().to_string()),
        ("enabled", cache.enabled.to_string()),
        ("persist", cache.persist.to_string()),
        ("exists", exists.to_string()),
        ("entries", entries.to_string()),
        ("ttl_secs", cache.ttl_secs.to_string()),
    ]);
    Ok(())
}

pub fn cache_clear(cache: &CacheConfig, ctx: &OutputContext) -> Result<()> {
    let removed = clear_cache(cache.resolved_dir(), &cache.name).context("Failed to clear cache")?;
    if removed {
        ctx.success(&format!("Removed {}", cache.path().display()));
    } else {
        ctx.info("No cache to clear");
    }
    Ok(())
}
