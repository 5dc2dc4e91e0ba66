//! Remove command - evict individual records

use crate::cache::FileCache;
use crate::cli::args::RemoveArgs;
use crate::error::CacheResult;
use console::style;
use tracing::debug;

/// Execute the remove command
pub fn execute(args: RemoveArgs, cache: &FileCache) -> CacheResult<()> {
    for name in &args.names {
        if !cache.contains(name)? {
            debug!("Record {} not present, nothing to remove", name);
            println!("{} {} (not present)", style("○").dim(), name);
            continue;
        }

        cache.remove(name)?;
        println!("{} removed {}", style("✓").green(), name);
    }

    Ok(())
}
