//! Show command - print one record

use crate::cache::FileCache;
use crate::cli::args::ShowArgs;
use crate::error::CacheResult;

/// Execute the show command
pub fn execute(args: ShowArgs, cache: &FileCache) -> CacheResult<()> {
    let record = cache.load_raw(&args.name)?;

    let output = if args.value_only {
        serde_json::to_string_pretty(&record.value)?
    } else {
        serde_json::to_string_pretty(&record)?
    };
    println!("{}", output);

    Ok(())
}
