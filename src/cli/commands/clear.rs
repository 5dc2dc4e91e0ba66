//! Clear command - evict all records or those older than a date

use crate::cache::{local_midnight, FileCache, RecordInfo};
use crate::cli::args::ClearArgs;
use crate::error::CacheResult;
use chrono::{DateTime, NaiveDate, Utc};
use console::style;
use std::io::{self, Write};

/// Execute the clear command
pub fn execute(args: ClearArgs, cache: &FileCache) -> CacheResult<()> {
    let candidates = select_records(cache, args.before)?;

    if candidates.is_empty() {
        match args.before {
            Some(date) => println!("No records older than {}.", date),
            None => println!("No records to clear."),
        }
        return Ok(());
    }

    match args.before {
        Some(date) => println!(
            "Found {} record(s) last modified before {}:",
            candidates.len(),
            date
        ),
        None => println!("This will remove {} record(s):", candidates.len()),
    }
    for record in &candidates {
        println!("  {} {}", style("•").red(), record.name);
    }

    if args.dry_run {
        println!();
        println!("Dry run - no records removed.");
        return Ok(());
    }

    if !args.yes && !confirm()? {
        return Ok(());
    }

    print!("Removing records... ");
    let _ = io::stdout().flush();

    let removed = cache.clear(args.before)?;

    println!("{} removed {} record(s)", style("✓").green(), removed.len());

    Ok(())
}

/// Records that a clear with `before` would remove
fn select_records(cache: &FileCache, before: Option<NaiveDate>) -> CacheResult<Vec<RecordInfo>> {
    let records = cache.entries()?;
    let Some(date) = before else {
        return Ok(records);
    };

    let cutoff: DateTime<Utc> = local_midnight(date)?.into();
    Ok(records.into_iter().filter(|r| r.modified < cutoff).collect())
}

fn confirm() -> CacheResult<bool> {
    println!();
    print!("Are you sure? [y/N] ");
    let _ = io::stdout().flush();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        println!("Failed to read input, aborting.");
        return Ok(false);
    }

    if !input.trim().eq_ignore_ascii_case("y") {
        println!("Aborted.");
        return Ok(false);
    }

    Ok(true)
}
