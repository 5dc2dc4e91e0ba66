//! List command - show cached records

use crate::cache::{FileCache, RecordInfo};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::error::CacheResult;
use chrono::Local;
use console::style;

/// Execute the list command
pub fn execute(args: ListArgs, cache: &FileCache) -> CacheResult<()> {
    let records = cache.entries()?;

    if records.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => println!("No cached records in {}", cache.path().display()),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&records),
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Plain => print_plain(&records),
    }

    Ok(())
}

fn print_table(records: &[RecordInfo]) {
    println!(
        "{:<90} {:>10} {:<17}",
        style("NAME").bold(),
        style("SIZE").bold(),
        style("MODIFIED").bold()
    );
    println!("{}", "-".repeat(119));

    for record in records {
        let modified = record
            .modified
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        println!(
            "{:<90} {:>10} {:<17}",
            record.name,
            human_size(record.size),
            style(modified).dim()
        );
    }

    println!();
    println!("Total: {} record(s)", records.len());
}

fn print_json(records: &[RecordInfo]) -> CacheResult<()> {
    #[derive(serde::Serialize)]
    struct RecordJson<'a> {
        name: &'a str,
        size: u64,
        modified: String,
    }

    let json_records: Vec<RecordJson> = records
        .iter()
        .map(|r| RecordJson {
            name: &r.name,
            size: r.size,
            modified: r.modified.to_rfc3339(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_records)?);
    Ok(())
}

fn print_plain(records: &[RecordInfo]) {
    for record in records {
        println!("{}", record.name);
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
