//! filecache - memoization cache inspector
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use filecache::cli::{Cli, Commands};
use filecache::config::{ConfigManager, LogFormat};
use filecache::error::CacheResult;
use filecache::FileCache;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load()?;

    init_logging(cli.verbose, config.logging.format);
    debug!("Using config {}", config_manager.path().display());

    // Config command doesn't need a cache directory
    if let Commands::Config(args) = cli.command {
        return filecache::cli::commands::config(args, &config, &config_manager);
    }

    let dir = ConfigManager::resolve_cache_dir(&config, cli.dir.as_deref())?;
    debug!("Using cache directory {}", dir.display());
    let cache = FileCache::open(dir)?.with_lookup(config.cache.lookup);

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::List(args) => filecache::cli::commands::list(args, &cache),
        Commands::Show(args) => filecache::cli::commands::show(args, &cache),
        Commands::Remove(args) => filecache::cli::commands::remove(args, &cache),
        Commands::Clear(args) => filecache::cli::commands::clear(args, &cache),
        Commands::Key(args) => filecache::cli::commands::key(args, &cache),
    }
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug; RUST_LOG wins when set
fn init_logging(verbose: u8, format: LogFormat) {
    let default = match verbose {
        0 => "filecache=warn",
        1 => "filecache=info",
        _ => "filecache=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}
