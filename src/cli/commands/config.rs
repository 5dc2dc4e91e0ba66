//! Config command - show or edit configuration

use crate::cache::Lookup;
use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LogFormat};
use crate::error::{CacheError, CacheResult};
use console::style;
use std::path::PathBuf;

/// Execute the config command
pub fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> CacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force)?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value)?,
    }

    Ok(())
}

fn show_config(config: &Config) -> CacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

fn init_config(manager: &ConfigManager, force: bool) -> CacheResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!(
            "{} Config already exists at {} - use --force to overwrite",
            style("[WARN]").yellow(),
            path.display()
        );
        return Ok(());
    }

    manager.save(&Config::default())?;
    println!(
        "{} Configuration initialized ({})",
        style("[OK]").green(),
        path.display()
    );

    Ok(())
}

fn set_value(manager: &ConfigManager, config: &Config, key: &str, value: &str) -> CacheResult<()> {
    let mut config = config.clone();
    apply_value(&mut config, key, value)?;

    manager.save(&config)?;
    println!("{} Set {} = {}", style("[OK]").green(), key, value);

    Ok(())
}

/// Apply a dot-separated `key` assignment to `config`
fn apply_value(config: &mut Config, key: &str, value: &str) -> CacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["cache", "dir"] => {
            config.cache.dir = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            }
        }
        ["cache", "lookup"] => config.cache.lookup = parse_lookup(value)?,
        ["logging", "format"] => config.logging.format = parse_log_format(value)?,
        _ => {
            return Err(CacheError::User(format!(
                "Unknown config key: {} (valid keys: cache.dir, cache.lookup, logging.format)",
                key
            )))
        }
    }

    Ok(())
}

fn parse_lookup(value: &str) -> CacheResult<Lookup> {
    match value.to_lowercase().as_str() {
        "probe" => Ok(Lookup::Probe),
        "listing" => Ok(Lookup::Listing),
        _ => Err(CacheError::User(format!(
            "Invalid lookup: {} (use probe or listing)",
            value
        ))),
    }
}

fn parse_log_format(value: &str) -> CacheResult<LogFormat> {
    match value.to_lowercase().as_str() {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => Err(CacheError::User(format!(
            "Invalid log format: {} (use text or json)",
            value
        ))),
    }
}
