//! Key command - compute the record name of a call

use crate::cache::{Args, FileCache};
use crate::cli::args::KeyArgs;
use crate::error::{CacheError, CacheResult};
use console::style;
use serde_json::{Map, Value};
use std::convert::Infallible;

/// Execute the key command
pub fn execute(args: KeyArgs, cache: &FileCache) -> CacheResult<()> {
    let call = parse_call(&args.args, &args.named)?;

    // Only the naming half of the wrapper is used; the operation never runs
    let probe = cache
        .wrap(args.identity.as_str(), |_: Args| Ok::<Value, Infallible>(Value::Null))
        .exclude_first(args.exclude_first);
    let name = probe.record_name(&call)?;

    let status = if cache.contains(&name)? {
        style("cached").green()
    } else {
        style("not cached").dim()
    };
    println!("{} [{}]", name, status);

    Ok(())
}

/// Parse positional JSON values and KEY=JSON pairs into call arguments
fn parse_call(positional: &[String], named: &[String]) -> CacheResult<Args> {
    let values = positional
        .iter()
        .map(|raw| parse_json(raw))
        .collect::<CacheResult<Vec<_>>>()?;

    let mut pairs = Map::new();
    for item in named {
        let (key, raw) = item
            .split_once('=')
            .ok_or_else(|| CacheError::User(format!("expected KEY=JSON, got {:?}", item)))?;
        pairs.insert(key.to_string(), parse_json(raw)?);
    }

    Ok(Args::from_values(values, pairs))
}

fn parse_json(raw: &str) -> CacheResult<Value> {
    serde_json::from_str(raw)
        .map_err(|e| CacheError::User(format!("argument {:?} is not valid JSON: {}", raw, e)))
}
