//! filecache - Filesystem-backed memoization
//!
//! Persists the results of deterministic operations under a fingerprint
//! of their arguments, so repeated calls load the stored result instead
//! of recomputing it.
//!
//! ```no_run
//! use filecache::FileCache;
//! use std::convert::Infallible;
//!
//! let cache = FileCache::open("/var/tmp/reports")?;
//! let report = cache.wrap("report", |(year, region): (u16, String)| {
//!     Ok::<_, Infallible>(format!("{} report for {}", year, region))
//! });
//!
//! let first = report.call((2024, "emea".to_string())).unwrap();
//! let again = report.call((2024, "emea".to_string())).unwrap(); // loaded from disk
//! assert_eq!(first, again);
//! # Ok::<(), filecache::CacheError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;

pub use cache::{Args, FileCache, Fingerprint, Lookup, MemoizeError, Memoized, Unkeyed};
pub use error::{CacheError, CacheResult};
