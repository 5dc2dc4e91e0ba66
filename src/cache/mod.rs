//! Filesystem-backed memoization cache
//!
//! Memoizes deterministic operations by persisting their results under a
//! fingerprint of their arguments. Same arguments = same record.
//!
//! # Layout
//!
//! - Records live in one directory as `{identity}-{fingerprint}.cache`
//! - Fingerprints are SHA-256 over a canonical JSON rendering of the arguments
//! - Record files are versioned JSON envelopes (see [`record`])
//!
//! # Call Protocol
//!
//! | Record | Action | Operation runs |
//! |--------|--------|----------------|
//! | Present | Decode and return | No |
//! | Absent | Run, store, return | Yes |
//! | Corrupt | Fail with a storage error | No |
//!
//! There is no locking. Two processes missing on the same fingerprint both
//! compute and the last rename wins; records are never observed half written.

pub mod args;
mod faithful;
pub mod file_cache;
pub mod fingerprint;
pub mod memoize;
pub mod record;
pub mod store;

pub use args::{Arguments, Args, Unkeyed};
pub use file_cache::{local_midnight, FileCache};
pub use fingerprint::{derive, Fingerprint};
pub use memoize::{KeyFn, Lookup, MemoizeError, Memoized, Sha256Key};
pub use record::{Record, RECORD_FORMAT, RECORD_VERSION};
pub use store::{RecordInfo, RecordStore, RECORD_EXTENSION};
