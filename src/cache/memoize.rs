//! Memoizing wrapper around an operation
//!
//! [`Memoized`] owns an operation and a cache handle. Each call derives a
//! record name `{identity}-{fingerprint}` from the arguments; if that
//! record exists it is decoded and returned without running the
//! operation, otherwise the operation runs and its result is stored.
//!
//! Errors from the operation itself pass through untouched as
//! [`MemoizeError::Operation`]. A hit whose record cannot be decoded fails
//! loudly instead of recomputing.

use super::args::Arguments;
use super::file_cache::FileCache;
use super::fingerprint::{self, Fingerprint};
use super::record;
use crate::error::{CacheError, CacheResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

/// How a memoized call decides whether its record exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lookup {
    /// Check the single expected record file
    #[default]
    Probe,
    /// List the whole cache directory and search it (O(n) per call)
    Listing,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe => write!(f, "probe"),
            Self::Listing => write!(f, "listing"),
        }
    }
}

/// Strategy turning call arguments into a fingerprint
///
/// Must be deterministic: equal inputs always give equal fingerprints.
/// Closures with the matching signature implement it.
pub trait KeyFn {
    fn fingerprint(
        &self,
        positional: &[Value],
        named: &Map<String, Value>,
    ) -> CacheResult<Fingerprint>;
}

/// Default key function: SHA-256 over the canonical argument text
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Key;

impl KeyFn for Sha256Key {
    fn fingerprint(
        &self,
        positional: &[Value],
        named: &Map<String, Value>,
    ) -> CacheResult<Fingerprint> {
        Ok(fingerprint::derive(positional, named))
    }
}

impl<F> KeyFn for F
where
    F: Fn(&[Value], &Map<String, Value>) -> CacheResult<Fingerprint>,
{
    fn fingerprint(
        &self,
        positional: &[Value],
        named: &Map<String, Value>,
    ) -> CacheResult<Fingerprint> {
        self(positional, named)
    }
}

/// Failure of a memoized call
#[derive(Debug)]
pub enum MemoizeError<E> {
    /// The wrapped operation failed; nothing was stored
    Operation(E),
    /// Key derivation or reading a hit failed
    Cache(CacheError),
}

impl<E> MemoizeError<E> {
    /// The operation's own error, if that is what failed
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Cache(_) => None,
        }
    }

    pub fn is_cache(&self) -> bool {
        matches!(self, Self::Cache(_))
    }
}

impl<E: fmt::Display> fmt::Display for MemoizeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operation(e) => write!(f, "{}", e),
            Self::Cache(e) => write!(f, "{}", e),
        }
    }
}

impl<E> std::error::Error for MemoizeError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Cache(e) => Some(e),
        }
    }
}

impl<E> From<CacheError> for MemoizeError<E> {
    fn from(e: CacheError) -> Self {
        Self::Cache(e)
    }
}

/// An operation whose results are cached on disk
///
/// Built by [`FileCache::wrap`]:
///
/// ```no_run
/// use filecache::FileCache;
/// use std::convert::Infallible;
///
/// let cache = FileCache::open("/var/tmp/filecache-demo")?;
/// let square = cache.wrap("square", |(n,): (u64,)| Ok::<_, Infallible>(n * n));
///
/// assert_eq!(square.call((12,)).unwrap(), 144);
/// # Ok::<(), filecache::CacheError>(())
/// ```
pub struct Memoized<F, K = Sha256Key> {
    cache: FileCache,
    identity: String,
    operation: F,
    key_fn: K,
    exclude_first: bool,
    lookup: Lookup,
}

impl<F> Memoized<F> {
    pub(crate) fn new(cache: FileCache, identity: String, operation: F) -> Self {
        let lookup = cache.lookup();
        Self {
            cache,
            identity,
            operation,
            key_fn: Sha256Key,
            exclude_first: false,
            lookup,
        }
    }
}

impl<F, K> Memoized<F, K> {
    /// Leave the first positional argument out of the fingerprint
    pub fn exclude_first(mut self, exclude: bool) -> Self {
        self.exclude_first = exclude;
        self
    }

    /// Override the hit detection strategy inherited from the cache
    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Replace the key function
    pub fn key_fn<K2: KeyFn>(self, key_fn: K2) -> Memoized<F, K2> {
        Memoized {
            cache: self.cache,
            identity: self.identity,
            operation: self.operation,
            key_fn,
            exclude_first: self.exclude_first,
            lookup: self.lookup,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }
}

impl<F, K: KeyFn> Memoized<F, K> {
    /// Record name a call with `args` maps to
    pub fn record_name<A: Arguments + ?Sized>(&self, args: &A) -> CacheResult<String> {
        let skip = usize::from(self.exclude_first);
        let positional = args.positional_keys(skip)?;
        let named = args.named_keys()?;
        let key = self.key_fn.fingerprint(&positional, &named)?;
        Ok(format!("{}-{}", self.identity, key))
    }

    /// Call the operation, or return its stored result
    pub fn call<A, R, E>(&self, args: A) -> Result<R, MemoizeError<E>>
    where
        A: Arguments,
        F: Fn(A) -> Result<R, E>,
        R: Serialize + DeserializeOwned,
    {
        let name = self.record_name(&args)?;

        if self.cache.has_record(&name, self.lookup)? {
            debug!("Cache hit for {}", name);
            return Ok(self.cache.load(&name)?);
        }

        debug!("Cache miss for {}, computing", name);
        let value = (self.operation)(args).map_err(MemoizeError::Operation)?;

        // The caller still gets the value when it cannot be stored
        let stored = record::verify_round_trip(&name, &value)
            .and_then(|()| self.cache.store(&name, &value));
        if let Err(e) = stored {
            warn!("Failed to store result for {}: {}", name, e);
        }

        Ok(value)
    }
}

impl<F, K: fmt::Debug> fmt::Debug for Memoized<F, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("identity", &self.identity)
            .field("root", &self.cache.path())
            .field("key_fn", &self.key_fn)
            .field("exclude_first", &self.exclude_first)
            .field("lookup", &self.lookup)
            .finish()
    }
}
