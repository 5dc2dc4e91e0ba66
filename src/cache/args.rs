//! Call arguments as seen by the fingerprint deriver
//!
//! A memoized operation takes a single argument value implementing
//! [`Arguments`]. Tuples of serializable values cover plain positional
//! calls; [`Args`] adds named arguments; [`Unkeyed`] marks a leading
//! receiver that must stay out of the key.

use super::fingerprint::to_key_value;
use crate::error::{CacheError, CacheResult};
use serde::de::DeserializeOwned;
use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::{Map, Value};
use std::ops::Deref;

/// Arguments of a memoized call
pub trait Arguments {
    /// Key values of the positional arguments, skipping the first `skip`
    ///
    /// Skipped arguments are never serialized.
    fn positional_keys(&self, skip: usize) -> CacheResult<Vec<Value>>;

    /// Key values of the named arguments
    fn named_keys(&self) -> CacheResult<Map<String, Value>> {
        Ok(Map::new())
    }
}

impl Arguments for () {
    fn positional_keys(&self, _skip: usize) -> CacheResult<Vec<Value>> {
        Ok(Vec::new())
    }
}

macro_rules! tuple_arguments {
    ($($idx:tt $ty:ident),+) => {
        impl<$($ty: Serialize),+> Arguments for ($($ty,)+) {
            fn positional_keys(&self, skip: usize) -> CacheResult<Vec<Value>> {
                let mut values = Vec::new();
                $(
                    if !(0..skip).contains(&$idx) {
                        values.push(to_key_value(&self.$idx)?);
                    }
                )+
                Ok(values)
            }
        }
    };
}

tuple_arguments!(0 A);
tuple_arguments!(0 A, 1 B);
tuple_arguments!(0 A, 1 B, 2 C);
tuple_arguments!(0 A, 1 B, 2 C, 3 D);
tuple_arguments!(0 A, 1 B, 2 C, 3 D, 4 E);
tuple_arguments!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
tuple_arguments!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
tuple_arguments!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);

/// Positional and named arguments held as key values
///
/// ```
/// use filecache::cache::Args;
///
/// let args = Args::new().arg(&3)?.named("scale", &1.5)?;
/// assert_eq!(args.get::<u32>(0)?, 3);
/// assert_eq!(args.get_named::<f64>("scale")?, 1.5);
/// # Ok::<(), filecache::CacheError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: Map<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-converted values
    pub fn from_values(positional: Vec<Value>, named: Map<String, Value>) -> Self {
        Self { positional, named }
    }

    /// Append a positional argument
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> CacheResult<Self> {
        self.positional.push(to_key_value(value)?);
        Ok(self)
    }

    /// Set a named argument, replacing any previous value for `key`
    pub fn named<T: Serialize + ?Sized>(
        mut self,
        key: impl Into<String>,
        value: &T,
    ) -> CacheResult<Self> {
        self.named.insert(key.into(), to_key_value(value)?);
        Ok(self)
    }

    /// Decode the positional argument at `index`
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> CacheResult<T> {
        let value = self.positional.get(index).ok_or_else(|| {
            CacheError::User(format!("missing positional argument {}", index))
        })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Decode the named argument `key`
    pub fn get_named<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        let value = self
            .named
            .get(key)
            .ok_or_else(|| CacheError::User(format!("missing named argument {}", key)))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    pub fn named_values(&self) -> &Map<String, Value> {
        &self.named
    }
}

impl Arguments for Args {
    fn positional_keys(&self, skip: usize) -> CacheResult<Vec<Value>> {
        Ok(self.positional.iter().skip(skip).cloned().collect())
    }

    fn named_keys(&self) -> CacheResult<Map<String, Value>> {
        Ok(self.named.clone())
    }
}

/// A value that can never be part of a cache key
///
/// Put a receiver that has no serializable form in the first tuple slot
/// and wrap with `exclude_first(true)`; if it ever reaches the deriver the
/// call fails with a derivation error.
#[derive(Debug, Clone, Copy)]
pub struct Unkeyed<T>(pub T);

impl<T> Serialize for Unkeyed<T> {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("unkeyed argument cannot be part of a cache key"))
    }
}

impl<T> Deref for Unkeyed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}
