//! Cache handle tying the record store, codec and memoizer together

use super::memoize::{Lookup, Memoized};
use super::record::{self, Record};
use super::store::{RecordInfo, RecordStore};
use crate::error::{CacheError, CacheResult};
use chrono::{Local, NaiveDate, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

/// Handle to one cache directory
///
/// Cheap to clone; clones share the same directory. Every memoized
/// operation wrapped from a handle stores its records in that directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    store: RecordStore,
    lookup: Lookup,
}

impl FileCache {
    /// Open a cache at `path`, creating the directory if missing
    pub fn open(path: impl Into<PathBuf>) -> CacheResult<Self> {
        Ok(Self {
            store: RecordStore::new(path)?,
            lookup: Lookup::default(),
        })
    }

    /// Set the hit detection strategy used by operations wrapped afterwards
    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn lookup(&self) -> Lookup {
        self.lookup
    }

    pub fn path(&self) -> &Path {
        self.store.root()
    }

    pub fn records(&self) -> &RecordStore {
        &self.store
    }

    /// Wrap `operation` so its results are memoized under `identity`
    ///
    /// `identity` prefixes every record name; give each distinct
    /// operation its own.
    pub fn wrap<F>(&self, identity: impl Into<String>, operation: F) -> Memoized<F> {
        Memoized::new(self.clone(), identity.into(), operation)
    }

    /// Store `value` as record `name`
    pub fn store<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> CacheResult<()> {
        let bytes = record::encode(name, value)?;
        self.store.write(name, &bytes)
    }

    /// Load the value of record `name`
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> CacheResult<T> {
        Ok(self.load_record(name)?.value)
    }

    /// Load record `name` including its envelope
    pub fn load_record<T: DeserializeOwned>(&self, name: &str) -> CacheResult<Record<T>> {
        let bytes = self.store.read(name)?;
        record::decode(name, &bytes)
    }

    /// Load record `name` as an untyped JSON value
    pub fn load_raw(&self, name: &str) -> CacheResult<Record<Value>> {
        self.load_record(name)
    }

    pub fn contains(&self, name: &str) -> CacheResult<bool> {
        self.store.contains(name)
    }

    /// Names of all records
    pub fn list_entries(&self) -> CacheResult<BTreeSet<String>> {
        self.store.list()
    }

    /// Names, sizes and modification times of all records
    pub fn entries(&self) -> CacheResult<Vec<RecordInfo>> {
        self.store.entries()
    }

    /// Remove one record; absent records are not an error
    pub fn remove(&self, name: &str) -> CacheResult<()> {
        self.store.remove(name)
    }

    /// Remove records modified before local midnight of `before`, or all
    /// records when `before` is `None`
    ///
    /// Returns the names of the removed records.
    pub fn clear(&self, before: Option<NaiveDate>) -> CacheResult<Vec<String>> {
        let removed = match before {
            Some(date) => {
                let cutoff = local_midnight(date)?;
                let removed = self.store.remove_older_than(Some(cutoff))?;
                info!("Removed {} record(s) older than {}", removed.len(), date);
                removed
            }
            None => {
                let removed = self.store.remove_all()?;
                info!("Removed all {} record(s)", removed.len());
                removed
            }
        };
        Ok(removed)
    }

    /// [`clear`](Self::clear) with a day/month/year cutoff
    pub fn clear_before(&self, day: u32, month: u32, year: i32) -> CacheResult<Vec<String>> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            CacheError::InvalidDate(format!("{:04}-{:02}-{:02}", year, month, day))
        })?;
        self.clear(Some(date))
    }

    /// Whether record `name` exists, checked with `lookup`
    pub(crate) fn has_record(&self, name: &str, lookup: Lookup) -> CacheResult<bool> {
        match lookup {
            Lookup::Probe => self.store.contains(name),
            Lookup::Listing => Ok(self.store.list()?.contains(name)),
        }
    }
}

/// Midnight at the start of `date` in the local time zone
///
/// When midnight falls in a DST gap the earliest valid instant of the day
/// is used, falling back to UTC midnight.
pub fn local_midnight(date: NaiveDate) -> CacheResult<SystemTime> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CacheError::InvalidDate(date.to_string()))?;

    let instant = match Local.from_local_datetime(&naive).earliest() {
        Some(local) => SystemTime::from(local),
        None => SystemTime::from(Utc.from_utc_datetime(&naive)),
    };
    Ok(instant)
}
