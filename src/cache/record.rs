//! On-disk record format
//!
//! A record file is a UTF-8 JSON document:
//!
//! ```json
//! {"format": "filecache", "version": 1, "created_at": "2026-01-31T12:00:00Z", "value": ...}
//! ```
//!
//! `value` is the serde_json rendering of the cached result. Decoding
//! rejects any other `format` tag or a `version` newer than
//! [`RECORD_VERSION`], so a record is never silently misread.

use super::faithful;
use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format tag written into every record
pub const RECORD_FORMAT: &str = "filecache";

/// Current record format version
pub const RECORD_VERSION: u32 = 1;

/// A decoded record envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record<T> {
    pub format: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub value: T,
}

#[derive(Serialize)]
struct RecordRef<'a, T: ?Sized> {
    format: &'static str,
    version: u32,
    created_at: DateTime<Utc>,
    value: &'a T,
}

/// Encode `value` as the bytes of record `name`
///
/// Values that would not read back unchanged (NaN, `Some(None)`) are
/// rejected rather than written as `null`.
pub fn encode<T: Serialize + ?Sized>(name: &str, value: &T) -> CacheResult<Vec<u8>> {
    faithful::ensure_faithful(value).map_err(|e| CacheError::codec(name, e))?;
    let record = RecordRef {
        format: RECORD_FORMAT,
        version: RECORD_VERSION,
        created_at: Utc::now(),
        value,
    };
    serde_json::to_vec(&record).map_err(|e| CacheError::codec(name, e))
}

/// Check that `value` decodes from its own JSON form back to the same JSON
///
/// Catches types whose `Deserialize` does not mirror their `Serialize`,
/// which would otherwise store a record every later hit misreads.
pub fn verify_round_trip<T>(name: &str, value: &T) -> CacheResult<()>
where
    T: Serialize + DeserializeOwned,
{
    faithful::ensure_faithful(value).map_err(|e| CacheError::codec(name, e))?;
    let original = serde_json::to_value(value).map_err(|e| CacheError::codec(name, e))?;
    let rebuilt = T::deserialize(&original).map_err(|e| CacheError::codec(name, e))?;
    let again = serde_json::to_value(&rebuilt).map_err(|e| CacheError::codec(name, e))?;

    if again != original {
        return Err(CacheError::codec(
            name,
            serde_json::Error::custom("value changes when read back from JSON"),
        ));
    }
    Ok(())
}

/// Decode the bytes of record `name`
pub fn decode<T: DeserializeOwned>(name: &str, bytes: &[u8]) -> CacheResult<Record<T>> {
    let raw: Record<Value> =
        serde_json::from_slice(bytes).map_err(|e| CacheError::codec(name, e))?;

    if raw.format != RECORD_FORMAT {
        return Err(CacheError::UnsupportedFormat {
            name: name.to_string(),
            found: format!("format tag {:?}", raw.format),
        });
    }
    if raw.version > RECORD_VERSION {
        return Err(CacheError::UnsupportedFormat {
            name: name.to_string(),
            found: format!("version {}", raw.version),
        });
    }

    let value = serde_json::from_value(raw.value).map_err(|e| CacheError::codec(name, e))?;
    Ok(Record {
        format: raw.format,
        version: raw.version,
        created_at: raw.created_at,
        value,
    })
}
