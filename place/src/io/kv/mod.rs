//! Persistent key-value store for JSON-serializable values.
//!
//! Backends implement four raw operations on encoded text; the typed
//! `set`/`get`/`list` helpers on [`KvStore`] handle JSON encoding and turn
//! undecodable rows into [`KvError::CorruptValue`].

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use std::error::Error as StdError;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    /// The storage engine rejected the operation. Not retried.
    #[error("storage error during {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A stored entry could not be decoded. The entry is left in place.
    #[error("failed to parse stored value for key \"{key}\": {source}")]
    CorruptValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value for key \"{key}\": {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl KvError {
    pub fn storage(op: &'static str, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Storage {
            op,
            source: source.into(),
        }
    }
}

/// A decoded entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry<T = serde_json::Value> {
    pub key: String,
    pub value: T,
    /// Milliseconds since the Unix epoch of the last write.
    pub updated_at: i64,
}

/// An entry as the backend holds it: canonical JSON text, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: String,
    pub encoded: String,
    pub updated_at: i64,
}

impl RawEntry {
    pub fn decode<T: DeserializeOwned>(self) -> Result<Entry<T>, KvError> {
        let value = serde_json::from_str(&self.encoded).map_err(|source| KvError::CorruptValue {
            key: self.key.clone(),
            source,
        })?;
        Ok(Entry {
            key: self.key,
            value,
            updated_at: self.updated_at,
        })
    }
}

/// Durable string-keyed storage.
///
/// Writes are single-key upserts with last-write-wins semantics; there is no
/// multi-key transaction. `updated_at` never moves backwards for a key.
pub trait KvStore {
    /// Insert or overwrite `key` with already-encoded JSON text.
    fn put_encoded(&self, key: &str, encoded: &str) -> Result<(), KvError>;

    fn get_encoded(&self, key: &str) -> Result<Option<RawEntry>, KvError>;

    /// Remove `key`. Absent keys are not an error.
    fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Entries whose key starts with `prefix` (all entries for `None` or an
    /// empty prefix), ascending by raw key bytes.
    fn list_encoded(&self, prefix: Option<&str>) -> Result<Vec<RawEntry>, KvError>;

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), KvError> {
        let encoded = serde_json::to_string(value).map_err(|source| KvError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.put_encoded(key, &encoded)
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, KvError> {
        Ok(self.get_entry(key)?.map(|entry| entry.value))
    }

    fn get_entry<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Entry<T>>, KvError> {
        self.get_encoded(key)?.map(RawEntry::decode).transpose()
    }

    fn list<T: DeserializeOwned>(&self, prefix: Option<&str>) -> Result<Vec<Entry<T>>, KvError> {
        self.list_encoded(prefix)?
            .into_iter()
            .map(RawEntry::decode)
            .collect()
    }
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn put_encoded(&self, key: &str, encoded: &str) -> Result<(), KvError> {
        (**self).put_encoded(key, encoded)
    }

    fn get_encoded(&self, key: &str) -> Result<Option<RawEntry>, KvError> {
        (**self).get_encoded(key)
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        (**self).delete(key)
    }

    fn list_encoded(&self, prefix: Option<&str>) -> Result<Vec<RawEntry>, KvError> {
        (**self).list_encoded(prefix)
    }
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Treat an empty prefix like no prefix.
pub(crate) fn effective_prefix(prefix: Option<&str>) -> Option<&str> {
    prefix.filter(|p| !p.is_empty())
}
