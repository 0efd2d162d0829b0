//! In-process backend for tests and throwaway boards.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use super::{KvError, KvStore, RawEntry, effective_prefix, now_ms};

#[derive(Debug, Clone)]
struct Stored {
    encoded: String,
    updated_at: i64,
}

/// `BTreeMap`-backed store. Keeps the encoded text, so decoding behaves the
/// same as the SQLite backend.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<BTreeMap<String, Stored>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryKvStore {
    fn put_encoded(&self, key: &str, encoded: &str) -> Result<(), KvError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| KvError::storage("set", "memory store lock poisoned"))?;
        let now = now_ms();
        let updated_at = entries
            .get(key)
            .map_or(now, |existing| existing.updated_at.max(now));
        entries.insert(
            key.to_string(),
            Stored {
                encoded: encoded.to_string(),
                updated_at,
            },
        );
        Ok(())
    }

    fn get_encoded(&self, key: &str) -> Result<Option<RawEntry>, KvError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| KvError::storage("get", "memory store lock poisoned"))?;
        Ok(entries.get(key).map(|stored| RawEntry {
            key: key.to_string(),
            encoded: stored.encoded.clone(),
            updated_at: stored.updated_at,
        }))
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| KvError::storage("delete", "memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }

    fn list_encoded(&self, prefix: Option<&str>) -> Result<Vec<RawEntry>, KvError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| KvError::storage("list", "memory store lock poisoned"))?;
        let to_raw = |(key, stored): (&String, &Stored)| RawEntry {
            key: key.clone(),
            encoded: stored.encoded.clone(),
            updated_at: stored.updated_at,
        };
        let listed = match effective_prefix(prefix) {
            Some(prefix) => entries
                .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(to_raw)
                .collect(),
            None => entries.iter().map(to_raw).collect(),
        };
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::io::kv::contract;

    #[test]
    fn satisfies_store_contract() {
        contract::run_all(MemoryKvStore::new);
    }

    #[test]
    fn concurrent_same_key_writes_leave_one_value() {
        let store = Arc::new(MemoryKvStore::new());
        let writers: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|value| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        store.set("shared", value).expect("set");
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("join");
        }

        let value: String = store.get("shared").expect("get").expect("present");
        assert!(value == "left" || value == "right", "got {value}");
        assert_eq!(store.len(), 1);
    }
}
