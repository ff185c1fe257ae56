//! Time-boxed cache over a persistent key-value store.
//!
//! Entries are `{data, timestamp}` JSON documents. An entry is served only while
//! `now - timestamp < duration`; an expired entry is removed by the read that
//! finds it. Nothing expires on a timer.
//!
//! Every failure here is non-fatal: a broken or unreadable entry is a miss and a
//! failed write is logged and dropped. Callers never depend on the cache for
//! correctness.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const CACHE_DURATION: Duration = Duration::from_secs(60 * 60);

/// Origin-scoped string storage, the stand-in for browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str);
}

/// Milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// One file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Bytes outside `[A-Za-z0-9-]` become `_XX`, so distinct keys never
    /// share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file.push(byte as char);
            } else {
                file.push_str(&format!("_{byte:02X}"));
            }
        }
        self.dir.join(format!("{file}.json"))
    }

    /// Removes every entry. Returns how many files were deleted.
    pub fn clear(&self) -> io::Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }
}

/// In-process store, used when no cache directory is usable and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), value.to_string());
                Ok(())
            }
            Err(_) => Err(io::Error::other("memory store poisoned")),
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub timestamp: i64,
}

pub struct TimeBoxedCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    duration_ms: i64,
    // read/check/evict happens under one lock
    lock: Mutex<()>,
}

impl TimeBoxedCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_duration(store, clock, CACHE_DURATION)
    }

    pub fn with_duration(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, duration: Duration) -> Self {
        Self {
            store,
            clock,
            duration_ms: duration.as_millis() as i64,
            lock: Mutex::new(()),
        }
    }

    /// Returns the cached data, or `None` on a miss, an unreadable entry or an
    /// expired entry (which is evicted).
    pub fn get(&self, key: &str) -> Option<Value> {
        let _guard = self.lock.lock().ok()?;
        let raw = self.store.get(key)?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "ignoring malformed cache entry");
                return None;
            }
        };
        let age = self.clock.now_millis() - entry.timestamp;
        if age >= self.duration_ms {
            debug!(key, age, "evicting expired cache entry");
            self.store.remove(key);
            return None;
        }
        Some(entry.data)
    }

    /// Best effort: a storage failure is logged and otherwise ignored.
    pub fn set(&self, key: &str, data: &Value) {
        let Ok(_guard) = self.lock.lock() else {
            return;
        };
        let entry = CacheEntry {
            data: data.clone(),
            timestamp: self.clock.now_millis(),
        };
        let encoded = match serde_json::to_string(&entry) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "could not encode cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &encoded) {
            warn!(key, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::Clock;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    /// Clock that only moves when told to.
    pub struct ManualClock(AtomicI64);

    impl ManualClock {
        pub fn new(start: i64) -> Self {
            Self(AtomicI64::new(start))
        }

        pub fn advance(&self, by: Duration) {
            self.0.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }
}
