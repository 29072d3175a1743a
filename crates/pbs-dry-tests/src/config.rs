// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use pbs_app_core::config::{ConfigError, ConfigStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// In-memory [`ConfigStore`] that counts calls and can be told to fail.
///
/// Clones share state, so a test can hand one clone to a
/// `ConfigService` and inspect the other.
///
/// ```
/// use pbs_app_core::config::ConfigService;
/// use pbs_dry_tests::InMemoryConfigStore;
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
/// service
///     .save_engine_config(&pbs_core::EngineConfig::default())
///     .unwrap();
/// assert_eq!(store.save_count(), 1);
/// assert!(store.contains_key("pbs-engine"));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Blobs>>,
}

#[derive(Default)]
struct Blobs {
    data: BTreeMap<String, Vec<u8>>,
    loads: usize,
    saves: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `(key, blob)` pairs.
    pub fn with_data<K, I>(data: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Vec<u8>)>,
    {
        let store = Self::new();
        store.with_blobs(|blobs| {
            blobs.data = data.into_iter().map(|(k, v)| (k.into(), v)).collect();
        });
        store
    }

    fn with_blobs<R>(&self, f: impl FnOnce(&mut Blobs) -> R) -> R {
        let mut blobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut blobs)
    }

    /// Make every `load_raw` fail with [`ConfigError::Other`].
    pub fn set_fail_on_load(&self, fail: bool) {
        self.with_blobs(|b| b.fail_on_load = fail);
    }

    /// Make every `save_raw` fail with [`ConfigError::Other`].
    pub fn set_fail_on_save(&self, fail: bool) {
        self.with_blobs(|b| b.fail_on_save = fail);
    }

    /// Attempted loads, failures included.
    pub fn load_count(&self) -> usize {
        self.with_blobs(|b| b.loads)
    }

    /// Attempted saves, failures included.
    pub fn save_count(&self) -> usize {
        self.with_blobs(|b| b.saves)
    }

    /// Stored keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.with_blobs(|b| b.data.keys().cloned().collect())
    }

    /// `true` if `key` holds a blob.
    pub fn contains_key(&self, key: &str) -> bool {
        self.with_blobs(|b| b.data.contains_key(key))
    }

    /// Raw blob under `key`, bypassing the counters.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.with_blobs(|b| b.data.get(key).cloned())
    }

    /// Drops all data, counters and failure switches.
    pub fn reset(&self) {
        self.with_blobs(|b| *b = Blobs::default());
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.with_blobs(|b| {
            b.loads += 1;
            if b.fail_on_load {
                return Err(ConfigError::Other("simulated load failure".into()));
            }
            b.data.get(key).cloned().ok_or(ConfigError::NotFound)
        })
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.with_blobs(|b| {
            b.saves += 1;
            if b.fail_on_save {
                return Err(ConfigError::Other("simulated save failure".into()));
            }
            b.data.insert(key.to_owned(), data.to_vec());
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn counts_attempts_including_failures() {
        let store = InMemoryConfigStore::new();
        store.save_raw("a", b"1").unwrap();
        store.set_fail_on_save(true);
        assert!(matches!(store.save_raw("b", b"2"), Err(ConfigError::Other(_))));
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.keys(), vec!["a"]);

        assert!(matches!(store.load_raw("missing"), Err(ConfigError::NotFound)));
        store.set_fail_on_load(true);
        assert!(matches!(store.load_raw("a"), Err(ConfigError::Other(_))));
        assert_eq!(store.load_count(), 2);
    }

    #[test]
    fn clones_share_state_and_reset() {
        let first = InMemoryConfigStore::with_data([("seed", b"x".to_vec())]);
        let second = first.clone();
        second.save_raw("other", b"y").unwrap();
        assert_eq!(first.keys(), vec!["other", "seed"]);
        assert_eq!(first.peek("other").as_deref(), Some(&b"y"[..]));

        first.set_fail_on_save(true);
        second.reset();
        assert!(first.keys().is_empty());
        assert_eq!(first.save_count(), 0);
        first.save_raw("after", b"z").unwrap();
    }
}
