// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine settings persisted as JSON through a pluggable blob store.
//!
//! Hosts hand a [`ConfigStore`] (filesystem, database row, test fake) to a
//! [`ConfigService`]; the service owns the JSON encoding and the rules for
//! what an [`EngineConfig`] on disk may contain.

use pbs_core::EngineConfig;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Key the engine settings are stored under.
pub const ENGINE_CONFIG_KEY: &str = "pbs-engine";

/// Raw blob storage keyed by logical name.
pub trait ConfigStore {
    /// Blob under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces the blob under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Config failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("[PBS_CONFIG_NOT_FOUND] no config stored under this key")]
    NotFound,
    /// Reading or writing the backing medium failed.
    #[error("[PBS_CONFIG_IO] {0}")]
    Io(#[from] std::io::Error),
    /// The stored blob is not valid JSON for the requested type.
    #[error("[PBS_CONFIG_SERDE] {0}")]
    Serde(#[from] serde_json::Error),
    /// Engine settings that cannot round-trip through JSON.
    #[error("[PBS_CONFIG_REJECTED_ENGINE_CONFIG] {0}")]
    RejectedEngineConfig(String),
    /// Store-specific failure.
    #[error("[PBS_CONFIG_OTHER] {0}")]
    Other(String),
}

/// JSON front end over a [`ConfigStore`].
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwraps the store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Decodes the value under `key`; `Ok(None)` when absent or empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Err(ConfigError::NotFound) => return Ok(None),
            other => other?,
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Encodes `value` as pretty JSON under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Loads the engine settings, or defaults when none are saved.
    ///
    /// Missing fields take their defaults; out-of-range values are pulled
    /// back into range with a warning.
    pub fn load_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let Some(stored) = self.load::<EngineConfig>(ENGINE_CONFIG_KEY)? else {
            debug!(key = ENGINE_CONFIG_KEY, "no saved engine config, using defaults");
            return Ok(EngineConfig::default());
        };
        let sanitized = stored.sanitized();
        if sanitized != stored {
            warn!(
                key = ENGINE_CONFIG_KEY,
                default_weight = stored.default_weight,
                "engine config out of range, clamped"
            );
        }
        Ok(sanitized)
    }

    /// Persists the engine settings.
    ///
    /// A non-finite default weight is rejected: JSON would store it as
    /// `null` and the next load would fail.
    pub fn save_engine_config(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        if !config.default_weight.is_finite() {
            return Err(ConfigError::RejectedEngineConfig(format!(
                "default_weight must be finite, got {}",
                config.default_weight
            )));
        }
        self.save(ENGINE_CONFIG_KEY, config)
    }
}
