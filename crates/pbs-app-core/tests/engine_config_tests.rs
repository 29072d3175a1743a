// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine settings round-trip through the config port.
#![allow(missing_docs, clippy::unwrap_used)]

use pbs_app_core::config::{ConfigError, ConfigService, ConfigStore, ENGINE_CONFIG_KEY};
use pbs_core::EngineConfig;
use pbs_dry_tests::InMemoryConfigStore;

#[test]
fn missing_key_yields_defaults() {
    let service = ConfigService::new(InMemoryConfigStore::new());
    assert_eq!(service.load_engine_config().unwrap(), EngineConfig::default());
}

#[test]
fn save_then_load_preserves_values() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let config = EngineConfig {
        hubless_bandwidth_limit: 3,
        default_weight: 25.0,
        propagate_reinforcement: false,
    };
    service.save_engine_config(&config).unwrap();
    assert!(store.contains_key(ENGINE_CONFIG_KEY));
    assert_eq!(service.load_engine_config().unwrap(), config);
}

#[test]
fn partial_documents_fill_in_defaults() {
    let store = InMemoryConfigStore::new();
    store
        .save_raw(ENGINE_CONFIG_KEY, br#"{ "hubless_bandwidth_limit": 4 }"#)
        .unwrap();
    let loaded = ConfigService::new(store).load_engine_config().unwrap();
    assert_eq!(loaded.hubless_bandwidth_limit, 4);
    assert!(loaded.propagate_reinforcement);
    assert!((loaded.default_weight - pbs_core::DEFAULT_THROUGHPUT_WEIGHT).abs() < f64::EPSILON);
}

#[test]
fn out_of_range_weight_is_clamped() {
    let store = InMemoryConfigStore::new();
    store
        .save_raw(ENGINE_CONFIG_KEY, br#"{ "default_weight": 400.0 }"#)
        .unwrap();
    let loaded = ConfigService::new(store).load_engine_config().unwrap();
    assert!((loaded.default_weight - pbs_core::MAX_WEIGHT).abs() < f64::EPSILON);
}

#[test]
fn empty_blob_counts_as_missing() {
    let store = InMemoryConfigStore::new();
    store.save_raw(ENGINE_CONFIG_KEY, b"").unwrap();
    let loaded = ConfigService::new(store).load_engine_config().unwrap();
    assert_eq!(loaded, EngineConfig::default());
}

#[test]
fn store_failures_propagate() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_load(true);
    let result = ConfigService::new(store).load_engine_config();
    assert!(matches!(result, Err(ConfigError::Other(_))));
}

#[test]
fn malformed_json_is_a_serde_error() {
    let store = InMemoryConfigStore::new();
    store.save_raw(ENGINE_CONFIG_KEY, b"{ nope").unwrap();
    let result = ConfigService::new(store).load_engine_config();
    assert!(matches!(result, Err(ConfigError::Serde(_))));
}

#[test]
fn save_failures_leave_store_untouched() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_save(true);
    let service = ConfigService::new(store.clone());
    assert!(service.save_engine_config(&EngineConfig::default()).is_err());
    assert!(!store.contains_key(ENGINE_CONFIG_KEY));
}

#[test]
fn non_finite_weights_are_refused_on_save() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let config = EngineConfig {
        default_weight: f64::NAN,
        ..EngineConfig::default()
    };
    let result = service.save_engine_config(&config);
    assert!(matches!(result, Err(ConfigError::RejectedEngineConfig(_))));
    assert_eq!(store.save_count(), 0);
}

#[test]
fn error_messages_carry_stable_codes() {
    assert_eq!(
        ConfigError::NotFound.to_string(),
        "[PBS_CONFIG_NOT_FOUND] no config stored under this key"
    );
    assert!(ConfigError::Other("x".into())
        .to_string()
        .starts_with("[PBS_CONFIG_OTHER]"));
}
