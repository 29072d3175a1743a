// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for PBS hosts (uses platform config dir).

use directories::ProjectDirs;
use pbs_app_core::config::{ConfigError, ConfigStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Store configs as JSON files under a base directory.
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Create a store rooted at the user config directory (e.g., `~/.config/pbs`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "pbs")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::with_root(proj.config_dir())
    }

    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn with_root(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = root.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory the store writes into.
    pub fn root(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pbs_app_core::config::ConfigService;
    use pbs_core::EngineConfig;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_root(dir.path()).unwrap();
        assert!(matches!(store.load_raw("absent"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn writes_one_json_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_root(dir.path().join("nested")).unwrap();
        store.save_raw("alpha", b"{}").unwrap();
        assert!(store.root().join("alpha.json").is_file());
        assert_eq!(store.load_raw("alpha").unwrap(), b"{}");
    }

    #[test]
    fn engine_config_survives_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            hubless_bandwidth_limit: 2,
            default_weight: 70.0,
            propagate_reinforcement: true,
        };
        {
            let service = ConfigService::new(FsConfigStore::with_root(dir.path()).unwrap());
            service.save_engine_config(&config).unwrap();
        }
        let service = ConfigService::new(FsConfigStore::with_root(dir.path()).unwrap());
        assert_eq!(service.load_engine_config().unwrap(), config);
    }
}
