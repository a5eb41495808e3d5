use proofd_core::config::Config;
use proofd_core::error::ConfigError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings persisted as one pretty-printed JSON document.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the default settings if no document exists yet.
    pub fn ensure_initialized(&self) -> Result<(), ConfigError> {
        if self.path.exists() {
            return Ok(());
        }
        info!(path = %self.path.display(), "creating default settings");
        self.write(&Config::default())
    }

    /// Current settings. Unreadable or malformed storage yields the defaults.
    pub fn get(&self) -> Config {
        match Config::load_from(&self.path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "serving default settings");
                Config::default()
            }
        }
    }

    pub fn put(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        self.write(config)?;
        info!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    fn write(&self, config: &Config) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = config.to_json_pretty()?;
        // Readers only ever see a complete document.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofd_core::position::Position;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));
        (dir, store)
    }

    #[test]
    fn first_run_creates_default_document() {
        let (_dir, store) = store();
        store.ensure_initialized().unwrap();
        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains('\n'), "document should be pretty-printed");
        assert_eq!(Config::from_json(&contents).unwrap(), Config::default());
    }

    #[test]
    fn existing_document_is_not_overwritten() {
        let (_dir, store) = store();
        let mut config = Config::default();
        config.display.position = Position::TopRight;
        store.put(&config).unwrap();
        store.ensure_initialized().unwrap();
        assert_eq!(store.get().display.position, Position::TopRight);
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, store) = store();
        let mut config = Config::default();
        config.text.template = "_{customer}_ grabbed {product}".into();
        store.put(&config).unwrap();
        assert_eq!(store.get(), config);
    }

    #[test]
    fn put_rejects_invalid_config() {
        let (_dir, store) = store();
        let mut config = Config::default();
        config.style.background_color.alpha = 2.0;
        assert!(matches!(store.put(&config), Err(ConfigError::Validation(_))));
        assert!(!store.path().exists());
    }

    #[test]
    fn get_falls_back_to_default_when_missing() {
        let (_dir, store) = store();
        assert_eq!(store.get(), Config::default());
    }

    #[test]
    fn get_falls_back_to_default_when_malformed() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "[1, 2").unwrap();
        assert_eq!(store.get(), Config::default());
    }
}
