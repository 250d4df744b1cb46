use std::path::{Path, PathBuf};

use crate::settings::error::SettingsError;
use crate::settings::types::ClientConfig;

/// JSON file holding the client configuration.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, returning defaults when the file is missing.
    pub fn load(&self) -> Result<ClientConfig, SettingsError> {
        if !self.path.exists() {
            tracing::debug!("{} not found, using defaults", self.path.display());
            return Ok(ClientConfig::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save the config atomically (write .tmp then rename).
    pub fn save(&self, config: &ClientConfig) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(config)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::types::CaptureSourceSettings;
    use tempfile::TempDir;

    /// Helper: create a store backed by a temp directory.
    fn temp_store() -> (ConfigStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("rep-coach.json"));
        (store, dir)
    }

    #[test]
    fn load_returns_default_when_file_missing() {
        let (store, _dir) = temp_store();
        assert_eq!(store.load().unwrap(), ClientConfig::default());
    }

    #[test]
    fn load_parses_valid_json_file() {
        let (store, _dir) = temp_store();
        std::fs::write(
            store.path(),
            r#"{"origin":"http://10.0.0.5:8000","default_exercise":"squat"}"#,
        )
        .unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.origin, "http://10.0.0.5:8000");
        assert_eq!(config.default_exercise, "squat");
    }

    #[test]
    fn load_returns_error_for_invalid_json() {
        let (store, _dir) = temp_store();
        std::fs::write(store.path(), "not valid json!!!").unwrap();

        assert!(matches!(store.load(), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn save_round_trips_through_load() {
        let (store, _dir) = temp_store();
        let mut config = ClientConfig::default();
        config.origin = "https://coach.example.com".to_string();
        config.capture.source = CaptureSourceSettings::None;
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("rep-coach.json");
        ConfigStore::new(path.clone())
            .save(&ClientConfig::default())
            .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn save_is_atomic() {
        let (store, dir) = temp_store();
        store.save(&ClientConfig::default()).unwrap();

        // After a successful save, no .tmp file should remain
        let tmp_path = dir.path().join("rep-coach.json.tmp");
        assert!(
            !tmp_path.exists(),
            ".tmp file should be cleaned up after rename"
        );
    }
}
