//! JSON settings file adapter.
//!
//! Implements [`ConfigPort`] on top of a single JSON document holding
//! [`Settings`].  Missing keys fall back to their defaults, a missing file
//! loads the defaults, and nothing invalid is ever written.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::Settings;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<Settings, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "JsonConfigFile: {} not found, using defaults",
                    self.path.display()
                );
                return Ok(Settings::default());
            }
            Err(e) => {
                warn!("JsonConfigFile: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let settings: Settings =
            serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        settings.validate()?;
        info!("JsonConfigFile: loaded {}", self.path.display());
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        let text = serde_json::to_string_pretty(settings).map_err(|_| ConfigError::IoError)?;
        fs::write(&self.path, text).map_err(|e| {
            warn!("JsonConfigFile: write {} failed: {}", self.path.display(), e);
            ConfigError::IoError
        })?;
        info!("JsonConfigFile: saved {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hydroctl-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let file = JsonConfigFile::new(scratch("missing"));
        assert_eq!(file.load().unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let path = scratch("roundtrip");
        let file = JsonConfigFile::new(&path);
        let mut settings = Settings::default();
        settings.control.water_level_min = 25.0;
        settings.engine.buffer_capacity = 20;
        file.save(&settings).unwrap();
        assert_eq!(file.load().unwrap(), settings);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn refuses_to_save_invalid() {
        let path = scratch("invalid");
        let file = JsonConfigFile::new(&path);
        let mut settings = Settings::default();
        settings.control.ph_max = 4.0;
        assert!(matches!(
            file.save(&settings),
            Err(ConfigError::ValidationFailed(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn garbage_is_corrupted() {
        let path = scratch("garbage");
        fs::write(&path, "{ not json").unwrap();
        let file = JsonConfigFile::new(&path);
        assert_eq!(file.load(), Err(ConfigError::Corrupted));
        let _ = fs::remove_file(path);
    }
}
