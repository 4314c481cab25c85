// src/system/settings.rs

//! The user's `settings.toml`.

use std::{fs, path::Path};

use crate::{core::paths, models::Settings};
use thiserror::Error;

/// Errors raised while reading or creating `settings.toml`.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file could not be read or written.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The architect directory could not be located.
    #[error(transparent)]
    Path(#[from] paths::PathError),
    /// The file is not valid TOML for [`Settings`].
    #[error("Failed to parse settings.toml: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// The defaults could not be written out.
    #[error("Failed to serialize settings to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Loads `settings.toml` from the architect directory, writing the defaults
/// on first use so users have a file to edit.
pub fn load_settings() -> Result<Settings, SettingsError> {
    let settings_path = paths::get_settings_path()?;
    load_settings_from(&settings_path)
}

/// Loads settings from an explicit file, creating it with defaults when missing.
pub fn load_settings_from(settings_path: &Path) -> Result<Settings, SettingsError> {
    if !settings_path.exists() {
        let defaults = Settings::default();
        let toml_string = toml::to_string_pretty(&defaults)?;
        fs::write(settings_path, toml_string)?;
        log::debug!("Default settings written to {}", settings_path.display());
        Ok(defaults)
    } else {
        let content = fs::read_to_string(settings_path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_settings_are_created_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        // The written file parses back to the same values.
        assert_eq!(load_settings_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_settings_keep_defaults_for_missing_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(&path, "composer = \"php composer.phar\"\n").unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.composer, "php composer.phar");
        assert_eq!(settings.php, "php");
    }

    #[test]
    fn test_invalid_settings_are_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(&path, "composer = [").unwrap();

        assert!(matches!(
            load_settings_from(&path),
            Err(SettingsError::TomlParse(_))
        ));
    }
}
