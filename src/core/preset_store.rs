// src/core/preset_store.rs

//! Durable storage of named presets, one `<name>.json` file per preset.
//!
//! The store reads the directory lazily on first access and keeps the result
//! until a forced reload. Files that are not `.json`, do not contain valid
//! JSON, or do not describe a preset are skipped so that a single corrupt or
//! hand-edited file never blocks the others.

use crate::constants::PRESET_EXTENSION;
use crate::core::paths::{self, PathError};
use crate::models::Preset;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Represents errors that can occur while reading or writing presets.
#[derive(Error, Debug)]
pub enum PresetError {
    /// The preset directory could not be located or created.
    #[error(transparent)]
    Path(#[from] PathError),
    /// A filesystem I/O error occurred.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// A preset could not be serialized.
    #[error("Failed to serialize preset: {0}")]
    Json(#[from] serde_json::Error),
    /// No preset is stored under this name.
    #[error("Preset '{name}' not found.")]
    NotFound {
        /// The requested name.
        name: String,
    },
    /// The name cannot be used as a file stem.
    #[error("Invalid preset name '{name}': it must be non-empty and contain no path separators.")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

type PresetResult<T> = Result<T, PresetError>;

/// An explicit, caller-owned cache of the presets found on disk.
#[derive(Debug, Default)]
pub struct PresetStore {
    /// Fixed directory; `None` means "resolve from the environment on each access".
    directory: Option<PathBuf>,
    presets: Option<BTreeMap<String, Preset>>,
    last_reload: Option<SystemTime>,
}

impl PresetStore {
    /// A store backed by `~/.laravel-architect` (or `ARCHITECT_PRESETS_DIR`).
    pub fn new() -> Self {
        Self::default()
    }

    /// A store backed by an explicit directory.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    /// Returns the preset directory, creating it when it is missing.
    pub fn resolve_directory(&self) -> PresetResult<PathBuf> {
        match &self.directory {
            Some(dir) => {
                paths::ensure_dir(dir)?;
                Ok(dir.clone())
            }
            None => Ok(paths::get_architect_dir()?),
        }
    }

    /// When the cache was last filled from disk.
    pub fn last_reload(&self) -> Option<SystemTime> {
        self.last_reload
    }

    /// Returns every stored preset keyed by file stem.
    ///
    /// The directory is scanned on the first call and whenever `force_reload`
    /// is set; otherwise the cached mapping is returned.
    pub fn list(&mut self, force_reload: bool) -> PresetResult<&BTreeMap<String, Preset>> {
        if force_reload || self.presets.is_none() {
            let directory = self.resolve_directory()?;
            let presets = scan_directory(&directory)?;
            log::debug!(
                "Loaded {} preset(s) from {}",
                presets.len(),
                directory.display()
            );
            self.last_reload = Some(SystemTime::now());
            self.presets = Some(presets);
        }

        Ok(self.presets.get_or_insert_with(BTreeMap::new))
    }

    /// Looks a preset up by name without forcing a reload.
    pub fn get(&mut self, name: &str) -> PresetResult<Option<&Preset>> {
        let presets = self.list(false)?;
        Ok(presets
            .get(name)
            .or_else(|| presets.values().find(|preset| preset.name == name)))
    }

    /// Like [`get`](Self::get), but a missing preset is an error.
    pub fn require(&mut self, name: &str) -> PresetResult<&Preset> {
        self.get(name)?.ok_or_else(|| PresetError::NotFound {
            name: name.to_string(),
        })
    }

    /// Whether a preset is stored under `name`.
    pub fn exists(&mut self, name: &str) -> PresetResult<bool> {
        Ok(self.list(false)?.contains_key(name))
    }

    /// Writes `preset` to `<directory>/<name>.json`, replacing any previous file.
    pub fn save(&mut self, preset: &Preset) -> PresetResult<PathBuf> {
        validate_name(&preset.name)?;
        let path = self.preset_path(&preset.name)?;

        let mut json = serde_json::to_string_pretty(preset)?;
        json.push('\n');
        fs::write(&path, json)?;
        log::debug!("Saved preset '{}' to {}", preset.name, path.display());

        if let Some(presets) = self.presets.as_mut() {
            presets.insert(preset.name.clone(), preset.clone());
        }
        Ok(path)
    }

    /// Removes the file of the preset stored under `name`.
    pub fn delete(&mut self, name: &str) -> PresetResult<()> {
        validate_name(name)?;
        let path = self.preset_path(name)?;
        if !path.is_file() {
            return Err(PresetError::NotFound {
                name: name.to_string(),
            });
        }

        fs::remove_file(&path)?;
        log::debug!("Deleted preset file {}", path.display());

        if let Some(presets) = self.presets.as_mut() {
            presets.remove(name);
        }
        Ok(())
    }

    fn preset_path(&self, name: &str) -> PresetResult<PathBuf> {
        Ok(self
            .resolve_directory()?
            .join(format!("{}.{}", name, PRESET_EXTENSION)))
    }
}

/// Checks that `name` can be used as a preset file stem.
///
/// A preset name doubles as a file stem, so it must not escape the directory.
pub fn validate_name(name: &str) -> PresetResult<()> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed != name
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);

    if invalid {
        return Err(PresetError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Reads every loadable preset in `directory`, keyed by file stem.
fn scan_directory(directory: &Path) -> PresetResult<BTreeMap<String, Preset>> {
    let mut presets = BTreeMap::new();

    for entry in fs::read_dir(directory)?.filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(PRESET_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match load_preset_file(&path) {
            Some(preset) => {
                presets.insert(stem.to_string(), preset);
            }
            None => continue,
        }
    }

    Ok(presets)
}

/// Returns `None` for unreadable, non-JSON or non-preset files.
fn load_preset_file(path: &Path) -> Option<Preset> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("Skipping unreadable preset file {}: {}", path.display(), e);
            return None;
        }
    };

    let preset = match Preset::from_json(&content) {
        Ok(preset) => preset,
        Err(e) if e.is_data() => {
            log::warn!("Ignoring malformed preset {}: {}", path.display(), e);
            return None;
        }
        Err(_) => {
            log::debug!("Skipping {}: not valid JSON", path.display());
            return None;
        }
    };

    if preset.name.trim().is_empty() {
        log::warn!("Ignoring preset {}: it has no name", path.display());
        return None;
    }
    Some(preset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Database, DevEnvironment, Stack, StackFeature, StarterKit, TestFramework};
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> PresetStore {
        PresetStore::with_directory(temp.path())
    }

    fn full_preset(name: &str) -> Preset {
        let mut preset = Preset::new(name);
        preset.laravel_version = Some("dev-master".to_string());
        let options = &mut preset.laravel_options;
        options.starter_kit = Some(StarterKit::Breeze);
        options.stack = Some(Stack::React);
        options.stack_options = vec![StackFeature::Dark, StackFeature::Typescript];
        options.database = Some(Database::Pgsql);
        options.migrate = Some(true);
        options.dev_environment = Some(DevEnvironment::BuiltIn);
        options.dev_environment_options.port = Some(8001);
        options.test_framework = Some(TestFramework::Phpunit);
        preset
    }

    #[test]
    fn test_list_skips_corrupt_json() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("acme.json"),
            r#"{"name":"acme","laravelVersion":"11","laravelOptions":{"database":"sqlite"}}"#,
        )
        .unwrap();
        fs::write(temp.path().join("broken.json"), "not json").unwrap();

        let mut store = store_in(&temp);
        let presets = store.list(false).unwrap();
        assert_eq!(presets.len(), 1);
        let acme = presets.get("acme").unwrap();
        assert_eq!(acme.laravel_version.as_deref(), Some("11"));
        assert_eq!(acme.laravel_options.database, Some(Database::Sqlite));

        assert!(store.exists("acme").unwrap());
        assert!(!store.exists("broken").unwrap());
    }

    #[test]
    fn test_list_skips_non_json_files_and_directories() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("notes.txt"), r#"{"name":"notes"}"#).unwrap();
        fs::write(temp.path().join("settings.toml"), "composer = \"composer\"").unwrap();
        fs::create_dir(temp.path().join("folder.json")).unwrap();
        fs::write(temp.path().join("real.json"), r#"{"name":"real","laravelVersion":null}"#)
            .unwrap();

        let mut store = store_in(&temp);
        let keys: Vec<_> = store.list(false).unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["real".to_string()]);
    }

    #[test]
    fn test_list_skips_valid_json_that_is_not_a_preset() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("array.json"), "[1, 2, 3]").unwrap();
        fs::write(
            temp.path().join("bad-db.json"),
            r#"{"name":"bad-db","laravelVersion":null,"laravelOptions":{"database":"oracle"}}"#,
        )
        .unwrap();

        let mut store = store_in(&temp);
        assert!(store.list(false).unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_presets_without_a_name() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blank.json"), r#"{"name":"","laravelVersion":null}"#).unwrap();
        fs::write(temp.path().join("spaces.json"), r#"{"name":"   ","laravelVersion":"11"}"#)
            .unwrap();
        fs::write(temp.path().join("named.json"), r#"{"name":"named","laravelVersion":null}"#)
            .unwrap();

        let mut store = store_in(&temp);
        let keys: Vec<_> = store.list(false).unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["named".to_string()]);
    }

    #[test]
    fn test_list_accepts_port_written_as_text() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("php2.json"),
            r#"{"name":"php2","laravelVersion":"11","laravelOptions":{"devEnvironment":"none","devEnvironmentOptions":{"port":"8000"}}}"#,
        )
        .unwrap();

        let mut store = store_in(&temp);
        let preset = store.require("php2").unwrap();
        assert_eq!(preset.laravel_options.dev_environment_options.port, Some(8000));
    }

    #[test]
    fn test_saved_presets_round_trip() {
        let temp = TempDir::new().unwrap();
        let mut writer = store_in(&temp);
        let first = full_preset("first");
        let second = Preset::new("second");
        writer.save(&first).unwrap();
        writer.save(&second).unwrap();

        let mut reader = store_in(&temp);
        let presets = reader.list(false).unwrap();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets.get("first"), Some(&first));
        assert_eq!(presets.get("second"), Some(&second));
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        store.save(&Preset::new("team")).unwrap();

        let updated = full_preset("team");
        store.save(&updated).unwrap();

        assert_eq!(store.list(true).unwrap().len(), 1);
        assert_eq!(store.get("team").unwrap(), Some(&updated));
    }

    #[test]
    fn test_save_rejects_names_that_escape_the_directory() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        for name in ["", "  ", "../evil", "a/b", ".hidden"] {
            let result = store.save(&Preset::new(name));
            assert!(
                matches!(result, Err(PresetError::InvalidName { .. })),
                "name {:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_get_does_not_reload() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        assert!(store.list(false).unwrap().is_empty());
        let first_reload = store.last_reload();

        fs::write(temp.path().join("late.json"), r#"{"name":"late","laravelVersion":null}"#)
            .unwrap();
        assert!(store.get("late").unwrap().is_none());
        assert!(!store.exists("late").unwrap());
        assert_eq!(store.last_reload(), first_reload);

        store.list(true).unwrap();
        assert!(store.get("late").unwrap().is_some());
        assert!(store.exists("late").unwrap());
    }

    #[test]
    fn test_get_falls_back_to_the_preset_name() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("file-stem.json"),
            r#"{"name":"Display Name","laravelVersion":null}"#,
        )
        .unwrap();

        let mut store = store_in(&temp);
        assert!(store.get("file-stem").unwrap().is_some());
        assert!(store.get("Display Name").unwrap().is_some());
        assert!(!store.exists("Display Name").unwrap());
    }

    #[test]
    fn test_require_reports_missing_preset() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        let err = store.require("ghost").unwrap_err();
        assert!(matches!(err, PresetError::NotFound { ref name } if name == "ghost"));
        assert_eq!(err.to_string(), "Preset 'ghost' not found.");
    }

    #[test]
    fn test_delete_removes_file_and_cache_entry() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        store.save(&Preset::new("gone")).unwrap();
        assert!(store.exists("gone").unwrap());

        store.delete("gone").unwrap();
        assert!(!store.exists("gone").unwrap());
        assert!(!temp.path().join("gone.json").exists());

        assert!(matches!(
            store.delete("gone"),
            Err(PresetError::NotFound { .. })
        ));
    }

    #[test]
    fn test_directory_is_created_on_demand() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("presets");
        let mut store = PresetStore::with_directory(&dir);

        assert!(store.list(false).unwrap().is_empty());
        assert!(dir.is_dir());
    }
}
