// src/core/paths.rs

//! Locations of the per-user architect directory and its files.

use crate::constants::{ARCHITECT_DIR, PRESETS_DIR_ENV, SETTINGS_FILENAME};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while locating or creating the architect directory.
#[derive(Error, Debug)]
pub enum PathError {
    /// `HOME` (`USERPROFILE` on Windows) is unset or empty.
    #[error("Could not determine user's home directory.")]
    HomeDirNotFound,
    /// `ARCHITECT_PRESETS_DIR` references an undefined variable.
    #[error("Could not expand '{template}': {message}")]
    Expansion {
        /// The raw value of the variable.
        template: String,
        /// Why the expansion failed.
        message: String,
    },
    /// The directory is missing and could not be created.
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        /// The directory that was being created.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Returns the name of the variable holding the home directory on this platform.
fn home_env_var() -> &'static str {
    if cfg!(target_os = "windows") {
        "USERPROFILE"
    } else {
        "HOME"
    }
}

/// Returns the path to the architect directory (`~/.laravel-architect`).
/// Creates it if it doesn't exist; this happens on every call so that an
/// externally deleted directory is recreated.
///
/// `ARCHITECT_PRESETS_DIR` takes precedence over the home directory when set.
/// The home directory comes from `HOME` (`USERPROFILE` on Windows); when it is
/// unset or empty the call fails with [`PathError::HomeDirNotFound`].
pub fn get_architect_dir() -> Result<PathBuf, PathError> {
    let dir = match env::var(PRESETS_DIR_ENV) {
        Ok(template) if !template.trim().is_empty() => expand(&template)?,
        _ => home_from(env::var_os(home_env_var()))?.join(ARCHITECT_DIR),
    };

    ensure_dir(&dir)?;
    Ok(dir)
}

/// Turns the raw home variable into a path; unset and empty are both errors.
fn home_from(value: Option<OsString>) -> Result<PathBuf, PathError> {
    value
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or(PathError::HomeDirNotFound)
}

/// Returns the path to `settings.toml` inside the architect directory.
pub fn get_settings_path() -> Result<PathBuf, PathError> {
    get_architect_dir().map(|dir| dir.join(SETTINGS_FILENAME))
}

/// Expands `~` and environment variables in a directory template.
fn expand(template: &str) -> Result<PathBuf, PathError> {
    shellexpand::full(template)
        .map(|expanded| PathBuf::from(expanded.into_owned()))
        .map_err(|e| PathError::Expansion {
            template: template.to_string(),
            message: e.to_string(),
        })
}

/// Creates `dir` and its parents with mode `0755` (on Unix) when it is missing.
pub fn ensure_dir(dir: &Path) -> Result<(), PathError> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    log::debug!("Creating directory {}", dir.display());
    builder
        .create(dir)
        .map_err(|e| PathError::ConfigDirCreation {
            path: dir.display().to_string(),
            source: e,
        })
}
