// src/constants.rs

//! Names and well-known values shared across the crate.

/// The name of the per-user directory holding presets and settings (inside the home directory).
pub const ARCHITECT_DIR: &str = ".laravel-architect";

/// The extension of preset files inside the architect directory.
pub const PRESET_EXTENSION: &str = "json";

/// The name of the settings file (inside the architect directory).
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Overrides the location of the architect directory when set.
pub const PRESETS_DIR_ENV: &str = "ARCHITECT_PRESETS_DIR";

/// The rolling development version marker accepted by Composer.
pub const DEV_VERSION: &str = "dev-master";

/// The Composer package used to create new applications.
pub const LARAVEL_PACKAGE: &str = "laravel/laravel";

/// Commands starting with one of these prefixes never receive the `--no-ansi` or `--quiet` flags.
pub const FLAG_EXEMPT_PREFIXES: &[&str] = &["chmod", "git"];

/// Prefix written in front of every line forwarded from a child process.
pub const OUTPUT_INDENT: &str = "    ";
