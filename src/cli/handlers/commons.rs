// src/cli/handlers/commons.rs

//! Shared checks used by the wizard steps.

use colored::Colorize;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while asking the wizard's questions.
#[derive(Error, Debug)]
pub enum WizardError {
    /// The terminal prompt failed.
    #[error("Prompt failed: {0}")]
    Dialoguer(#[from] dialoguer::Error),
    /// The target directory is taken.
    #[error("Application already exists at '{0}'. Use --force to install anyway.")]
    ApplicationExists(PathBuf),
    /// The project name has characters outside the allowed set.
    #[error(
        "Invalid project name '{0}'. Use letters, numbers, dashes, underscores and dots only."
    )]
    InvalidProjectName(String),
    /// The user declined to continue.
    #[error("Installation cancelled.")]
    Cancelled,
}

fn project_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\p{L}\p{N}\-_.]+$").unwrap_or_else(|e| unreachable!("static regex is valid: {e}"))
    })
}

/// Checks a project name and returns it trimmed.
pub fn validate_project_name(name: &str) -> Result<String, WizardError> {
    let trimmed = name.trim();
    if trimmed == ".." || !project_name_regex().is_match(trimmed) {
        return Err(WizardError::InvalidProjectName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

/// The directory a project named `name` is installed into.
pub fn installation_directory(parent_dir: &Path, name: &str) -> PathBuf {
    if name == "." {
        parent_dir.to_path_buf()
    } else {
        parent_dir.join(name)
    }
}

/// Whether installing `name` into `parent_dir` would clash with an existing application.
///
/// Installing into the current directory only clashes when it is not empty.
pub fn application_exists(parent_dir: &Path, name: &str) -> bool {
    let directory = installation_directory(parent_dir, name);
    if name == "." {
        return directory
            .read_dir()
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
    }
    directory.exists()
}

/// Prints the wizard's banner.
pub fn print_banner() {
    let banner = r"
     _             _     _ _            _
    / \   _ __ ___| |__ (_) |_ ___  ___| |_
   / _ \ | '__/ __| '_ \| | __/ _ \/ __| __|
  / ___ \| | | (__| | | | | ||  __/ (__| |_
 /_/   \_\_|  \___|_| |_|_|\__\___|\___|\__|
";
    println!("{}", banner.blue().bold());
    println!("  {}\n", t!("banner.subtitle").dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_project_name() {
        assert_eq!(validate_project_name(" shop ").unwrap(), "shop");
        assert!(validate_project_name("my-app_2.0").is_ok());
        assert!(validate_project_name("café").is_ok());
        assert!(validate_project_name(".").is_ok());

        for bad in ["", "my app", "a/b", "..", "x;rm"] {
            assert!(
                matches!(validate_project_name(bad), Err(WizardError::InvalidProjectName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_application_exists() {
        let temp = TempDir::new().unwrap();
        assert!(!application_exists(temp.path(), "shop"));
        assert!(!application_exists(temp.path(), "."));

        fs::create_dir(temp.path().join("shop")).unwrap();
        assert!(application_exists(temp.path(), "shop"));
        assert!(application_exists(temp.path(), "."));
    }
}
