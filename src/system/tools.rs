// src/system/tools.rs

//! Detection of the external developer tools the wizard can hand off to.

use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::models::DevEnvironment;

/// Whether `executable` can be found in one of the `PATH` directories.
pub fn is_executable_in_path(executable: &str) -> bool {
    match env::var_os("PATH") {
        Some(path_var) => is_executable_in(executable, env::split_paths(&path_var)),
        None => false,
    }
}

fn is_executable_in<I, P>(executable: &str, dirs: I) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let candidates: Vec<String> = if cfg!(target_os = "windows") {
        vec![
            executable.to_string(),
            format!("{}.exe", executable),
            format!("{}.bat", executable),
            format!("{}.cmd", executable),
        ]
    } else {
        vec![executable.to_string()]
    };

    dirs.into_iter().any(|dir| {
        candidates
            .iter()
            .any(|name| dir.as_ref().join(name).is_file())
    })
}

/// Whether the tooling behind a development environment is installed.
pub fn is_dev_environment_available(environment: DevEnvironment) -> bool {
    environment
        .required_executable()
        .is_none_or(is_executable_in_path)
}

/// The extensions loaded by the `php` executable, as listed by `php -m`.
///
/// `php` may carry arguments (`php8.3 -d memory_limit=-1`). Returns `None`
/// when PHP cannot be run, so callers can treat every extension as unknown.
pub fn php_extensions(php: &str) -> Option<HashSet<String>> {
    let mut parts = shlex::split(php)?.into_iter();
    let program = parts.next()?;

    let output = Command::new(program)
        .args(parts)
        .arg("-m")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            Some(parse_php_modules(&String::from_utf8_lossy(&output.stdout)))
        }
        Ok(output) => {
            log::debug!("'{} -m' exited with {}", php, output.status);
            None
        }
        Err(e) => {
            log::debug!("Could not run '{} -m': {}", php, e);
            None
        }
    }
}

/// Extracts lowercase module names from `php -m` output, skipping section headers.
fn parse_php_modules(output: &str) -> HashSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('['))
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_executable_lookup_in_given_dirs() {
        let empty = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let name = if cfg!(target_os = "windows") {
            "herd.exe"
        } else {
            "herd"
        };
        fs::write(bin.path().join(name), "").unwrap();

        assert!(is_executable_in("herd", [empty.path(), bin.path()]));
        assert!(!is_executable_in("valet", [empty.path(), bin.path()]));
    }

    #[test]
    fn test_parse_php_modules_skips_headers() {
        let output = "[PHP Modules]\nCore\nPDO\npdo_mysql\npdo_sqlite\n\n[Zend Modules]\nZend OPcache\n";
        let modules = parse_php_modules(output);
        assert!(modules.contains("pdo_mysql"));
        assert!(modules.contains("pdo_sqlite"));
        assert!(modules.contains("zend opcache"));
        assert!(!modules.iter().any(|module| module.starts_with('[')));
        assert_eq!(modules.len(), 5);
    }

    #[test]
    fn test_php_extensions_is_none_when_php_cannot_run() {
        assert!(php_extensions("architect-no-such-php-binary").is_none());
        assert!(php_extensions("").is_none());
    }

    #[test]
    fn test_built_in_server_needs_no_tool() {
        assert!(is_dev_environment_available(DevEnvironment::BuiltIn));
    }
}
